//! Promo intensity bands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal promo intensity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PromoBand {
    /// Score ≤ 1.
    #[serde(rename = "No/Low")]
    NoLow,
    /// 1 < score ≤ 2.
    #[serde(rename = "Light")]
    Light,
    /// 2 < score ≤ 3.
    #[serde(rename = "Medium")]
    Medium,
    /// Score > 3.
    #[serde(rename = "Strong")]
    Strong,
}

impl PromoBand {
    /// All bands, weakest first.
    pub const ALL: [PromoBand; 4] = [
        PromoBand::NoLow,
        PromoBand::Light,
        PromoBand::Medium,
        PromoBand::Strong,
    ];

    /// Classify a score. NaN scores have no band.
    pub fn classify(score: f64) -> Option<Self> {
        if score.is_nan() {
            None
        } else if score <= 1.0 {
            Some(PromoBand::NoLow)
        } else if score <= 2.0 {
            Some(PromoBand::Light)
        } else if score <= 3.0 {
            Some(PromoBand::Medium)
        } else {
            Some(PromoBand::Strong)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromoBand::NoLow => "No/Low",
            PromoBand::Light => "Light",
            PromoBand::Medium => "Medium",
            PromoBand::Strong => "Strong",
        }
    }
}

impl fmt::Display for PromoBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an optional score; missing scores have no band.
pub fn classify(score: Option<f64>) -> Option<PromoBand> {
    score.and_then(PromoBand::classify)
}
