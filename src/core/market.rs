//! Metric and market enumerations.

use crate::error::ForecastError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A weekly marketplace performance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Derived: Transits × Transit Conversion × UPO.
    #[serde(rename = "Net Ordered Units")]
    NetOrderedUnits,
    #[serde(rename = "Transits")]
    Transits,
    /// Ratio metric in [0, 1].
    #[serde(rename = "Transit Conversion")]
    TransitConversion,
    #[serde(rename = "UPO")]
    UnitsPerOrder,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 4] = [
        Metric::NetOrderedUnits,
        Metric::Transits,
        Metric::TransitConversion,
        Metric::UnitsPerOrder,
    ];

    /// Metrics that are independently model-fit.
    pub const DRIVERS: [Metric; 3] = [
        Metric::Transits,
        Metric::TransitConversion,
        Metric::UnitsPerOrder,
    ];

    /// Human-readable label used by the ingestion and presentation layers.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::NetOrderedUnits => "Net Ordered Units",
            Metric::Transits => "Transits",
            Metric::TransitConversion => "Transit Conversion",
            Metric::UnitsPerOrder => "UPO",
        }
    }

    /// Whether the metric is composed from other metrics rather than fit.
    pub fn is_derived(&self) -> bool {
        matches!(self, Metric::NetOrderedUnits)
    }

    /// Whether the metric is a ratio that rolls up by weighted mean.
    pub fn is_ratio(&self) -> bool {
        matches!(self, Metric::TransitConversion | Metric::UnitsPerOrder)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ForecastError::InvalidParameter(format!("unknown metric '{}'", s)))
    }
}

/// A regional marketplace, or the EU5 consolidation of the five regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "UK")]
    Uk,
    #[serde(rename = "DE")]
    De,
    #[serde(rename = "FR")]
    Fr,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "ES")]
    Es,
    #[serde(rename = "EU5")]
    Eu5,
}

impl Market {
    /// All markets, consolidated total last.
    pub const ALL: [Market; 6] = [
        Market::Uk,
        Market::De,
        Market::Fr,
        Market::It,
        Market::Es,
        Market::Eu5,
    ];

    /// The five markets that roll up into EU5.
    pub const INDIVIDUAL: [Market; 5] = [Market::Uk, Market::De, Market::Fr, Market::It, Market::Es];

    pub fn code(&self) -> &'static str {
        match self {
            Market::Uk => "UK",
            Market::De => "DE",
            Market::Fr => "FR",
            Market::It => "IT",
            Market::Es => "ES",
            Market::Eu5 => "EU5",
        }
    }

    pub fn is_consolidated(&self) -> bool {
        matches!(self, Market::Eu5)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Market {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Market::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ForecastError::InvalidParameter(format!("unknown market '{}'", s)))
    }
}
