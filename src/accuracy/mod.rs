//! Manual forecast accuracy against realized actuals.
//!
//! Only the manual forecast is ever scored; model forecasts cover future
//! weeks and are never backtested.

mod deviation;

pub use deviation::{
    historic_deviations, latest_week, DeviationRecord, DeviationSummary, HistoricDeviations,
    OverviewEntry,
};

use crate::core::{IsoWeek, WeeklySeries};
use crate::error::ForecastError;
use crate::utils::calculate_metrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Accuracy score at or above which a forecast grades as good.
pub const GOOD_THRESHOLD: f64 = 80.0;
/// Accuracy score at or above which a forecast grades as medium.
pub const MEDIUM_THRESHOLD: f64 = 60.0;
/// Deviation magnitude below which a week is green.
pub const GREEN_LIMIT: f64 = 20.0;
/// Deviation magnitude up to which a week is yellow.
pub const YELLOW_LIMIT: f64 = 30.0;

/// Window of actual weeks an accuracy record covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Every actual week.
    #[serde(alias = "all")]
    Total,
    /// The four most recent actual weeks.
    T4w,
    /// The most recent actual week.
    Cw,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Total, Timeframe::T4w, Timeframe::Cw];

    /// Number of trailing actual weeks, `None` for the full history.
    pub fn weeks(&self) -> Option<usize> {
        match self {
            Timeframe::Total => None,
            Timeframe::T4w => Some(4),
            Timeframe::Cw => Some(1),
        }
    }

    /// The actual weeks this timeframe selects, anchored on the latest week.
    pub fn window(&self, actuals: &WeeklySeries) -> WeeklySeries {
        match self.weeks() {
            Some(n) => actuals.tail(n),
            None => actuals.clone(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Total => "total",
            Timeframe::T4w => "t4w",
            Timeframe::Cw => "cw",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" | "all" => Ok(Timeframe::Total),
            "t4w" => Ok(Timeframe::T4w),
            "cw" => Ok(Timeframe::Cw),
            _ => Err(ForecastError::InvalidTimeframe(s.to_string())),
        }
    }
}

/// Headline accuracy grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Good,
    Medium,
    Poor,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= GOOD_THRESHOLD {
            Grade::Good
        } else if score >= MEDIUM_THRESHOLD {
            Grade::Medium
        } else {
            Grade::Poor
        }
    }
}

/// Colour of a single week's deviation magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviationColour {
    Green,
    Yellow,
    Red,
}

impl DeviationColour {
    /// Classify by magnitude; the sign of the deviation is ignored.
    pub fn from_deviation(deviation_pct: f64) -> Self {
        let magnitude = deviation_pct.abs();
        if magnitude < GREEN_LIMIT {
            DeviationColour::Green
        } else if magnitude <= YELLOW_LIMIT {
            DeviationColour::Yellow
        } else {
            DeviationColour::Red
        }
    }
}

/// Accuracy of the manual forecast over one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub timeframe: Timeframe,
    pub wmape: f64,
    pub mape: f64,
    pub bias: f64,
    pub overlap_weeks: usize,
    /// `100 - WMAPE`, floored at 0.
    pub accuracy: f64,
    pub grade: Grade,
}

/// Score `manual` against `actuals` over `timeframe`.
///
/// `None` when the window shares no week with the manual forecast, or when
/// every overlapping actual is zero.
pub fn accuracy(
    actuals: &WeeklySeries,
    manual: &WeeklySeries,
    timeframe: Timeframe,
) -> Option<AccuracyRecord> {
    let overlap = timeframe.window(actuals).overlap(manual);
    if overlap.is_empty() {
        return None;
    }

    let (actual, forecast): (Vec<f64>, Vec<f64>) = overlap.iter().map(|(_, a, f)| (*a, *f)).unzip();
    let metrics = match calculate_metrics(&actual, &forecast) {
        Ok(metrics) => metrics,
        Err(err) => {
            debug!(error = %err, %timeframe, "accuracy skipped");
            return None;
        }
    };

    let score = (100.0 - metrics.wmape).max(0.0);
    Some(AccuracyRecord {
        timeframe,
        wmape: metrics.wmape,
        mape: metrics.mape,
        bias: metrics.bias,
        overlap_weeks: metrics.weeks,
        accuracy: score,
        grade: Grade::from_score(score),
    })
}

/// Weeks in the timeframe window that also carry a manual forecast.
pub fn overlap_weeks(actuals: &WeeklySeries, manual: &WeeklySeries, timeframe: Timeframe) -> Vec<IsoWeek> {
    timeframe
        .window(actuals)
        .overlap(manual)
        .into_iter()
        .map(|(week, _, _)| week)
        .collect()
}
