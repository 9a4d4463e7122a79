//! Forecast result structure: a fixed-horizon path with interval bounds.

use crate::core::IsoWeek;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// One horizon week of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub week: IsoWeek,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// How a forecast was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    Sarimax,
    Prophet,
    NaiveFallback,
    /// Composed from other forecasts, not model-fit.
    Derived,
}

/// Axis range for rendering, computed from history and manual forecast only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartScale {
    pub min: f64,
    pub max: f64,
}

/// A cap that clamped at least one forecast point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapApplied {
    pub value: f64,
    pub weeks: usize,
}

/// Promo regressor provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoInfo {
    pub historical_weeks_with_scores: usize,
    pub total_historical_weeks: usize,
    pub future_scores: Vec<(IsoWeek, f64)>,
}

/// Outcome of combining a promo-adjusted and a baseline forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSummary {
    /// Promotional weeks where the baseline lifted the promo forecast.
    pub floored_weeks: usize,
    /// Neutral weeks that took the baseline forecast.
    pub baseline_weeks: usize,
}

/// Model orders and fit diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitInfo {
    pub order: Option<[usize; 3]>,
    pub seasonal_order: Option<[usize; 4]>,
    pub aic: Option<f64>,
    pub iterations: usize,
}

/// Labels of the three forecasts a derived forecast was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedSources {
    pub transits: String,
    pub transit_conversion: String,
    pub units_per_order: String,
}

/// Descriptive data attached to a forecast; never feeds back into its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetadata {
    pub chart_scale: Option<ChartScale>,
    pub caps: Vec<CapApplied>,
    pub promo: Option<PromoInfo>,
    pub floor: Option<FloorSummary>,
    pub fit: Option<FitInfo>,
    pub sources: Option<DerivedSources>,
}

/// A forecast for consecutive weeks after the last observed week.
///
/// Forecasts are values: every adjustment consumes the forecast and returns
/// a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForecastParts", into = "ForecastParts")]
pub struct Forecast {
    points: Vec<ForecastPoint>,
    method: ForecastMethod,
    label: String,
    promo_regressor: bool,
    floored: bool,
    metadata: ForecastMetadata,
}

#[derive(Serialize, Deserialize)]
struct ForecastParts {
    points: Vec<ForecastPoint>,
    method: ForecastMethod,
    label: String,
    promo_regressor: bool,
    floored: bool,
    #[serde(default)]
    metadata: ForecastMetadata,
}

/// Incoming forecasts must look like ones this crate produces: strictly
/// increasing weeks and a finite, non-negative, ordered band.
impl TryFrom<ForecastParts> for Forecast {
    type Error = ForecastError;

    fn try_from(parts: ForecastParts) -> Result<Self> {
        if parts.points.windows(2).any(|w| w[0].week >= w[1].week) {
            return Err(ForecastError::WeekError(
                "forecast weeks must be strictly increasing".into(),
            ));
        }
        for p in &parts.points {
            if !(p.value.is_finite() && p.lower.is_finite() && p.upper.is_finite()) {
                return Err(ForecastError::NonFiniteForecast);
            }
            if !(0.0 <= p.lower && p.lower <= p.value && p.value <= p.upper) {
                return Err(ForecastError::InvalidParameter(format!(
                    "unordered or negative band in {}: {} <= {} <= {}",
                    p.week, p.lower, p.value, p.upper
                )));
            }
        }
        Ok(Self {
            points: parts.points,
            method: parts.method,
            label: parts.label,
            promo_regressor: parts.promo_regressor,
            floored: parts.floored,
            metadata: parts.metadata,
        })
    }
}

impl From<Forecast> for ForecastParts {
    fn from(forecast: Forecast) -> Self {
        ForecastParts {
            points: forecast.points,
            method: forecast.method,
            label: forecast.label,
            promo_regressor: forecast.promo_regressor,
            floored: forecast.floored,
            metadata: forecast.metadata,
        }
    }
}

impl Forecast {
    /// Assemble a forecast from aligned columns.
    pub fn from_columns(
        weeks: &[IsoWeek],
        values: &[f64],
        lower: &[f64],
        upper: &[f64],
        method: ForecastMethod,
        label: impl Into<String>,
    ) -> Result<Self> {
        let n = weeks.len();
        for len in [values.len(), lower.len(), upper.len()] {
            if len != n {
                return Err(ForecastError::DimensionMismatch { expected: n, got: len });
            }
        }

        let points: Vec<ForecastPoint> = (0..n)
            .map(|i| ForecastPoint {
                week: weeks[i],
                value: values[i],
                lower: lower[i],
                upper: upper[i],
            })
            .collect();

        if points
            .iter()
            .any(|p| !(p.value.is_finite() && p.lower.is_finite() && p.upper.is_finite()))
        {
            return Err(ForecastError::NonFiniteForecast);
        }

        Ok(Self {
            points,
            method,
            label: label.into(),
            promo_regressor: false,
            floored: false,
            metadata: ForecastMetadata::default(),
        })
    }

    /// Number of forecast weeks.
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn weeks(&self) -> Vec<IsoWeek> {
        self.points.iter().map(|p| p.week).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }

    /// Point value for a given week, if it is inside the horizon.
    pub fn value_at(&self, week: IsoWeek) -> Option<f64> {
        self.points.iter().find(|p| p.week == week).map(|p| p.value)
    }

    pub fn method(&self) -> ForecastMethod {
        self.method
    }

    /// Human-readable model label, e.g. `SARIMAX +Promo (Floored)`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a promo regressor was used in fitting.
    pub fn uses_promo_regressor(&self) -> bool {
        self.promo_regressor
    }

    /// Whether the promo floor changed at least one point.
    pub fn is_floored(&self) -> bool {
        self.floored
    }

    pub fn is_derived(&self) -> bool {
        self.method == ForecastMethod::Derived
    }

    pub fn metadata(&self) -> &ForecastMetadata {
        &self.metadata
    }

    /// Replace every point through `f`.
    pub fn map_points<F>(mut self, f: F) -> Self
    where
        F: FnMut(ForecastPoint) -> ForecastPoint,
    {
        self.points = self.points.into_iter().map(f).collect();
        self
    }

    /// Mark the forecast as fit with a promo regressor.
    pub fn tagged_promo(mut self) -> Self {
        if !self.promo_regressor {
            self.promo_regressor = true;
            self.label.push_str(" +Promo");
        }
        self
    }

    /// Mark the forecast as altered by the promo floor.
    pub fn tagged_floored(mut self) -> Self {
        if !self.floored {
            self.floored = true;
            self.label.push_str(" (Floored)");
        }
        self
    }

    /// Record a cap and tag the label once.
    pub fn tagged_capped(mut self, cap: CapApplied) -> Self {
        if self.metadata.caps.is_empty() {
            self.label.push_str(" (Capped)");
        }
        self.metadata.caps.push(cap);
        self
    }

    pub fn with_metadata<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ForecastMetadata),
    {
        f(&mut self.metadata);
        self
    }
}
