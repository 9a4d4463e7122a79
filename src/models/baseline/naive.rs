//! Moving-average fallback forecaster.
//!
//! Used whenever history is too short for a model fit or the fit fails. It
//! forecasts the mean of the last four weeks, nudged by a damped trend taken
//! from the most recent week-over-week change.

use crate::core::{Forecast, ForecastMethod, IsoWeek, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::{interval_z, mean, std_dev};

/// Number of trailing weeks averaged.
const WINDOW: usize = 4;
/// Largest relative step change carried into the trend.
const MAX_TREND: f64 = 0.1;
/// Trend damping applied per horizon step.
const TREND_DAMPING: f64 = 0.5;
/// Spread used when fewer than two weeks are available, as a share of the mean.
const SINGLE_POINT_SPREAD: f64 = 0.1;

/// Moving average of the last four weeks with a damped, bounded trend.
#[derive(Debug, Clone, Default)]
pub struct MovingAverageFallback {
    average: Option<f64>,
    spread: f64,
    trend: f64,
    last_week: Option<IsoWeek>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl MovingAverageFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative step change between the last two weeks, bounded to ±10%.
    pub fn trend(&self) -> f64 {
        self.trend
    }
}

impl Forecaster for MovingAverageFallback {
    fn fit(&mut self, series: &WeeklySeries) -> Result<()> {
        let values = series.values();
        let last_week = series
            .last_week()
            .ok_or(ForecastError::InsufficientHistory { needed: 1, got: 0 })?;

        let recent = &values[values.len().saturating_sub(WINDOW)..];
        let average = mean(recent).unwrap_or(0.0);
        let spread = std_dev(recent).unwrap_or(average * SINGLE_POINT_SPREAD);

        self.trend = match values {
            [.., prev, last] if *prev != 0.0 => ((last - prev) / prev).clamp(-MAX_TREND, MAX_TREND),
            _ => 0.0,
        };

        // In-sample: each week predicted by the mean of up to four prior weeks.
        let fitted: Vec<f64> = (0..values.len())
            .map(|t| {
                let window = &values[t.saturating_sub(WINDOW)..t];
                mean(window).unwrap_or(f64::NAN)
            })
            .collect();
        let residuals = values
            .iter()
            .zip(fitted.iter())
            .map(|(y, f)| y - f)
            .collect();

        self.average = Some(average);
        self.spread = spread;
        self.last_week = Some(last_week);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let average = self.average.ok_or(ForecastError::FitRequired)?;
        let last_week = self.last_week.ok_or(ForecastError::FitRequired)?;

        let z = interval_z(level);
        let weeks = last_week.following(horizon);

        let values: Vec<f64> = (1..=horizon)
            .map(|h| average * (1.0 + self.trend * h as f64 * TREND_DAMPING))
            .collect();
        let lower: Vec<f64> = values.iter().map(|v| v - z * self.spread).collect();
        let upper: Vec<f64> = values.iter().map(|v| v + z * self.spread).collect();

        Forecast::from_columns(
            &weeks,
            &values,
            &lower,
            &upper,
            ForecastMethod::NaiveFallback,
            self.name(),
        )
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "Moving Average (Fallback)"
    }

    fn method(&self) -> ForecastMethod {
        ForecastMethod::NaiveFallback
    }
}
