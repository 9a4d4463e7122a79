//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, ForecastMethod, WeeklySeries};
use crate::error::{ForecastError, Result};

/// Common interface for weekly forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to a weekly history.
    fn fit(&mut self, series: &WeeklySeries) -> Result<()>;

    /// Fit the model with one exogenous regressor aligned week-for-week
    /// with `series`.
    fn fit_with_exog(&mut self, series: &WeeklySeries, exog: &[f64]) -> Result<()> {
        let _ = (series, exog);
        Err(ForecastError::InvalidParameter(format!(
            "{} does not support exogenous regressors",
            self.name()
        )))
    }

    /// Forecast the `horizon` weeks after the last observed week, with a
    /// symmetric interval at `level`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast>;

    /// Forecast with future regressor values, one per horizon week.
    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        level: f64,
        future_exog: &[f64],
    ) -> Result<Forecast> {
        let _ = future_exog;
        self.predict_with_intervals(horizon, level)
    }

    /// Whether [`Forecaster::fit_with_exog`] is supported.
    fn supports_exog(&self) -> bool {
        false
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name, used as the base of the forecast label.
    fn name(&self) -> &str;

    /// How forecasts from this model are tagged.
    fn method(&self) -> ForecastMethod;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use marketplace_forecast::models::{BoxedForecaster, Forecaster};
/// use marketplace_forecast::models::baseline::MovingAverageFallback;
///
/// let model: BoxedForecaster = Box::new(MovingAverageFallback::new());
/// assert_eq!(model.name(), "Moving Average (Fallback)");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IsoWeek;
    use crate::models::baseline::MovingAverageFallback;
    use crate::models::ProphetLike;

    fn make_series(n: usize) -> WeeklySeries {
        let start = IsoWeek::new(2024, 1).unwrap();
        let weeks: Vec<IsoWeek> = std::iter::once(start).chain(start.following(n - 1)).collect();
        let values: Vec<f64> = (1..=n).map(|i| 100.0 + i as f64).collect();
        WeeklySeries::new(weeks, values).unwrap()
    }

    #[test]
    fn boxed_forecaster_fit_predict() {
        let mut model: BoxedForecaster = Box::new(MovingAverageFallback::new());
        assert!(!model.is_fitted());

        model.fit(&make_series(10)).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict_with_intervals(5, 0.85).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert_eq!(forecast.method(), ForecastMethod::NaiveFallback);
    }

    #[test]
    fn exog_is_rejected_when_unsupported() {
        let mut model: BoxedForecaster = Box::new(ProphetLike::new(true));
        assert!(!model.supports_exog());
        let series = make_series(10);
        let result = model.fit_with_exog(&series, &[1.0; 10]);
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = MovingAverageFallback::new();
        assert_eq!(
            model.predict_with_intervals(3, 0.85),
            Err(ForecastError::FitRequired)
        );
    }
}
