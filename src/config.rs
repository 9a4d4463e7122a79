//! Request and engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model family requested for independent metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Seasonal ARIMA with an optional promo regressor.
    #[default]
    Sarimax,
    /// Additive trend plus Fourier seasonality.
    Prophet,
}

/// Per-request forecasting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub model: ModelKind,
    /// Include seasonal terms when history allows.
    pub seasonality: bool,
    /// Fit with the promo regressor and apply the promo floor.
    pub include_promo: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Sarimax,
            seasonality: true,
            include_promo: false,
        }
    }
}

impl ForecastConfig {
    pub fn new(model: ModelKind, seasonality: bool, include_promo: bool) -> Self {
        Self {
            model,
            seasonality,
            include_promo,
        }
    }
}

/// Optimizer budget for a single model fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitBudget {
    pub max_iterations: usize,
    pub max_duration: Duration,
}

impl Default for FitBudget {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            max_duration: Duration::from_secs(2),
        }
    }
}

/// Engine-wide settings.
///
/// Product constants are associated constants; only the fit budget is tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub fit_budget: FitBudget,
}

impl EngineSettings {
    /// Weeks forecast ahead.
    pub const HORIZON: usize = 12;
    /// Two-sided interval coverage of every forecast band.
    pub const INTERVAL_LEVEL: f64 = 0.85;
    /// Weeks of history needed before a model fit is attempted.
    pub const MIN_MODEL_HISTORY: usize = 8;
    /// Seasonal period of the SARIMAX seasonal component, in weeks.
    pub const SEASONAL_PERIOD: usize = 4;

    pub fn with_fit_budget(mut self, fit_budget: FitBudget) -> Self {
        self.fit_budget = fit_budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_toggles() {
        let config = ForecastConfig::default();
        assert_eq!(config.model, ModelKind::Sarimax);
        assert!(config.seasonality);
        assert!(!config.include_promo);

        let budget = FitBudget::default();
        assert_eq!(budget.max_iterations, 5000);
        assert_eq!(budget.max_duration, Duration::from_secs(2));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ForecastConfig = serde_json::from_str(r#"{"model":"prophet"}"#).unwrap();
        assert_eq!(config.model, ModelKind::Prophet);
        assert!(config.seasonality);

        let config: ForecastConfig =
            serde_json::from_str(r#"{"include_promo":true,"seasonality":false}"#).unwrap();
        assert_eq!(config.model, ModelKind::Sarimax);
        assert!(config.include_promo);
        assert!(!config.seasonality);

        assert!(serde_json::from_str::<ForecastConfig>(r#"{"model":"lstm"}"#).is_err());
    }
}
