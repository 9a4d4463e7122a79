//! Model fitter: turns a weekly history into a 12-week forecast.
//!
//! The fitter dispatches on [`ModelKind`], bounds every optimization by the
//! [`FitBudget`], and never fails for a non-empty history: short histories
//! and failed fits degrade to [`MovingAverageFallback`].

use crate::config::{EngineSettings, FitBudget, ForecastConfig, ModelKind};
use crate::core::{Forecast, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{ARIMASpec, SeasonalSpec, SARIMAX};
use crate::models::baseline::MovingAverageFallback;
use crate::models::{Forecaster, ProphetLike};
use crate::promo::{apply_floor, PromoRegressor};
use crate::sanitize::clamp_non_negative;
use tracing::{debug, warn};

/// Fits the configured model family and recovers from failures locally.
#[derive(Debug, Clone)]
pub struct ModelFitter {
    config: ForecastConfig,
    budget: FitBudget,
}

impl ModelFitter {
    pub fn new(config: ForecastConfig, settings: &EngineSettings) -> Self {
        Self {
            config,
            budget: settings.fit_budget,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast the weeks after `history`.
    ///
    /// `promo` is only consulted for SARIMAX with `include_promo` set. The
    /// sole error is an empty history; every fit failure falls back.
    pub fn forecast(
        &self,
        history: &WeeklySeries,
        promo: Option<&PromoRegressor>,
    ) -> Result<Forecast> {
        if history.is_empty() {
            return Err(ForecastError::InsufficientHistory { needed: 1, got: 0 });
        }

        let promo = promo
            .filter(|_| self.config.include_promo && self.config.model == ModelKind::Sarimax);

        let n = history.len();
        let forecast = if n < EngineSettings::MIN_MODEL_HISTORY {
            warn!(
                n,
                needed = EngineSettings::MIN_MODEL_HISTORY,
                "history too short for a model fit, using fallback"
            );
            self.fallback(history)?
        } else {
            let fitted = match self.config.model {
                ModelKind::Prophet => self.fit_prophet(history),
                ModelKind::Sarimax => self.fit_sarimax(history, promo),
            };
            match fitted {
                Ok(forecast) => clamp_non_negative(forecast),
                Err(err) => {
                    warn!(error = %err, model = ?self.config.model, "model fit failed, using fallback");
                    self.fallback(history)?
                }
            }
        };

        Ok(match promo {
            Some(regressor) => {
                let info = regressor.info.clone();
                forecast.with_metadata(|meta| meta.promo = Some(info))
            }
            None => forecast,
        })
    }

    fn fallback(&self, history: &WeeklySeries) -> Result<Forecast> {
        let mut model = MovingAverageFallback::new();
        model.fit(history)?;
        let forecast =
            model.predict_with_intervals(EngineSettings::HORIZON, EngineSettings::INTERVAL_LEVEL)?;
        Ok(clamp_non_negative(forecast))
    }

    fn fit_prophet(&self, history: &WeeklySeries) -> Result<Forecast> {
        let mut model = ProphetLike::new(self.config.seasonality);
        model.fit(history)?;
        model.predict_with_intervals(EngineSettings::HORIZON, EngineSettings::INTERVAL_LEVEL)
    }

    fn sarimax(&self, n: usize) -> SARIMAX {
        let seasonal = if self.config.seasonality && n >= EngineSettings::MIN_MODEL_HISTORY {
            SeasonalSpec::new(1, 0, 1, EngineSettings::SEASONAL_PERIOD)
        } else {
            SeasonalSpec::none()
        };
        SARIMAX::new(ARIMASpec::new(1, 1, 1), seasonal)
            .with_budget(self.budget.max_iterations, Some(self.budget.max_duration))
    }

    fn fit_sarimax(
        &self,
        history: &WeeklySeries,
        promo: Option<&PromoRegressor>,
    ) -> Result<Forecast> {
        let mut baseline_model = self.sarimax(history.len());
        baseline_model.fit(history)?;
        let baseline = baseline_model
            .predict_with_intervals(EngineSettings::HORIZON, EngineSettings::INTERVAL_LEVEL)?;

        let Some(regressor) = promo else {
            return Ok(baseline);
        };

        if !regressor.is_informative() {
            debug!(
                scored = regressor.info.historical_weeks_with_scores,
                "promo regressor carries no signal, fitting without it"
            );
            return Ok(baseline);
        }

        let mut promo_model = self.sarimax(history.len());
        let promo_forecast = promo_model
            .fit_with_exog(history, &regressor.history)
            .and_then(|_| {
                promo_model.predict_with_exog_intervals(
                    EngineSettings::HORIZON,
                    EngineSettings::INTERVAL_LEVEL,
                    &regressor.future,
                )
            });

        match promo_forecast {
            Ok(forecast) => {
                debug!(
                    coefficient = ?promo_model.exog_coefficient(),
                    "promo regressor fitted"
                );
                apply_floor(forecast.tagged_promo(), &baseline, &regressor.future)
            }
            Err(err) => {
                warn!(error = %err, "promo fit failed, keeping baseline fit");
                Ok(baseline)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ForecastMethod, IsoWeek, Market};
    use crate::promo::PromoScores;

    fn weekly(values: &[f64]) -> WeeklySeries {
        let start = IsoWeek::new(2024, 1).unwrap();
        WeeklySeries::from_pairs(values.iter().enumerate().map(|(i, v)| (start.plus(i as u32), *v)))
            .unwrap()
    }

    fn seasonal_history(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1000.0 + 4.0 * i as f64 + [30.0, -10.0, 25.0, -45.0][i % 4] + (i as f64 * 1.7).sin() * 8.0)
            .collect()
    }

    fn fitter(model: ModelKind, seasonality: bool, include_promo: bool) -> ModelFitter {
        ModelFitter::new(
            ForecastConfig::new(model, seasonality, include_promo),
            &EngineSettings::default(),
        )
    }

    fn assert_well_formed(forecast: &Forecast) {
        assert_eq!(forecast.horizon(), EngineSettings::HORIZON);
        for p in forecast.points() {
            assert!(p.lower <= p.value && p.value <= p.upper, "{:?}", p);
            assert!(p.lower >= 0.0);
        }
    }

    #[test]
    fn short_history_uses_fallback() {
        let forecast = fitter(ModelKind::Sarimax, true, false)
            .forecast(&weekly(&[10.0, 12.0, 11.0]), None)
            .unwrap();
        assert_eq!(forecast.method(), ForecastMethod::NaiveFallback);
        assert_eq!(forecast.label(), "Moving Average (Fallback)");
        assert_well_formed(&forecast);
    }

    #[test]
    fn single_point_still_forecasts() {
        let forecast = fitter(ModelKind::Prophet, false, false)
            .forecast(&weekly(&[42.0]), None)
            .unwrap();
        assert_eq!(forecast.values(), vec![42.0; EngineSettings::HORIZON]);
    }

    #[test]
    fn empty_history_is_an_error() {
        let result = fitter(ModelKind::Sarimax, true, false).forecast(&WeeklySeries::empty(), None);
        assert!(result.is_err());
    }

    #[test]
    fn sarimax_labels_follow_seasonality() {
        let history = weekly(&seasonal_history(40));

        let seasonal = fitter(ModelKind::Sarimax, true, false)
            .forecast(&history, None)
            .unwrap();
        assert_eq!(seasonal.label(), "SARIMAX");
        assert_eq!(
            seasonal.metadata().fit.as_ref().unwrap().seasonal_order,
            Some([1, 0, 1, 4])
        );
        assert_well_formed(&seasonal);

        let plain = fitter(ModelKind::Sarimax, false, false)
            .forecast(&history, None)
            .unwrap();
        assert_eq!(plain.label(), "ARIMAX");
        assert_well_formed(&plain);
    }

    #[test]
    fn prophet_ignores_promo() {
        let history = weekly(&seasonal_history(30));
        let scores: PromoScores = history
            .weeks()
            .iter()
            .step_by(3)
            .map(|w| (Market::Uk, *w, 4.0))
            .collect();
        let regressor = PromoRegressor::prepare(&scores, Market::Uk, &history, EngineSettings::HORIZON);

        let forecast = fitter(ModelKind::Prophet, true, true)
            .forecast(&history, Some(&regressor))
            .unwrap();
        assert_eq!(forecast.label(), "Prophet");
        assert!(!forecast.uses_promo_regressor());
        assert!(forecast.metadata().promo.is_none());
        assert_well_formed(&forecast);
    }

    #[test]
    fn promo_regressor_is_used_and_floored() {
        let mut values = seasonal_history(40);
        let mut scores = PromoScores::new();
        let history_weeks = weekly(&values).weeks().to_vec();
        for i in (2..40).step_by(5) {
            values[i] += 300.0;
            scores.insert(Market::De, history_weeks[i], 4.0);
        }
        let history = weekly(&values);
        let last = history.last_week().unwrap();
        scores.insert(Market::De, last.plus(2), 4.0);
        scores.insert(Market::De, last.plus(5), 0.5);

        let regressor = PromoRegressor::prepare(&scores, Market::De, &history, EngineSettings::HORIZON);
        assert!(regressor.is_informative());

        let fitter = fitter(ModelKind::Sarimax, true, true);
        let forecast = fitter.forecast(&history, Some(&regressor)).unwrap();
        let baseline = fitter.forecast(&history, None).unwrap();

        assert!(forecast.uses_promo_regressor());
        assert!(forecast.label().starts_with("SARIMAX +Promo"));
        assert_eq!(forecast.metadata().promo.as_ref(), Some(&regressor.info));

        // promotional horizon week never drops below baseline; neutral weeks match it
        assert!(forecast.values()[1] >= baseline.values()[1]);
        assert_eq!(forecast.values()[0], baseline.values()[0]);
        assert_well_formed(&forecast);
    }

    #[test]
    fn uninformative_promo_is_recorded_but_unused() {
        let history = weekly(&seasonal_history(20));
        let regressor =
            PromoRegressor::prepare(&PromoScores::new(), Market::Fr, &history, EngineSettings::HORIZON);

        let forecast = fitter(ModelKind::Sarimax, true, true)
            .forecast(&history, Some(&regressor))
            .unwrap();
        assert!(!forecast.uses_promo_regressor());
        assert_eq!(forecast.label(), "SARIMAX");
        assert_eq!(
            forecast.metadata().promo.as_ref().unwrap().historical_weeks_with_scores,
            0
        );
    }

    #[test]
    fn exhausted_budget_falls_back() {
        let settings = EngineSettings::default().with_fit_budget(FitBudget {
            max_iterations: 1,
            max_duration: std::time::Duration::from_secs(2),
        });
        let fitter = ModelFitter::new(ForecastConfig::default(), &settings);
        let forecast = fitter.forecast(&weekly(&seasonal_history(30)), None).unwrap();
        assert_eq!(forecast.method(), ForecastMethod::NaiveFallback);
        assert_well_formed(&forecast);
    }

    #[test]
    fn forecasts_are_non_negative() {
        let values: Vec<f64> = (0..30).map(|i| (300.0 - 10.0 * i as f64).max(1.0)).collect();
        for model in [ModelKind::Sarimax, ModelKind::Prophet] {
            let forecast = fitter(model, false, false).forecast(&weekly(&values), None).unwrap();
            assert!(forecast.values().iter().all(|v| *v >= 0.0));
            assert_well_formed(&forecast);
        }
    }
}
