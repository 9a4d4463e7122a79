//! Forecasting and analytics operations over a dataset snapshot.
//!
//! Every operation is a pure function of the [`Dataset`] it is given: callers
//! take a snapshot from a [`crate::dataset::DatasetStore`] and pass it in.

use crate::accuracy::{
    accuracy, historic_deviations, latest_week, AccuracyRecord, HistoricDeviations, OverviewEntry,
    Timeframe,
};
use crate::config::{EngineSettings, ForecastConfig, ModelKind};
use crate::core::{Forecast, ForecastMethod, IsoWeek, Market, Metric};
use crate::dataset::Dataset;
use crate::derived::compose_net_ordered_units;
use crate::error::{ForecastError, Result};
use crate::models::ModelFitter;
use crate::promo::{analyze, PromoAnalysis, PromoRegressor};
use crate::sanitize::{sanitize, CapContext};
use crate::statistics::{summary_statistics, SummaryStatistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Values keyed by metric, then market.
pub type MetricTable<T> = BTreeMap<Metric, BTreeMap<Market, T>>;

/// Forecasts of one generate-all run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub config: ForecastConfig,
    pub forecasts: MetricTable<Forecast>,
    /// First absent driver for each market whose Net Ordered Units could
    /// not be composed.
    #[serde(default)]
    pub missing_drivers: BTreeMap<Market, Metric>,
}

impl ForecastSet {
    /// Forecast of a pair, or [`ForecastError::MissingSeries`] when the pair
    /// had no history. For Net Ordered Units the error names the missing
    /// driver.
    pub fn get(&self, metric: Metric, market: Market) -> Result<&Forecast> {
        self.forecasts
            .get(&metric)
            .and_then(|markets| markets.get(&market))
            .ok_or_else(|| {
                let metric = match metric {
                    Metric::NetOrderedUnits => self
                        .missing_drivers
                        .get(&market)
                        .copied()
                        .unwrap_or(metric),
                    _ => metric,
                };
                ForecastError::MissingSeries { metric, market }
            })
    }

    /// Number of forecasts in the set.
    pub fn len(&self) -> usize {
        self.forecasts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The most recent actual week across all series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestWeekOverview {
    pub week: IsoWeek,
    pub entries: Vec<OverviewEntry>,
}

/// Entry point for forecasts and analytics.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    settings: EngineSettings,
}

impl ForecastEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Forecast every driver metric for every market with history, then
    /// compose Net Ordered Units where all three drivers are present.
    pub fn generate_all_forecasts(&self, dataset: &Dataset, config: ForecastConfig) -> ForecastSet {
        let fitter = ModelFitter::new(config, &self.settings);
        let mut forecasts: MetricTable<Forecast> = BTreeMap::new();

        for metric in Metric::DRIVERS {
            for market in Market::ALL {
                match self.forecast_driver(dataset, &fitter, metric, market) {
                    Ok(forecast) => {
                        forecasts.entry(metric).or_default().insert(market, forecast);
                    }
                    Err(err) => debug!(%metric, %market, error = %err, "no forecast"),
                }
            }
        }

        let mut missing_drivers = BTreeMap::new();
        for market in Market::ALL {
            match self.derive_net_ordered_units(dataset, &forecasts, market) {
                Ok(forecast) => {
                    forecasts
                        .entry(Metric::NetOrderedUnits)
                        .or_default()
                        .insert(market, forecast);
                }
                Err(err) => {
                    debug!(%market, error = %err, "net ordered units not derived");
                    if let ForecastError::MissingSeries { metric, .. } = err {
                        missing_drivers.insert(market, metric);
                    }
                }
            }
        }

        let set = ForecastSet {
            config,
            forecasts,
            missing_drivers,
        };
        let fallbacks = set
            .forecasts
            .values()
            .flat_map(BTreeMap::values)
            .filter(|f| f.method() == ForecastMethod::NaiveFallback)
            .count();
        let with_promo = set
            .forecasts
            .values()
            .flat_map(BTreeMap::values)
            .filter(|f| f.uses_promo_regressor())
            .count();
        info!(
            model = ?config.model,
            forecasts = set.len(),
            fallbacks,
            with_promo,
            "forecasts generated"
        );
        set
    }

    /// Forecast one driver metric for one market.
    pub fn forecast_driver(
        &self,
        dataset: &Dataset,
        fitter: &ModelFitter,
        metric: Metric,
        market: Market,
    ) -> Result<Forecast> {
        if metric.is_derived() {
            return Err(ForecastError::InvalidParameter(format!(
                "{} is derived, not fitted",
                metric
            )));
        }
        let history = dataset.require_actuals(metric, market)?;
        let config = fitter.config();

        let regressor = (config.include_promo
            && config.model == ModelKind::Sarimax
            && dataset.has_promo_scores())
        .then(|| {
            PromoRegressor::prepare(
                dataset.promo_scores(),
                market,
                history,
                EngineSettings::HORIZON,
            )
        });

        let forecast = fitter.forecast(history, regressor.as_ref())?;
        let context = CapContext {
            market_max: history.max_value(),
            eu5_transits_max: dataset
                .actuals(Metric::Transits, Market::Eu5)
                .and_then(|s| s.max_value()),
        };
        Ok(sanitize(
            forecast,
            metric,
            context,
            history,
            dataset.manual_forecast(metric, market),
        ))
    }

    fn derive_net_ordered_units(
        &self,
        dataset: &Dataset,
        forecasts: &MetricTable<Forecast>,
        market: Market,
    ) -> Result<Forecast> {
        let driver = |metric: Metric| {
            forecasts
                .get(&metric)
                .and_then(|m| m.get(&market))
                .ok_or(ForecastError::MissingSeries { metric, market })
        };
        let nou = compose_net_ordered_units(
            driver(Metric::Transits)?,
            driver(Metric::TransitConversion)?,
            driver(Metric::UnitsPerOrder)?,
        )?;

        let metric = Metric::NetOrderedUnits;
        let history = dataset.actuals(metric, market).cloned().unwrap_or_default();
        Ok(sanitize(
            nou,
            metric,
            CapContext::default(),
            &history,
            dataset.manual_forecast(metric, market),
        ))
    }

    /// Summary statistics of a pair over a timeframe.
    pub fn statistics(
        &self,
        dataset: &Dataset,
        metric: Metric,
        market: Market,
        timeframe: Timeframe,
    ) -> Result<SummaryStatistics> {
        let series = dataset.require_actuals(metric, market)?;
        summary_statistics(series, timeframe).ok_or(ForecastError::MissingSeries { metric, market })
    }

    /// Manual forecast accuracy for every pair with overlapping weeks.
    pub fn accuracy(&self, dataset: &Dataset, timeframe: Timeframe) -> MetricTable<AccuracyRecord> {
        let mut table: MetricTable<AccuracyRecord> = BTreeMap::new();
        for (metric, market, actuals) in dataset.actual_series() {
            let Some(manual) = dataset.manual_forecast(metric, market) else {
                continue;
            };
            if let Some(record) = accuracy(actuals, manual, timeframe) {
                table.entry(metric).or_default().insert(market, record);
            }
        }
        table
    }

    /// Banded promo uplift for every pair whose market has scores.
    pub fn promo_analysis(&self, dataset: &Dataset) -> MetricTable<PromoAnalysis> {
        let mut table: MetricTable<PromoAnalysis> = BTreeMap::new();
        for (metric, market, actuals) in dataset.actual_series() {
            let Some(scores) = dataset.promo_scores().market(market) else {
                continue;
            };
            if let Some(analysis) = analyze(actuals, scores) {
                table.entry(metric).or_default().insert(market, analysis);
            }
        }
        table
    }

    /// Week-by-week deviations of the manual forecast, and of `model` where
    /// it covers actual weeks.
    pub fn historic_deviations(
        &self,
        dataset: &Dataset,
        metric: Metric,
        market: Market,
        model: Option<&Forecast>,
    ) -> Result<HistoricDeviations> {
        let actuals = dataset.require_actuals(metric, market)?;
        Ok(historic_deviations(
            actuals,
            dataset.manual_forecast(metric, market),
            model,
        ))
    }

    /// Actual against manual forecast for every pair in the latest week.
    pub fn latest_week_overview(&self, dataset: &Dataset) -> Option<LatestWeekOverview> {
        let week = latest_week(dataset.actual_series().map(|(_, _, series)| series))?;

        let entries = Metric::ALL
            .into_iter()
            .flat_map(|metric| Market::ALL.into_iter().map(move |market| (metric, market)))
            .map(|(metric, market)| {
                let actual = dataset.actuals(metric, market).and_then(|s| s.value_at(week));
                let manual = dataset
                    .manual_forecast(metric, market)
                    .and_then(|s| s.value_at(week));
                OverviewEntry::new(metric, market, actual, manual)
            })
            .collect();

        Some(LatestWeekOverview { week, entries })
    }
}
