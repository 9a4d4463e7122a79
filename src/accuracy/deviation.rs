//! Week-by-week deviation history and the latest-week overview.

use super::DeviationColour;
use crate::core::{Forecast, IsoWeek, Market, Metric, WeeklySeries};
use crate::utils::{deviation_pct, mean};
use serde::{Deserialize, Serialize};

/// One actual week compared with the manual and model forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationRecord {
    pub week: IsoWeek,
    pub actual: f64,
    pub manual_forecast: Option<f64>,
    /// `manual - actual`.
    pub manual_dev: Option<f64>,
    pub manual_dev_pct: Option<f64>,
    pub model_forecast: Option<f64>,
    pub model_dev: Option<f64>,
    pub model_dev_pct: Option<f64>,
}

/// Aggregates over a deviation history. Averages are `None` without data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationSummary {
    pub total_weeks: usize,
    pub manual_forecast_weeks: usize,
    pub manual_avg_dev: Option<f64>,
    pub manual_avg_abs_dev: Option<f64>,
    pub model_forecast_weeks: usize,
    pub model_avg_dev: Option<f64>,
    pub model_avg_abs_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricDeviations {
    pub records: Vec<DeviationRecord>,
    pub summary: DeviationSummary,
}

fn compare(actual: f64, forecast: Option<f64>) -> (Option<f64>, Option<f64>) {
    match forecast {
        Some(f) => (Some(f - actual), deviation_pct(actual, f)),
        None => (None, None),
    }
}

/// Signed and absolute mean of the available deviation percentages.
fn averages(devs: &[f64]) -> (Option<f64>, Option<f64>) {
    let abs: Vec<f64> = devs.iter().map(|d| d.abs()).collect();
    (mean(devs), mean(&abs))
}

/// Compare every actual week with the manual forecast and, where it covers
/// the week, the model forecast.
pub fn historic_deviations(
    actuals: &WeeklySeries,
    manual: Option<&WeeklySeries>,
    model: Option<&Forecast>,
) -> HistoricDeviations {
    let records: Vec<DeviationRecord> = actuals
        .iter()
        .map(|(week, actual)| {
            let manual_forecast = manual.and_then(|m| m.value_at(week));
            let model_forecast = model.and_then(|f| f.value_at(week));
            let (manual_dev, manual_dev_pct) = compare(actual, manual_forecast);
            let (model_dev, model_dev_pct) = compare(actual, model_forecast);
            DeviationRecord {
                week,
                actual,
                manual_forecast,
                manual_dev,
                manual_dev_pct,
                model_forecast,
                model_dev,
                model_dev_pct,
            }
        })
        .collect();

    let manual_devs: Vec<f64> = records.iter().filter_map(|r| r.manual_dev_pct).collect();
    let model_devs: Vec<f64> = records.iter().filter_map(|r| r.model_dev_pct).collect();
    let (manual_avg_dev, manual_avg_abs_dev) = averages(&manual_devs);
    let (model_avg_dev, model_avg_abs_dev) = averages(&model_devs);

    let summary = DeviationSummary {
        total_weeks: records.len(),
        manual_forecast_weeks: manual_devs.len(),
        manual_avg_dev,
        manual_avg_abs_dev,
        model_forecast_weeks: model_devs.len(),
        model_avg_dev,
        model_avg_abs_dev,
    };

    HistoricDeviations { records, summary }
}

/// Most recent week present in any of `series`.
pub fn latest_week<'a, I>(series: I) -> Option<IsoWeek>
where
    I: IntoIterator<Item = &'a WeeklySeries>,
{
    series.into_iter().filter_map(WeeklySeries::last_week).max()
}

/// Actual against manual forecast for one metric and market in one week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverviewEntry {
    pub metric: Metric,
    pub market: Market,
    pub actual: Option<f64>,
    pub manual_forecast: Option<f64>,
    pub deviation_pct: Option<f64>,
    pub colour: Option<DeviationColour>,
}

impl OverviewEntry {
    pub fn new(metric: Metric, market: Market, actual: Option<f64>, manual_forecast: Option<f64>) -> Self {
        let deviation_pct = match (actual, manual_forecast) {
            (Some(a), Some(f)) => deviation_pct(a, f),
            _ => None,
        };
        Self {
            metric,
            market,
            actual,
            manual_forecast,
            deviation_pct,
            colour: deviation_pct.map(DeviationColour::from_deviation),
        }
    }
}
