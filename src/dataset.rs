//! The in-memory dataset and its atomically swapped snapshot.
//!
//! A [`Dataset`] is built in full from a [`DatasetInput`] and then published
//! to a [`DatasetStore`]. Readers hold an `Arc<Dataset>` snapshot; publishing
//! a new dataset never disturbs a snapshot already handed out.
//!
//! Ingestion drops points it cannot place (no usable week, missing or
//! negative value) and recomputes the EU5 roll-up from the five individual
//! markets.

use crate::core::{IsoWeek, Market, Metric, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::promo::PromoScores;
use arc_swap::ArcSwapOption;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One raw series as delivered by the ingestion layer.
///
/// Entries are aligned by index: `weeks[i]`, `dates[i]` and `values[i]`
/// describe the same point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesInput {
    pub weeks: Vec<String>,
    /// ISO dates (`YYYY-MM-DD`); used when a week label does not parse.
    pub dates: Vec<String>,
    pub values: Vec<Option<f64>>,
}

/// Raw series keyed by metric, then market.
pub type MetricInput = BTreeMap<Metric, BTreeMap<Market, SeriesInput>>;

/// Everything the ingestion layer hands over for one upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetInput {
    pub actuals: MetricInput,
    pub manual_forecast: Option<MetricInput>,
    /// Scores keyed by market, then week label.
    pub promo_scores: Option<BTreeMap<Market, BTreeMap<String, Option<f64>>>>,
}

type SeriesMap = BTreeMap<(Metric, Market), WeeklySeries>;

/// Actuals, manual forecasts and promo scores of one loaded upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    actuals: SeriesMap,
    manual: SeriesMap,
    has_manual: bool,
    promo_scores: PromoScores,
}

impl Dataset {
    /// Build a dataset from normalized input.
    pub fn from_input(input: DatasetInput) -> Result<Self> {
        let mut actuals = ingest(&input.actuals)?;
        roll_up_eu5(&mut actuals)?;

        let has_manual = input.manual_forecast.is_some();
        let mut manual = match &input.manual_forecast {
            Some(raw) => ingest(raw)?,
            None => SeriesMap::new(),
        };
        roll_up_eu5(&mut manual)?;

        let promo_scores = input
            .promo_scores
            .as_ref()
            .map(ingest_scores)
            .unwrap_or_default();

        info!(
            actual_series = actuals.len(),
            manual_series = manual.len(),
            promo_weeks = promo_scores.len(),
            "dataset built"
        );

        Ok(Self {
            actuals,
            manual,
            has_manual,
            promo_scores,
        })
    }

    /// Start an empty dataset, to be filled with the `with_*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actuals(mut self, metric: Metric, market: Market, series: WeeklySeries) -> Self {
        self.actuals.insert((metric, market), series);
        self
    }

    pub fn with_manual_forecast(mut self, metric: Metric, market: Market, series: WeeklySeries) -> Self {
        self.manual.insert((metric, market), series);
        self.has_manual = true;
        self
    }

    pub fn with_promo_scores(mut self, scores: PromoScores) -> Self {
        self.promo_scores = scores;
        self
    }

    /// Actual history of a pair, if it has any weeks.
    pub fn actuals(&self, metric: Metric, market: Market) -> Option<&WeeklySeries> {
        self.actuals
            .get(&(metric, market))
            .filter(|series| !series.is_empty())
    }

    /// Actual history of a pair, or [`ForecastError::MissingSeries`].
    pub fn require_actuals(&self, metric: Metric, market: Market) -> Result<&WeeklySeries> {
        self.actuals(metric, market)
            .ok_or(ForecastError::MissingSeries { metric, market })
    }

    pub fn manual_forecast(&self, metric: Metric, market: Market) -> Option<&WeeklySeries> {
        self.manual
            .get(&(metric, market))
            .filter(|series| !series.is_empty())
    }

    /// Whether a manual forecast sheet was supplied.
    pub fn has_manual_forecast(&self) -> bool {
        self.has_manual
    }

    pub fn promo_scores(&self) -> &PromoScores {
        &self.promo_scores
    }

    pub fn has_promo_scores(&self) -> bool {
        !self.promo_scores.is_empty()
    }

    /// Every non-empty actual series.
    pub fn actual_series(&self) -> impl Iterator<Item = (Metric, Market, &WeeklySeries)> {
        self.actuals
            .iter()
            .filter(|(_, series)| !series.is_empty())
            .map(|((metric, market), series)| (*metric, *market, series))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Week of point `i`: its label, else the ISO week of its date.
fn resolve_week(raw: &SeriesInput, i: usize) -> Option<IsoWeek> {
    raw.weeks
        .get(i)
        .and_then(|label| IsoWeek::parse(label).ok())
        .or_else(|| raw.dates.get(i).and_then(|d| parse_date(d)).map(IsoWeek::from_date))
}

fn ingest_series(metric: Metric, market: Market, raw: &SeriesInput) -> Result<WeeklySeries> {
    let mut points: BTreeMap<IsoWeek, f64> = BTreeMap::new();

    for (i, value) in raw.values.iter().enumerate() {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        let Some(week) = resolve_week(raw, i) else {
            warn!(%metric, %market, index = i, "point without a usable week dropped");
            continue;
        };
        if value < 0.0 {
            warn!(%metric, %market, %week, value, "negative value dropped");
            continue;
        }
        if points.insert(week, value).is_some() {
            warn!(%metric, %market, %week, "duplicate week, keeping the later value");
        }
    }

    WeeklySeries::from_pairs(points)
}

fn ingest(raw: &MetricInput) -> Result<SeriesMap> {
    let mut series = SeriesMap::new();
    for (metric, markets) in raw {
        for (market, input) in markets {
            series.insert((*metric, *market), ingest_series(*metric, *market, input)?);
        }
    }
    Ok(series)
}

fn ingest_scores(raw: &BTreeMap<Market, BTreeMap<String, Option<f64>>>) -> PromoScores {
    let mut scores = PromoScores::new();
    for (market, weeks) in raw {
        for (label, score) in weeks {
            let Some(score) = score.filter(|s| s.is_finite()) else {
                continue;
            };
            match IsoWeek::parse(label) {
                Ok(week) => scores.insert(*market, week, score),
                Err(err) => warn!(%market, error = %err, "promo score dropped"),
            }
        }
    }
    scores
}

/// Per-week values of one metric across the individual markets present.
fn by_week(series: &SeriesMap, metric: Metric) -> BTreeMap<IsoWeek, Vec<(Market, f64)>> {
    let mut weeks: BTreeMap<IsoWeek, Vec<(Market, f64)>> = BTreeMap::new();
    for market in Market::INDIVIDUAL {
        if let Some(s) = series.get(&(metric, market)) {
            for (week, value) in s.iter() {
                weeks.entry(week).or_default().push((market, value));
            }
        }
    }
    weeks
}

fn weighted_mean(values: &[(Market, f64)], weight: impl Fn(Market) -> Option<f64>) -> f64 {
    let weights: Option<Vec<f64>> = values.iter().map(|(market, _)| weight(*market)).collect();
    let simple = values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64;

    match weights {
        Some(weights) => {
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                values
                    .iter()
                    .zip(&weights)
                    .map(|((_, v), w)| v * w)
                    .sum::<f64>()
                    / total
            } else {
                simple
            }
        }
        None => simple,
    }
}

/// Recompute EU5 from the individual markets.
///
/// Counts sum. Transit Conversion is weighted by Transits and UPO by orders
/// (Transits × Transit Conversion); a week where any contributing market
/// lacks its weight falls back to the simple mean.
fn roll_up_eu5(series: &mut SeriesMap) -> Result<()> {
    let lookup = |series: &SeriesMap, metric: Metric, market: Market, week: IsoWeek| {
        series.get(&(metric, market)).and_then(|s| s.value_at(week))
    };

    let mut rolled: Vec<(Metric, WeeklySeries)> = Vec::new();
    for metric in Metric::ALL {
        let weeks = by_week(series, metric);
        if weeks.is_empty() {
            continue;
        }

        let pairs: Vec<(IsoWeek, f64)> = weeks
            .into_iter()
            .map(|(week, values)| {
                let value = match metric {
                    Metric::NetOrderedUnits | Metric::Transits => {
                        values.iter().map(|(_, v)| v).sum::<f64>()
                    }
                    Metric::TransitConversion => weighted_mean(&values, |market| {
                        lookup(series, Metric::Transits, market, week)
                    }),
                    Metric::UnitsPerOrder => weighted_mean(&values, |market| {
                        let transits = lookup(series, Metric::Transits, market, week)?;
                        let conversion = lookup(series, Metric::TransitConversion, market, week)?;
                        Some(transits * conversion)
                    }),
                };
                (week, value)
            })
            .collect();

        debug!(%metric, weeks = pairs.len(), "EU5 recomputed");
        rolled.push((metric, WeeklySeries::from_pairs(pairs)?));
    }

    for (metric, eu5) in rolled {
        series.insert((metric, Market::Eu5), eu5);
    }
    Ok(())
}

/// Holder of the currently published dataset.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: ArcSwapOption<Dataset>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a fully built dataset. Earlier snapshots stay valid.
    pub fn publish(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.current.store(Some(Arc::clone(&dataset)));
        info!(
            actual_series = dataset.actual_series().count(),
            "dataset published"
        );
        dataset
    }

    /// Build a dataset from input and publish it.
    pub fn load(&self, input: DatasetInput) -> Result<Arc<Dataset>> {
        Ok(self.publish(Dataset::from_input(input)?))
    }

    /// The current dataset, if one has been published.
    pub fn snapshot(&self) -> Option<Arc<Dataset>> {
        self.current.load_full()
    }

    pub fn clear(&self) {
        self.current.store(None);
    }
}
