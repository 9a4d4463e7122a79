//! Historical uplift per promo band.

use crate::core::{IsoWeek, WeeklySeries};
use crate::promo::band::{classify, PromoBand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the uplift baseline average came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Average of weeks in the No/Low band.
    NoLowWeeks,
    /// No week fell in the No/Low band; average of every actual week.
    FullSeries,
}

/// Descriptive statistics of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStats {
    pub band: PromoBand,
    pub average: f64,
    pub weeks: usize,
    /// Band average over baseline average; absent when the baseline is zero.
    pub uplift_factor: Option<f64>,
    pub uplift_pct: Option<f64>,
}

/// Banded uplift table for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoAnalysis {
    pub baseline_average: f64,
    pub baseline_source: BaselineSource,
    /// Bands with at least one week, weakest first.
    pub bands: Vec<BandStats>,
}

impl PromoAnalysis {
    pub fn band(&self, band: PromoBand) -> Option<&BandStats> {
        self.bands.iter().find(|b| b.band == band)
    }
}

/// Group actual weeks by promo band and compare each band to the baseline.
///
/// Weeks without a score (or with a NaN score) are excluded from every band.
/// Returns `None` when no actual week has a band.
pub fn analyze(series: &WeeklySeries, scores: &BTreeMap<IsoWeek, f64>) -> Option<PromoAnalysis> {
    let mut grouped: BTreeMap<PromoBand, Vec<f64>> = BTreeMap::new();
    for (week, value) in series.iter() {
        if let Some(band) = classify(scores.get(&week).copied()) {
            grouped.entry(band).or_default().push(value);
        }
    }
    if grouped.is_empty() {
        return None;
    }

    let (baseline_average, baseline_source) = match grouped.get(&PromoBand::NoLow) {
        Some(values) => (average(values), BaselineSource::NoLowWeeks),
        None => (average(series.values()), BaselineSource::FullSeries),
    };

    let bands = grouped
        .into_iter()
        .map(|(band, values)| {
            let avg = average(&values);
            let uplift_factor = (baseline_average != 0.0).then(|| avg / baseline_average);
            BandStats {
                band,
                average: avg,
                weeks: values.len(),
                uplift_factor,
                uplift_pct: uplift_factor.map(|f| (f - 1.0) * 100.0),
            }
        })
        .collect();

    Some(PromoAnalysis {
        baseline_average,
        baseline_source,
        bands,
    })
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup(values: &[f64], scores: &[Option<f64>]) -> (WeeklySeries, BTreeMap<IsoWeek, f64>) {
        let start = IsoWeek::new(2025, 1).unwrap();
        let weeks: Vec<IsoWeek> = (0..values.len()).map(|i| start.plus(i as u32)).collect();
        let series = WeeklySeries::new(weeks.clone(), values.to_vec()).unwrap();
        let map = weeks
            .into_iter()
            .zip(scores)
            .filter_map(|(w, s)| s.map(|s| (w, s)))
            .collect();
        (series, map)
    }

    #[test]
    fn strong_band_uplift_against_no_low_baseline() {
        let (series, scores) = setup(
            &[100.0, 120.0, 130.0, 220.0],
            &[Some(0.0), Some(1.0), Some(2.0), Some(4.0)],
        );
        let analysis = analyze(&series, &scores).unwrap();

        assert_eq!(analysis.baseline_source, BaselineSource::NoLowWeeks);
        assert_relative_eq!(analysis.baseline_average, 110.0);

        let no_low = analysis.band(PromoBand::NoLow).unwrap();
        assert_eq!(no_low.weeks, 2);
        assert_relative_eq!(no_low.uplift_factor.unwrap(), 1.0);

        let light = analysis.band(PromoBand::Light).unwrap();
        assert_eq!(light.weeks, 1);

        let strong = analysis.band(PromoBand::Strong).unwrap();
        assert_relative_eq!(strong.uplift_factor.unwrap(), 2.0);
        assert_relative_eq!(strong.uplift_pct.unwrap(), 100.0);

        assert!(analysis.band(PromoBand::Medium).is_none());
    }

    #[test]
    fn unscored_weeks_are_excluded() {
        let (series, scores) = setup(&[100.0, 500.0, 150.0], &[Some(1.0), None, Some(f64::NAN)]);
        let analysis = analyze(&series, &scores).unwrap();
        assert_eq!(analysis.bands.len(), 1);
        assert_eq!(analysis.bands[0].weeks, 1);
        assert_relative_eq!(analysis.baseline_average, 100.0);
    }

    #[test]
    fn full_series_baseline_without_no_low_weeks() {
        let (series, scores) = setup(&[100.0, 200.0, 300.0], &[None, Some(2.0), Some(3.5)]);
        let analysis = analyze(&series, &scores).unwrap();

        assert_eq!(analysis.baseline_source, BaselineSource::FullSeries);
        assert_relative_eq!(analysis.baseline_average, 200.0);
        let strong = analysis.band(PromoBand::Strong).unwrap();
        assert_relative_eq!(strong.uplift_factor.unwrap(), 1.5);
    }

    #[test]
    fn zero_baseline_has_no_uplift() {
        let (series, scores) = setup(&[0.0, 50.0], &[Some(1.0), Some(4.0)]);
        let analysis = analyze(&series, &scores).unwrap();
        let strong = analysis.band(PromoBand::Strong).unwrap();
        assert_eq!(strong.uplift_factor, None);
        assert_eq!(strong.uplift_pct, None);
    }

    #[test]
    fn no_scores_no_analysis() {
        let (series, scores) = setup(&[1.0, 2.0], &[None, None]);
        assert!(analyze(&series, &scores).is_none());
    }
}
