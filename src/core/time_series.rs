//! WeeklySeries data structure for one (metric, market) history.

use crate::core::IsoWeek;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// An ordered sequence of weekly observations.
///
/// Weeks are strictly increasing and values are finite and non-negative.
/// Gaps between weeks are allowed; missing weeks are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts", into = "SeriesParts")]
pub struct WeeklySeries {
    weeks: Vec<IsoWeek>,
    values: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct SeriesParts {
    weeks: Vec<IsoWeek>,
    values: Vec<f64>,
}

impl TryFrom<SeriesParts> for WeeklySeries {
    type Error = ForecastError;

    fn try_from(parts: SeriesParts) -> Result<Self> {
        WeeklySeries::new(parts.weeks, parts.values)
    }
}

impl From<WeeklySeries> for SeriesParts {
    fn from(series: WeeklySeries) -> Self {
        SeriesParts {
            weeks: series.weeks,
            values: series.values,
        }
    }
}

impl WeeklySeries {
    /// Create a series, validating ordering and values.
    pub fn new(weeks: Vec<IsoWeek>, values: Vec<f64>) -> Result<Self> {
        if weeks.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: weeks.len(),
                got: values.len(),
            });
        }

        if let Some(pair) = weeks.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ForecastError::WeekError(format!(
                "weeks must be strictly increasing ({} followed by {})",
                pair[0], pair[1]
            )));
        }

        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "series values must be finite and non-negative, got {}",
                bad
            )));
        }

        Ok(Self { weeks, values })
    }

    /// Build a series from (week, value) pairs in any order.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (IsoWeek, f64)>,
    {
        let mut pairs: Vec<(IsoWeek, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|(week, _)| *week);
        let (weeks, values) = pairs.into_iter().unzip();
        Self::new(weeks, values)
    }

    /// Create an empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of observed weeks.
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn weeks(&self) -> &[IsoWeek] {
        &self.weeks
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_week(&self) -> Option<IsoWeek> {
        self.weeks.first().copied()
    }

    pub fn last_week(&self) -> Option<IsoWeek> {
        self.weeks.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Value observed in `week`, if any.
    pub fn value_at(&self, week: IsoWeek) -> Option<f64> {
        self.weeks
            .binary_search(&week)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Iterate over (week, value) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (IsoWeek, f64)> + '_ {
        self.weeks.iter().copied().zip(self.values.iter().copied())
    }

    /// The last `n` observations (or all of them if shorter).
    pub fn tail(&self, n: usize) -> WeeklySeries {
        let start = self.len().saturating_sub(n);
        Self {
            weeks: self.weeks[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Observations whose week is in `weeks`.
    pub fn restrict_to(&self, weeks: &[IsoWeek]) -> WeeklySeries {
        let (weeks, values) = self
            .iter()
            .filter(|(week, _)| weeks.contains(week))
            .unzip();
        Self { weeks, values }
    }

    /// Largest observed value.
    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Weeks present in both series, with this series' value first.
    pub fn overlap(&self, other: &WeeklySeries) -> Vec<(IsoWeek, f64, f64)> {
        self.iter()
            .filter_map(|(week, value)| other.value_at(week).map(|o| (week, value, o)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wk(year: i32, week: u32) -> IsoWeek {
        IsoWeek::new(year, week).unwrap()
    }

    #[test]
    fn series_requires_strictly_increasing_weeks() {
        let ok = WeeklySeries::new(vec![wk(2025, 1), wk(2025, 2)], vec![1.0, 2.0]);
        assert!(ok.is_ok());

        let duplicate = WeeklySeries::new(vec![wk(2025, 1), wk(2025, 1)], vec![1.0, 2.0]);
        assert!(matches!(duplicate, Err(ForecastError::WeekError(_))));

        let reversed = WeeklySeries::new(vec![wk(2025, 3), wk(2025, 2)], vec![1.0, 2.0]);
        assert!(reversed.is_err());
    }

    #[test]
    fn series_rejects_negative_and_non_finite_values() {
        assert!(WeeklySeries::new(vec![wk(2025, 1)], vec![-1.0]).is_err());
        assert!(WeeklySeries::new(vec![wk(2025, 1)], vec![f64::NAN]).is_err());
        assert!(WeeklySeries::new(vec![wk(2025, 1)], vec![0.0]).is_ok());
    }

    #[test]
    fn series_rejects_length_mismatch() {
        let result = WeeklySeries::new(vec![wk(2025, 1)], vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn from_pairs_sorts_by_week() {
        let series =
            WeeklySeries::from_pairs(vec![(wk(2025, 3), 3.0), (wk(2025, 1), 1.0), (wk(2025, 2), 2.0)])
                .unwrap();
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.first_week(), Some(wk(2025, 1)));
        assert_eq!(series.last_week(), Some(wk(2025, 3)));
    }

    #[test]
    fn lookups_and_windows() {
        let series = WeeklySeries::from_pairs((1..=6).map(|w| (wk(2025, w), w as f64 * 10.0)))
            .unwrap();

        assert_eq!(series.value_at(wk(2025, 4)), Some(40.0));
        assert_eq!(series.value_at(wk(2025, 9)), None);
        assert_eq!(series.tail(2).values(), &[50.0, 60.0]);
        assert_eq!(series.tail(100).len(), 6);
        assert_eq!(series.max_value(), Some(60.0));
        assert_eq!(series.last_value(), Some(60.0));

        let restricted = series.restrict_to(&[wk(2025, 2), wk(2025, 5)]);
        assert_eq!(restricted.values(), &[20.0, 50.0]);
    }

    #[test]
    fn overlap_keeps_common_weeks_only() {
        let actual = WeeklySeries::from_pairs(vec![(wk(2025, 1), 1.0), (wk(2025, 2), 2.0)]).unwrap();
        let manual = WeeklySeries::from_pairs(vec![(wk(2025, 2), 2.5), (wk(2025, 3), 3.5)]).unwrap();

        let overlap = actual.overlap(&manual);
        assert_eq!(overlap, vec![(wk(2025, 2), 2.0, 2.5)]);
    }

    #[test]
    fn empty_series_has_no_extremes() {
        let series = WeeklySeries::empty();
        assert!(series.is_empty());
        assert_eq!(series.max_value(), None);
        assert_eq!(series.last_week(), None);
    }

    #[test]
    fn deserialization_validates_invariants() {
        let bad = r#"{"weeks":["Wk02 2025","Wk01 2025"],"values":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<WeeklySeries>(bad).is_err());

        let good = r#"{"weeks":["Wk01 2025","Wk02 2025"],"values":[1.0,2.0]}"#;
        let series: WeeklySeries = serde_json::from_str(good).unwrap();
        assert_eq!(series.len(), 2);
    }
}
