//! Per-market weekly promo intensity scores.

use crate::core::{IsoWeek, Market};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Promo scores keyed by market, then week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoScores {
    markets: BTreeMap<Market, BTreeMap<IsoWeek, f64>>,
}

impl PromoScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a score, replacing any earlier score for the same week.
    pub fn insert(&mut self, market: Market, week: IsoWeek, score: f64) {
        self.markets.entry(market).or_default().insert(week, score);
    }

    /// Score for one market and week.
    pub fn score(&self, market: Market, week: IsoWeek) -> Option<f64> {
        self.markets.get(&market)?.get(&week).copied()
    }

    /// All scores of one market.
    pub fn market(&self, market: Market) -> Option<&BTreeMap<IsoWeek, f64>> {
        self.markets.get(&market)
    }

    pub fn is_empty(&self) -> bool {
        self.markets.values().all(BTreeMap::is_empty)
    }

    /// Total number of scored weeks across markets.
    pub fn len(&self) -> usize {
        self.markets.values().map(BTreeMap::len).sum()
    }
}

impl FromIterator<(Market, IsoWeek, f64)> for PromoScores {
    fn from_iter<I: IntoIterator<Item = (Market, IsoWeek, f64)>>(iter: I) -> Self {
        let mut scores = PromoScores::new();
        for (market, week, score) in iter {
            scores.insert(market, week, score);
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_market_and_week() {
        let week = IsoWeek::new(2025, 10).unwrap();
        let scores: PromoScores = vec![(Market::Uk, week, 3.0), (Market::De, week, 1.0)]
            .into_iter()
            .collect();

        assert_eq!(scores.score(Market::Uk, week), Some(3.0));
        assert_eq!(scores.score(Market::Fr, week), None);
        assert_eq!(scores.score(Market::Uk, week.next()), None);
        assert_eq!(scores.len(), 2);
        assert!(!scores.is_empty());
        assert!(PromoScores::new().is_empty());
    }

    #[test]
    fn serializes_as_nested_map() {
        let week = IsoWeek::new(2025, 3).unwrap();
        let scores: PromoScores = std::iter::once((Market::It, week, 2.0)).collect();
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"IT":{"Wk03 2025":2.0}}"#);
    }
}
