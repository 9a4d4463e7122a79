//! Promo scores as an exogenous regressor, and the promo floor.

use crate::core::{FloorSummary, Forecast, ForecastPoint, IsoWeek, Market, PromoInfo, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::promo::PromoScores;

/// Score of a week without promotional activity.
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Promo scores aligned with a history and its forecast horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoRegressor {
    /// One score per historical week; neutral where missing.
    pub history: Vec<f64>,
    /// One score per horizon week; neutral where not supplied.
    pub future: Vec<f64>,
    pub info: PromoInfo,
}

impl PromoRegressor {
    /// Align `market`'s scores with `history` and the `horizon` weeks after it.
    pub fn prepare(
        scores: &PromoScores,
        market: Market,
        history: &WeeklySeries,
        horizon: usize,
    ) -> Self {
        let mut with_scores = 0;
        let past: Vec<f64> = history
            .weeks()
            .iter()
            .map(|week| match scores.score(market, *week) {
                Some(score) => {
                    with_scores += 1;
                    score
                }
                None => NEUTRAL_SCORE,
            })
            .collect();

        let future_weeks: Vec<IsoWeek> = history
            .last_week()
            .map(|last| last.following(horizon))
            .unwrap_or_default();
        let future: Vec<f64> = future_weeks
            .iter()
            .map(|week| scores.score(market, *week).unwrap_or(NEUTRAL_SCORE))
            .collect();

        let info = PromoInfo {
            historical_weeks_with_scores: with_scores,
            total_historical_weeks: history.len(),
            future_scores: future_weeks.into_iter().zip(future.iter().copied()).collect(),
        };

        Self {
            history: past,
            future,
            info,
        }
    }

    /// Whether the regressor carries information a fit can use: at least one
    /// scored historical week and some variation across history.
    pub fn is_informative(&self) -> bool {
        let varies = self
            .history
            .first()
            .is_some_and(|first| self.history.iter().any(|s| s != first));
        self.info.historical_weeks_with_scores > 0 && varies
    }
}

/// Combine a promo-adjusted forecast with its no-promo baseline.
///
/// Per horizon week: a score above neutral takes the larger of the two on
/// the point and on each bound; a neutral score takes the baseline; a score
/// below neutral keeps the promo forecast. The result is tagged floored when
/// the baseline raised at least one point.
pub fn apply_floor(promo: Forecast, baseline: &Forecast, future_scores: &[f64]) -> Result<Forecast> {
    if baseline.horizon() != promo.horizon() {
        return Err(ForecastError::DimensionMismatch {
            expected: promo.horizon(),
            got: baseline.horizon(),
        });
    }

    let base = baseline.points();
    let mut floored_weeks = 0;
    let mut baseline_weeks = 0;
    let mut index = 0;

    let combined = promo.map_points(|p| {
        let b = base[index];
        let score = future_scores.get(index).copied().unwrap_or(NEUTRAL_SCORE);
        index += 1;

        if score > NEUTRAL_SCORE {
            if b.value > p.value {
                floored_weeks += 1;
            }
            ForecastPoint {
                week: p.week,
                value: p.value.max(b.value),
                lower: p.lower.max(b.lower),
                upper: p.upper.max(b.upper),
            }
        } else if score == NEUTRAL_SCORE {
            baseline_weeks += 1;
            ForecastPoint { week: p.week, ..b }
        } else {
            p
        }
    });

    let summary = FloorSummary {
        floored_weeks,
        baseline_weeks,
    };
    let combined = combined.with_metadata(|meta| meta.floor = Some(summary));

    Ok(if floored_weeks > 0 {
        combined.tagged_floored()
    } else {
        combined
    })
}
