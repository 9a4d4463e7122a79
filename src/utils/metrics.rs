//! Accuracy metrics for comparing a forecast against realized actuals.

use crate::error::{ForecastError, Result};

/// Error metrics over a set of aligned (actual, forecast) weeks.
///
/// All values are percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Weighted MAPE: `Σ|a - f| / Σ|a|`.
    pub wmape: f64,
    /// Mean of `|a - f| / |a|`, weeks with `a = 0` excluded.
    pub mape: f64,
    /// Mean of `(f - a) / a`, weeks with `a = 0` excluded. Positive means over-forecast.
    pub bias: f64,
    /// Number of weeks compared.
    pub weeks: usize,
}

/// Calculate accuracy metrics between actual and forecast values.
///
/// Zero actuals stay in the WMAPE sums but are excluded from MAPE and bias.
/// Returns [`ForecastError::DivisionByZeroGuard`] when every actual is zero.
pub fn calculate_metrics(actual: &[f64], forecast: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() {
        return Err(ForecastError::InsufficientHistory { needed: 1, got: 0 });
    }

    if actual.len() != forecast.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: forecast.len(),
        });
    }

    let abs_error: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    let abs_actual: f64 = actual.iter().map(|a| a.abs()).sum();

    if abs_actual == 0.0 {
        return Err(ForecastError::DivisionByZeroGuard);
    }

    let wmape = 100.0 * abs_error / abs_actual;

    let relative: Vec<f64> = actual
        .iter()
        .zip(forecast.iter())
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, f)| (f - a) / a)
        .collect();
    // Non-empty: at least one actual is non-zero.
    let nonzero = relative.len() as f64;

    let mape = 100.0 * relative.iter().map(|r| r.abs()).sum::<f64>() / nonzero;
    let bias = 100.0 * relative.iter().sum::<f64>() / nonzero;

    Ok(AccuracyMetrics {
        wmape,
        mape,
        bias,
        weeks: actual.len(),
    })
}

/// Signed deviation of a forecast from an actual, in percent.
///
/// `None` when the actual is zero.
pub fn deviation_pct(actual: f64, forecast: f64) -> Option<f64> {
    if actual == 0.0 {
        None
    } else {
        Some((forecast - actual) / actual * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_forecast_scores_zero_error() {
        let actual = vec![10.0, 20.0, 30.0];

        let metrics = calculate_metrics(&actual, &actual).unwrap();

        assert_relative_eq!(metrics.wmape, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.mape, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.bias, 0.0, epsilon = 1e-12);
        assert_eq!(metrics.weeks, 3);
    }

    #[test]
    fn known_values() {
        let actual = vec![100.0, 110.0, 90.0, 120.0];
        let forecast = vec![105.0, 105.0, 95.0, 115.0];

        let metrics = calculate_metrics(&actual, &forecast).unwrap();

        assert_relative_eq!(metrics.wmape, 2000.0 / 420.0, epsilon = 1e-10);
        let expected_bias = (0.05 - 5.0 / 110.0 + 5.0 / 90.0 - 5.0 / 120.0) / 4.0 * 100.0;
        assert_relative_eq!(metrics.bias, expected_bias, epsilon = 1e-10);
        let expected_mape = (0.05 + 5.0 / 110.0 + 5.0 / 90.0 + 5.0 / 120.0) / 4.0 * 100.0;
        assert_relative_eq!(metrics.mape, expected_mape, epsilon = 1e-10);
    }

    #[test]
    fn zero_actuals_excluded_from_mape_but_not_wmape() {
        let actual = vec![0.0, 100.0];
        let forecast = vec![10.0, 110.0];

        let metrics = calculate_metrics(&actual, &forecast).unwrap();

        // (10 + 10) / 100
        assert_relative_eq!(metrics.wmape, 20.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.mape, 10.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.bias, 10.0, epsilon = 1e-10);
        assert_eq!(metrics.weeks, 2);
    }

    #[test]
    fn all_zero_actuals_are_guarded() {
        assert_eq!(
            calculate_metrics(&[0.0, 0.0], &[1.0, 2.0]),
            Err(ForecastError::DivisionByZeroGuard)
        );
    }

    #[test]
    fn dimension_mismatch_and_empty() {
        assert!(matches!(
            calculate_metrics(&[1.0, 2.0], &[1.0]),
            Err(ForecastError::DimensionMismatch { .. })
        ));
        assert!(calculate_metrics(&[], &[]).is_err());
    }

    #[test]
    fn deviation_pct_signs() {
        assert_relative_eq!(deviation_pct(100.0, 120.0).unwrap(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(deviation_pct(100.0, 75.0).unwrap(), -25.0, epsilon = 1e-12);
        assert_eq!(deviation_pct(0.0, 5.0), None);
    }
}
