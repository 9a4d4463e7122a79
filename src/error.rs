//! Error types for the marketplace-forecast library.

use crate::core::{Market, Metric};
use thiserror::Error;

/// Result type alias for forecast and analytics operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while forecasting or computing analytics.
///
/// `InsufficientHistory` and `FitNonConvergence` never reach callers of the
/// model fitter: they are recovered through the naive fallback and only show
/// up as a degraded model label.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Not enough weeks of history for the requested model.
    #[error("insufficient history: need at least {needed} weeks, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// The optimizer exhausted its budget without converging.
    #[error("model fit did not converge after {iterations} iterations")]
    FitNonConvergence { iterations: usize },

    /// The requested metric/market pair has no history at all.
    #[error("no data for {metric} / {market}")]
    MissingSeries { metric: Metric, market: Market },

    /// A ratio could not be formed because its denominator was zero.
    #[error("division by zero guarded: denominator is zero")]
    DivisionByZeroGuard,

    /// Unrecognized timeframe name.
    #[error("invalid timeframe: {0}")]
    InvalidTimeframe(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between aligned sequences.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Week label or week ordering problem.
    #[error("week error: {0}")]
    WeekError(String),

    /// Prediction requested before a successful fit.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// The model produced NaN or infinite values.
    #[error("model produced non-finite forecast values")]
    NonFiniteForecast,
}
