//! Numerical utilities shared by the forecasting models and analytics.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, deviation_pct, AccuracyMetrics};
pub use ols::{ols_fit, ridge_fit, ridge_fit_with_penalties, LinearFit};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult, StopReason};
pub use stats::{interval_z, mean, population_std_dev, quantile_normal, std_dev};
