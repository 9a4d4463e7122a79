//! Seasonal ARIMA with an exogenous regressor (SARIMAX).
//!
//! This module provides:
//! - Regular and seasonal differencing with lag-polynomial integration
//! - SARIMAX(p, d, q)(P, D, Q)\[s\] fitted by conditional sum of squares

mod diff;
mod model;

pub use diff::{difference, difference_operator, integrate, lag_difference, seasonal_difference};
pub use model::{ARIMASpec, SeasonalSpec, SARIMAX};
