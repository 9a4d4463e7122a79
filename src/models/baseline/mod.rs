//! Baseline forecasting models.

mod naive;

pub use naive::MovingAverageFallback;
