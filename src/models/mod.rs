//! Forecasting models and the model fitter.

mod fitter;
mod prophet;
mod traits;

pub mod arima;
pub mod baseline;

pub use fitter::ModelFitter;
pub use prophet::{ProphetLike, FOURIER_ORDER, MONTHLY_PERIOD, YEARLY_PERIOD};
pub use traits::{BoxedForecaster, Forecaster};
