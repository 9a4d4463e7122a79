//! # marketplace-forecast
//!
//! Weekly marketplace forecasting and accuracy analytics.
//!
//! Forecasts Transits, Transit Conversion and UPO per market twelve weeks
//! ahead with SARIMAX (optionally driven by promo scores) or a Prophet-style
//! additive model, composes Net Ordered Units from those drivers, and scores
//! analyst manual forecasts against realized actuals.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod accuracy;
pub mod config;
pub mod core;
pub mod dataset;
pub mod derived;
pub mod engine;
pub mod error;
pub mod models;
pub mod promo;
pub mod sanitize;
pub mod statistics;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::accuracy::{AccuracyRecord, DeviationColour, Grade, Timeframe};
    pub use crate::config::{EngineSettings, FitBudget, ForecastConfig, ModelKind};
    pub use crate::core::{Forecast, ForecastMethod, IsoWeek, Market, Metric, WeeklySeries};
    pub use crate::dataset::{Dataset, DatasetInput, DatasetStore, SeriesInput};
    pub use crate::engine::{ForecastEngine, ForecastSet};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, ModelFitter};
    pub use crate::promo::{PromoBand, PromoScores};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
