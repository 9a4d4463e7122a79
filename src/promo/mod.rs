//! Promotional intensity: scores, bands, regressor preparation and uplift.

pub mod band;
mod regressor;
mod scores;
pub mod uplift;

pub use band::{classify, PromoBand};
pub use regressor::{apply_floor, PromoRegressor, NEUTRAL_SCORE};
pub use scores::PromoScores;
pub use uplift::{analyze, BandStats, BaselineSource, PromoAnalysis};
