//! Core data structures: week identifiers, weekly series and forecasts.

mod forecast;
mod market;
mod time_series;
mod week;

pub use forecast::{
    CapApplied, ChartScale, DerivedSources, FitInfo, FloorSummary, Forecast, ForecastMetadata,
    ForecastMethod, ForecastPoint, PromoInfo,
};
pub use market::{Market, Metric};
pub use time_series::WeeklySeries;
pub use week::IsoWeek;
