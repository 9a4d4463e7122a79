//! Net Ordered Units composed from its three driver forecasts.

use crate::core::{DerivedSources, Forecast, ForecastMethod};
use crate::error::{ForecastError, Result};

/// Label of every derived Net Ordered Units forecast.
pub const DERIVED_LABEL: &str = "Calculated (T×C×U)";

/// Compose Net Ordered Units as Transits × Transit Conversion × UPO.
///
/// Points multiply elementwise. Bounds multiply bound-by-bound (lower with
/// lower, upper with upper), which approximates rather than propagates the
/// drivers' uncertainty. Every value is floored at zero.
pub fn compose_net_ordered_units(
    transits: &Forecast,
    conversion: &Forecast,
    units_per_order: &Forecast,
) -> Result<Forecast> {
    let horizon = transits.horizon();
    for other in [conversion, units_per_order] {
        if other.horizon() != horizon {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: other.horizon(),
            });
        }
        if other.weeks() != transits.weeks() {
            return Err(ForecastError::WeekError(
                "driver forecasts cover different weeks".to_string(),
            ));
        }
    }

    let (t, c, u) = (transits.points(), conversion.points(), units_per_order.points());
    let values: Vec<f64> = (0..horizon)
        .map(|i| (t[i].value * c[i].value * u[i].value).max(0.0))
        .collect();
    let lower: Vec<f64> = (0..horizon)
        .map(|i| (t[i].lower * c[i].lower * u[i].lower).max(0.0))
        .collect();
    let upper: Vec<f64> = (0..horizon)
        .map(|i| (t[i].upper * c[i].upper * u[i].upper).max(0.0))
        .collect();

    let sources = DerivedSources {
        transits: transits.label().to_string(),
        transit_conversion: conversion.label().to_string(),
        units_per_order: units_per_order.label().to_string(),
    };

    Ok(Forecast::from_columns(
        &transits.weeks(),
        &values,
        &lower,
        &upper,
        ForecastMethod::Derived,
        DERIVED_LABEL,
    )?
    .with_metadata(|meta| meta.sources = Some(sources)))
}
