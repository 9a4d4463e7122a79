//! Final pass over forecasts: metric caps, non-negative clamp and chart scale.
//!
//! Caps bound runaway extrapolation of a fitted metric. They apply to the
//! point and to both bounds; the label is only tagged when a point value
//! itself exceeded the cap.

use crate::core::{CapApplied, ChartScale, Forecast, ForecastPoint, Metric, WeeklySeries};

/// Upper bound on Transit Conversion forecasts.
pub const MAX_TRANSIT_CONVERSION: f64 = 0.10;
/// Transits may not exceed this multiple of the market's historical max.
pub const TRANSITS_CAP_MULTIPLIER: f64 = 3.0;
/// UPO may not exceed this multiple of the market's historical max.
pub const UPO_CAP_MULTIPLIER: f64 = 2.0;
/// Headroom above the largest charted value.
pub const CHART_HEADROOM: f64 = 1.15;
/// Chart maximum when there is nothing to chart.
pub const DEFAULT_CHART_MAX: f64 = 100.0;

/// Historical maxima a metric cap is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapContext {
    /// Largest historical value of the series being capped.
    pub market_max: Option<f64>,
    /// Largest historical EU5 Transits value.
    pub eu5_transits_max: Option<f64>,
}

/// Cap for a metric, if it has one.
///
/// Transits: the smaller of the EU5 maximum and three times the market's own
/// maximum. UPO: twice the market's maximum. Transit Conversion: 10%.
/// Net Ordered Units is never capped.
pub fn metric_cap(metric: Metric, context: CapContext) -> Option<f64> {
    match metric {
        Metric::TransitConversion => Some(MAX_TRANSIT_CONVERSION),
        Metric::Transits => {
            let own = context.market_max.map(|m| m * TRANSITS_CAP_MULTIPLIER);
            match (context.eu5_transits_max, own) {
                (Some(eu5), Some(own)) => Some(eu5.min(own)),
                (eu5, own) => eu5.or(own),
            }
        }
        Metric::UnitsPerOrder => context.market_max.map(|m| m * UPO_CAP_MULTIPLIER),
        Metric::NetOrderedUnits => None,
    }
}

/// Clamp every point and bound to `cap`.
pub fn apply_cap(forecast: Forecast, cap: f64) -> Forecast {
    let exceeded = forecast.points().iter().filter(|p| p.value > cap).count();
    let capped = forecast.map_points(|p| ForecastPoint {
        value: p.value.min(cap),
        lower: p.lower.min(cap),
        upper: p.upper.min(cap),
        ..p
    });

    if exceeded > 0 {
        capped.tagged_capped(CapApplied {
            value: cap,
            weeks: exceeded,
        })
    } else {
        capped
    }
}

/// Floor every point and bound at zero.
pub fn clamp_non_negative(forecast: Forecast) -> Forecast {
    forecast.map_points(|p| ForecastPoint {
        value: p.value.max(0.0),
        lower: p.lower.max(0.0),
        upper: p.upper.max(0.0),
        ..p
    })
}

/// Axis range from history and manual forecast; the model forecast is ignored.
pub fn chart_scale(history: &WeeklySeries, manual: Option<&WeeklySeries>) -> ChartScale {
    let largest = history
        .values()
        .iter()
        .chain(manual.map(WeeklySeries::values).unwrap_or_default())
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    ChartScale {
        min: 0.0,
        max: largest.map_or(DEFAULT_CHART_MAX, |m| m * CHART_HEADROOM),
    }
}

/// Apply the metric's cap and attach chart scale metadata.
pub fn sanitize(
    forecast: Forecast,
    metric: Metric,
    context: CapContext,
    history: &WeeklySeries,
    manual: Option<&WeeklySeries>,
) -> Forecast {
    let forecast = match metric_cap(metric, context) {
        Some(cap) => apply_cap(forecast, cap),
        None => forecast,
    };
    let scale = chart_scale(history, manual);
    forecast.with_metadata(|meta| meta.chart_scale = Some(scale))
}
