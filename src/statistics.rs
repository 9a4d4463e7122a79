//! Summary statistics over actual series and forecasts.

use crate::accuracy::Timeframe;
use crate::core::{Forecast, WeeklySeries};
use crate::utils::{mean, std_dev};
use serde::{Deserialize, Serialize};

/// Descriptive statistics of a series window. Values are unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    /// Sample standard deviation; 0 for a single value.
    pub std_dev: f64,
    /// Mean of the last four values of the full series.
    pub last_4_week_average: f64,
}

/// Statistics of a window of `series`. `None` when the window is empty.
pub fn summary_statistics(series: &WeeklySeries, timeframe: Timeframe) -> Option<SummaryStatistics> {
    let window = timeframe.window(series);
    let values = window.values();
    let average = mean(values)?;

    Some(SummaryStatistics {
        total: values.iter().sum(),
        average,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: values.len(),
        std_dev: std_dev(values).unwrap_or(0.0),
        last_4_week_average: mean(series.tail(4).values()).unwrap_or(average),
    })
}

/// Totals and range of a forecast's point values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastStatistics {
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl ForecastStatistics {
    pub fn from_forecast(forecast: &Forecast) -> Option<Self> {
        let values = forecast.values();
        let average = mean(&values)?;
        Some(Self {
            total: values.iter().sum(),
            average,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ForecastMethod, IsoWeek};
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> WeeklySeries {
        let start = IsoWeek::new(2025, 1).unwrap();
        WeeklySeries::from_pairs(values.iter().enumerate().map(|(i, v)| (start.plus(i as u32), *v)))
            .unwrap()
    }

    #[test]
    fn full_history_statistics() {
        let stats = summary_statistics(&series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Timeframe::Total)
            .unwrap();
        assert_eq!(stats.total, 40.0);
        assert_eq!(stats.average, 5.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.count, 8);
        assert_relative_eq!(stats.std_dev, (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_eq!(stats.last_4_week_average, 6.5);
    }

    #[test]
    fn windowed_statistics() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let t4w = summary_statistics(&s, Timeframe::T4w).unwrap();
        assert_eq!(t4w.count, 4);
        assert_eq!(t4w.total, 18.0);

        let cw = summary_statistics(&s, Timeframe::Cw).unwrap();
        assert_eq!(cw.count, 1);
        assert_eq!(cw.average, 6.0);
        assert_eq!(cw.std_dev, 0.0);
        assert_eq!(cw.last_4_week_average, 4.5);
    }

    #[test]
    fn short_series_averages_everything() {
        let stats = summary_statistics(&series(&[3.0, 5.0]), Timeframe::Total).unwrap();
        assert_eq!(stats.last_4_week_average, 4.0);
        assert!(summary_statistics(&WeeklySeries::empty(), Timeframe::Total).is_none());
    }

    #[test]
    fn statistics_are_deterministic() {
        let s = series(&[0.1, 0.2, 0.3, 0.7, 1.1]);
        let a = summary_statistics(&s, Timeframe::Total).unwrap();
        let b = summary_statistics(&s, Timeframe::Total).unwrap();
        assert_eq!(a.total.to_bits(), b.total.to_bits());
        assert_eq!(a.std_dev.to_bits(), b.std_dev.to_bits());
    }

    #[test]
    fn forecast_statistics() {
        let weeks = IsoWeek::new(2025, 10).unwrap().following(3);
        let forecast = Forecast::from_columns(
            &weeks,
            &[10.0, 30.0, 20.0],
            &[0.0; 3],
            &[40.0; 3],
            ForecastMethod::Prophet,
            "Prophet",
        )
        .unwrap();
        let stats = ForecastStatistics::from_forecast(&forecast).unwrap();
        assert_eq!(stats.total, 60.0);
        assert_eq!(stats.average, 20.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
    }
}
