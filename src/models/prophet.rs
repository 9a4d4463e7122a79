//! Prophet-style additive model: linear trend plus Fourier seasonality.
//!
//! Components are fitted jointly by ridge-regularized least squares. The
//! monthly cycle is used whenever seasonality is enabled, the yearly cycle
//! only once two years of weekly history are available.

use crate::core::{Forecast, ForecastMethod, IsoWeek, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::ols::{ridge_fit_with_penalties, LinearFit};
use crate::utils::stats::interval_z;
use std::f64::consts::PI;
use tracing::debug;

/// Average month length in weeks.
pub const MONTHLY_PERIOD: f64 = 4.348;
/// Average year length in weeks.
pub const YEARLY_PERIOD: f64 = 52.18;
/// Harmonics per seasonal cycle.
pub const FOURIER_ORDER: usize = 3;
/// History needed before the yearly cycle is modelled.
pub const YEARLY_MIN_HISTORY: usize = 104;
/// History needed before the monthly cycle is modelled.
pub const MONTHLY_MIN_HISTORY: usize = 8;

/// L2 penalty on Fourier coefficients; the trend is unpenalized.
const SEASONAL_PENALTY: f64 = 0.1;

/// Linear trend with optional monthly and yearly Fourier terms.
#[derive(Debug, Clone)]
pub struct ProphetLike {
    seasonal: bool,
    periods: Vec<f64>,
    regression: Option<LinearFit>,
    first_week: Option<IsoWeek>,
    last_week: Option<IsoWeek>,
    span: f64,
    sigma: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl ProphetLike {
    pub fn new(seasonal: bool) -> Self {
        Self {
            seasonal,
            periods: vec![],
            regression: None,
            first_week: None,
            last_week: None,
            span: 1.0,
            sigma: 0.0,
            fitted: None,
            residuals: None,
        }
    }

    /// Seasonal periods (in weeks) chosen by the last fit.
    pub fn periods(&self) -> &[f64] {
        &self.periods
    }

    /// Design columns for the given week offsets from the first week.
    fn design(&self, t: &[f64]) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(1 + 2 * FOURIER_ORDER * self.periods.len());
        columns.push(t.iter().map(|ti| ti / self.span).collect());

        for period in &self.periods {
            for k in 1..=FOURIER_ORDER {
                let freq = 2.0 * PI * k as f64 / period;
                columns.push(t.iter().map(|ti| (freq * ti).cos()).collect());
                columns.push(t.iter().map(|ti| (freq * ti).sin()).collect());
            }
        }

        columns
    }
}

/// Whole weeks between two ISO weeks.
fn weeks_between(from: IsoWeek, to: IsoWeek) -> f64 {
    (to.monday() - from.monday()).num_days() as f64 / 7.0
}

impl Forecaster for ProphetLike {
    fn fit(&mut self, series: &WeeklySeries) -> Result<()> {
        let n = series.len();
        let (first, last) = match (series.first_week(), series.last_week()) {
            (Some(first), Some(last)) if n >= 2 => (first, last),
            _ => return Err(ForecastError::InsufficientHistory { needed: 2, got: n }),
        };

        self.periods.clear();
        if self.seasonal && n >= MONTHLY_MIN_HISTORY {
            self.periods.push(MONTHLY_PERIOD);
        }
        if self.seasonal && n >= YEARLY_MIN_HISTORY {
            self.periods.push(YEARLY_PERIOD);
        }

        let t: Vec<f64> = series
            .weeks()
            .iter()
            .map(|week| weeks_between(first, *week))
            .collect();
        self.span = weeks_between(first, last).max(1.0);

        let columns = self.design(&t);
        let y = series.values();
        let penalties: Vec<f64> = (0..columns.len())
            .map(|i| if i == 0 { 0.0 } else { SEASONAL_PENALTY })
            .collect();
        let regression = ridge_fit_with_penalties(y, &columns, &penalties)?;
        let residuals = regression.residuals(y, &columns)?;

        let dof = n.saturating_sub(columns.len() + 1).max(1) as f64;
        let sigma = (residuals.iter().map(|r| r * r).sum::<f64>() / dof).sqrt();
        if !sigma.is_finite() {
            return Err(ForecastError::NonFiniteForecast);
        }

        debug!(
            n,
            periods = self.periods.len(),
            sigma,
            "prophet-style model fitted"
        );

        self.fitted = Some(y.iter().zip(&residuals).map(|(v, r)| v - r).collect());
        self.residuals = Some(residuals);
        self.regression = Some(regression);
        self.first_week = Some(first);
        self.last_week = Some(last);
        self.sigma = sigma;
        Ok(())
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let regression = self.regression.as_ref().ok_or(ForecastError::FitRequired)?;
        let (first, last) = match (self.first_week, self.last_week) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ForecastError::FitRequired),
        };

        let weeks = last.following(horizon);
        let t: Vec<f64> = weeks.iter().map(|w| weeks_between(first, *w)).collect();
        let values = regression.predict(&self.design(&t))?;

        let z = interval_z(level);
        let (lower, upper): (Vec<f64>, Vec<f64>) = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let half = z * self.sigma * ((i + 1) as f64).sqrt();
                (v - half, v + half)
            })
            .unzip();

        Forecast::from_columns(&weeks, &values, &lower, &upper, self.method(), self.name())
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "Prophet"
    }

    fn method(&self) -> ForecastMethod {
        ForecastMethod::Prophet
    }
}
