//! SARIMAX: linear regression on an exogenous driver with seasonal ARIMA errors.
//!
//! The model is `y_t = beta * x_t + u_t` where `u_t` follows
//! SARIMA(p, d, q)(P, D, Q)\[s\]. Differencing is applied to both `y` and `x`,
//! so no intercept is estimated once any differencing is present.
//!
//! Parameters are estimated by conditional sum of squares on a standardized
//! differenced series with bounded Nelder-Mead. Multiplicative seasonal
//! polynomials are expanded into full lag vectors before filtering.

use crate::core::{FitInfo, Forecast, ForecastMethod, IsoWeek, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{
    difference, difference_operator, integrate, multiply, seasonal_difference,
};
use crate::models::Forecaster;
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{interval_z, mean, population_std_dev};
use std::time::Duration;
use tracing::debug;

/// Bound on every AR and MA coefficient.
const COEF_BOUND: f64 = 0.99;

/// Non-seasonal ARIMA order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Seasonal order (P, D, Q)\[period\].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeasonalSpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalSpec {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// No seasonal component: (0, 0, 0, 0).
    pub fn none() -> Self {
        Self::default()
    }

    /// True when the seasonal component contributes nothing.
    pub fn is_none(&self) -> bool {
        self.period == 0 || (self.p == 0 && self.d == 0 && self.q == 0)
    }
}

/// Estimated coefficients in standardized units.
#[derive(Debug, Clone, Default)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    beta: Option<f64>,
    mean: f64,
}

impl Coefficients {
    /// `phi(L) * Phi(L^s)` as a lag polynomial with leading 1.
    fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar.iter().map(|c| -c))
            .collect();
        multiply(&regular, &seasonal_polynomial(&self.seasonal_ar, period, -1.0))
    }

    /// `theta(L) * Theta(L^s)` as a lag polynomial with leading 1.
    fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0)
            .chain(self.ma.iter().copied())
            .collect();
        multiply(&regular, &seasonal_polynomial(&self.seasonal_ma, period, 1.0))
    }
}

/// `1 + sign * sum_j c_j L^(j*period)`.
fn seasonal_polynomial(coefs: &[f64], period: usize, sign: f64) -> Vec<f64> {
    if coefs.is_empty() || period == 0 {
        return vec![1.0];
    }
    let mut poly = vec![0.0; coefs.len() * period + 1];
    poly[0] = 1.0;
    for (j, c) in coefs.iter().enumerate() {
        poly[(j + 1) * period] = sign * c;
    }
    poly
}

/// Conditional residuals of an ARMA filter. Residuals before `start` are zero.
fn conditional_residuals(v: &[f64], ar_poly: &[f64], ma_poly: &[f64], start: usize) -> Vec<f64> {
    let n = v.len();
    let mut residuals = vec![0.0; n];

    for t in start..n {
        let mut pred = 0.0;
        for (k, a) in ar_poly.iter().enumerate().skip(1) {
            pred -= a * v[t - k];
        }
        for (k, b) in ma_poly.iter().enumerate().skip(1) {
            if t >= k {
                pred += b * residuals[t - k];
            }
        }
        residuals[t] = v[t] - pred;
    }

    residuals
}

/// Psi-weights of `ma(L) / ar(L)`, first `horizon` terms.
fn psi_weights(ar_poly: &[f64], ma_poly: &[f64], horizon: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(horizon);
    for j in 0..horizon {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma_poly.get(j).copied().unwrap_or(0.0);
        for k in 1..=j.min(ar_poly.len().saturating_sub(1)) {
            value -= ar_poly[k] * psi[j - k];
        }
        psi.push(value);
    }
    psi
}

/// Apply regular then seasonal differencing.
fn difference_all(series: &[f64], spec: &ARIMASpec, seasonal: &SeasonalSpec) -> Vec<f64> {
    seasonal_difference(&difference(series, spec.d), seasonal.d, seasonal.period)
}

/// Standard deviation used to standardize a series; 1 for constant series.
fn scale_of(values: &[f64]) -> f64 {
    population_std_dev(values)
        .filter(|s| s.is_finite() && *s > 1e-12)
        .unwrap_or(1.0)
}

/// Seasonal ARIMA with an optional exogenous regressor.
#[derive(Debug, Clone)]
pub struct SARIMAX {
    spec: ARIMASpec,
    seasonal: SeasonalSpec,
    max_iter: usize,
    max_duration: Option<Duration>,
    coefficients: Coefficients,
    history: Option<Vec<f64>>,
    exog_history: Option<Vec<f64>>,
    /// Standardized differenced target.
    standardized: Vec<f64>,
    /// Standardized differenced regressor.
    standardized_exog: Vec<f64>,
    scale: f64,
    exog_scale: f64,
    /// Residuals in standardized units.
    innovations: Vec<f64>,
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    iterations: usize,
    last_week: Option<IsoWeek>,
}

impl SARIMAX {
    /// Create an unfitted model.
    pub fn new(spec: ARIMASpec, seasonal: SeasonalSpec) -> Self {
        Self {
            spec,
            seasonal,
            max_iter: 5000,
            max_duration: None,
            coefficients: Coefficients::default(),
            history: None,
            exog_history: None,
            standardized: vec![],
            standardized_exog: vec![],
            scale: 1.0,
            exog_scale: 1.0,
            innovations: vec![],
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            iterations: 0,
            last_week: None,
        }
    }

    /// Limit the optimizer to `max_iter` iterations and an optional wall-clock budget.
    pub fn with_budget(mut self, max_iter: usize, max_duration: Option<Duration>) -> Self {
        self.max_iter = max_iter;
        self.max_duration = max_duration;
        self
    }

    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    pub fn seasonal_spec(&self) -> SeasonalSpec {
        self.seasonal
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    /// Exogenous coefficient on the original scale.
    pub fn exog_coefficient(&self) -> Option<f64> {
        self.coefficients
            .beta
            .map(|b| b * self.scale / self.exog_scale)
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Optimizer iterations used by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn has_mean(&self) -> bool {
        self.spec.d == 0 && (self.seasonal.is_none() || self.seasonal.d == 0)
    }

    fn effective_seasonal(&self) -> SeasonalSpec {
        if self.seasonal.is_none() {
            SeasonalSpec::none()
        } else {
            self.seasonal
        }
    }

    fn operator(&self) -> Vec<f64> {
        let seasonal = self.effective_seasonal();
        difference_operator(self.spec.d, seasonal.d, seasonal.period)
    }

    /// Number of weeks needed before a fit is attempted.
    pub fn min_history(&self) -> usize {
        let seasonal = self.effective_seasonal();
        let ar_lags = self.spec.p + seasonal.p * seasonal.period;
        self.operator().len() - 1 + ar_lags + 2
    }

    fn unpack(&self, params: &[f64], with_exog: bool) -> Coefficients {
        let seasonal = self.effective_seasonal();
        let (p, q) = (self.spec.p, self.spec.q);
        let (sp, sq) = (seasonal.p, seasonal.q);

        let mut offset = 0;
        let mut take = |count: usize| {
            let slice = params[offset..offset + count].to_vec();
            offset += count;
            slice
        };
        let ar = take(p);
        let ma = take(q);
        let seasonal_ar = take(sp);
        let seasonal_ma = take(sq);
        let beta = if with_exog { take(1).first().copied() } else { None };
        let mean = if self.has_mean() {
            take(1).first().copied().unwrap_or(0.0)
        } else {
            0.0
        };

        Coefficients {
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
            beta,
            mean,
        }
    }

    /// Regression errors in standardized units: `w - beta * z - mean`.
    fn regression_errors(&self, coefs: &Coefficients, w: &[f64], z: &[f64]) -> Vec<f64> {
        let beta = coefs.beta.unwrap_or(0.0);
        w.iter()
            .enumerate()
            .map(|(t, wt)| wt - beta * z.get(t).copied().unwrap_or(0.0) - coefs.mean)
            .collect()
    }

    fn fit_internal(&mut self, series: &WeeklySeries, exog: Option<&[f64]>) -> Result<()> {
        let values = series.values();
        let last_week = series
            .last_week()
            .ok_or(ForecastError::InsufficientHistory { needed: 1, got: 0 })?;

        if let Some(x) = exog {
            if x.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: x.len(),
                });
            }
        }

        let min_len = self.min_history();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientHistory {
                needed: min_len,
                got: values.len(),
            });
        }

        let seasonal = self.effective_seasonal();
        let w = difference_all(values, &self.spec, &seasonal);
        let scale = scale_of(&w);
        let ws: Vec<f64> = w.iter().map(|v| v / scale).collect();

        let (zs, exog_scale) = match exog {
            Some(x) => {
                let z = difference_all(x, &self.spec, &seasonal);
                let exog_scale = scale_of(&z);
                (z.iter().map(|v| v / exog_scale).collect(), exog_scale)
            }
            None => (vec![], 1.0),
        };
        let with_exog = exog.is_some();

        // Parameter layout: [ar, ma, seasonal ar, seasonal ma, beta?, mean?]
        let mut initial = Vec::new();
        let mut bounds = Vec::new();
        for i in 0..self.spec.p {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEF_BOUND, COEF_BOUND));
        }
        for i in 0..self.spec.q {
            initial.push(0.1 / (i + 1) as f64);
            bounds.push((-COEF_BOUND, COEF_BOUND));
        }
        for _ in 0..(seasonal.p + seasonal.q) {
            initial.push(0.1);
            bounds.push((-COEF_BOUND, COEF_BOUND));
        }
        let regression = if with_exog {
            ols_fit(&ws, &[zs.clone()]).ok()
        } else {
            None
        };
        if with_exog {
            let beta0 = regression
                .as_ref()
                .and_then(|r| r.coefficients.first().copied())
                .filter(|b| b.is_finite())
                .unwrap_or(0.0);
            initial.push(beta0);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        if self.has_mean() {
            let mean0 = regression
                .as_ref()
                .map(|r| r.intercept)
                .or_else(|| mean(&ws))
                .unwrap_or(0.0);
            initial.push(mean0);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }

        let period = seasonal.period;
        let start = self.coefficients_start(&seasonal);

        let (coefficients, iterations) = if initial.is_empty() {
            (Coefficients::default(), 0)
        } else {
            let config = NelderMeadConfig {
                max_iter: self.max_iter,
                max_duration: self.max_duration,
                tolerance: 1e-8,
                ..Default::default()
            };

            let result = nelder_mead(
                |params| {
                    let coefs = self.unpack(params, with_exog);
                    let v = self.regression_errors(&coefs, &ws, &zs);
                    let e = conditional_residuals(
                        &v,
                        &coefs.ar_polynomial(period),
                        &coefs.ma_polynomial(period),
                        start,
                    );
                    let css: f64 = e[start..].iter().map(|r| r * r).sum();
                    if css.is_finite() {
                        css
                    } else {
                        f64::MAX
                    }
                },
                &initial,
                Some(&bounds),
                config,
            );

            if !result.converged() {
                debug!(
                    iterations = result.iterations,
                    timed_out = result.timed_out(),
                    "sarimax optimizer stopped without converging"
                );
                return Err(ForecastError::FitNonConvergence {
                    iterations: result.iterations,
                });
            }

            (self.unpack(&result.point, with_exog), result.iterations)
        };

        let v = self.regression_errors(&coefficients, &ws, &zs);
        let innovations = conditional_residuals(
            &v,
            &coefficients.ar_polynomial(period),
            &coefficients.ma_polynomial(period),
            start,
        );

        let effective = &innovations[start..];
        let n_eff = effective.len() as f64;
        let variance_std = effective.iter().map(|r| r * r).sum::<f64>() / n_eff;
        let variance = variance_std * scale * scale;
        if !variance.is_finite() {
            return Err(ForecastError::NonFiniteForecast);
        }

        let k = initial.len() as f64;
        let aic = if variance > 0.0 {
            let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
            Some(-2.0 * ll + 2.0 * k)
        } else {
            None
        };

        let residuals: Vec<f64> = innovations.iter().map(|e| e * scale).collect();
        let fitted_diff: Vec<f64> = w
            .iter()
            .zip(residuals.iter())
            .map(|(wt, et)| wt - et)
            .collect();

        debug!(
            model = self.name(),
            n = values.len(),
            iterations,
            exog = with_exog,
            sigma2 = variance,
            "sarimax fitted"
        );

        self.coefficients = coefficients;
        self.history = Some(values.to_vec());
        self.exog_history = exog.map(<[f64]>::to_vec);
        self.standardized = ws;
        self.standardized_exog = zs;
        self.scale = scale;
        self.exog_scale = exog_scale;
        self.innovations = innovations;
        self.fitted_diff = Some(fitted_diff);
        self.residuals = Some(residuals);
        self.residual_variance = Some(variance);
        self.aic = aic;
        self.iterations = iterations;
        self.last_week = Some(last_week);
        Ok(())
    }

    /// First index with a fully conditioned residual.
    fn coefficients_start(&self, seasonal: &SeasonalSpec) -> usize {
        self.spec.p + seasonal.p * seasonal.period
    }

    fn predict_internal(
        &self,
        horizon: usize,
        level: f64,
        future_exog: Option<&[f64]>,
    ) -> Result<Forecast> {
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;
        let last_week = self.last_week.ok_or(ForecastError::FitRequired)?;
        let variance = self.residual_variance.ok_or(ForecastError::FitRequired)?;

        let seasonal = self.effective_seasonal();
        let period = seasonal.period;
        let coefs = &self.coefficients;

        // Differenced, standardized future regressor.
        let future_z: Vec<f64> = match (&self.exog_history, future_exog) {
            (Some(past), Some(future)) => {
                if future.len() != horizon {
                    return Err(ForecastError::DimensionMismatch {
                        expected: horizon,
                        got: future.len(),
                    });
                }
                let combined: Vec<f64> = past.iter().chain(future.iter()).copied().collect();
                let z = difference_all(&combined, &self.spec, &seasonal);
                z[z.len() - horizon..]
                    .iter()
                    .map(|v| v / self.exog_scale)
                    .collect()
            }
            (Some(_), None) => {
                return Err(ForecastError::InvalidParameter(
                    "model was fit with an exogenous regressor; future values are required"
                        .into(),
                ))
            }
            (None, Some(_)) => {
                return Err(ForecastError::InvalidParameter(
                    "model was fit without an exogenous regressor".into(),
                ))
            }
            (None, None) => vec![],
        };

        let ar_poly = coefs.ar_polynomial(period);
        let ma_poly = coefs.ma_polynomial(period);

        let mut v = self.regression_errors(coefs, &self.standardized, &self.standardized_exog);
        let mut e = self.innovations.clone();
        let beta = coefs.beta.unwrap_or(0.0);

        let mut w_future = Vec::with_capacity(horizon);
        for h in 0..horizon {
            let t = v.len();
            let mut pred = 0.0;
            for (k, a) in ar_poly.iter().enumerate().skip(1) {
                if t >= k {
                    pred -= a * v[t - k];
                }
            }
            for (k, b) in ma_poly.iter().enumerate().skip(1) {
                if t >= k {
                    pred += b * e[t - k];
                }
            }
            v.push(pred);
            e.push(0.0);

            let z = future_z.get(h).copied().unwrap_or(0.0);
            w_future.push((pred + beta * z + coefs.mean) * self.scale);
        }

        let operator = self.operator();
        let values = integrate(&w_future, history, &operator);

        // Forecast error variance from psi-weights of the integrated model.
        let integrated_ar = multiply(&ar_poly, &operator);
        let psi = psi_weights(&integrated_ar, &ma_poly, horizon);
        let z = interval_z(level);

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, value) in values.iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let se = (variance * cumulative).sqrt();
            lower.push(value - z * se);
            upper.push(value + z * se);
        }

        let weeks = last_week.following(horizon);
        let fit = FitInfo {
            order: Some([self.spec.p, self.spec.d, self.spec.q]),
            seasonal_order: (!seasonal.is_none())
                .then_some([seasonal.p, seasonal.d, seasonal.q, seasonal.period]),
            aic: self.aic,
            iterations: self.iterations,
        };

        Ok(
            Forecast::from_columns(&weeks, &values, &lower, &upper, self.method(), self.name())?
                .with_metadata(|meta| meta.fit = Some(fit)),
        )
    }
}

impl Default for SARIMAX {
    fn default() -> Self {
        Self::new(ARIMASpec::default(), SeasonalSpec::none())
    }
}

impl Forecaster for SARIMAX {
    fn fit(&mut self, series: &WeeklySeries) -> Result<()> {
        self.fit_internal(series, None)
    }

    fn fit_with_exog(&mut self, series: &WeeklySeries, exog: &[f64]) -> Result<()> {
        self.fit_internal(series, Some(exog))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.predict_internal(horizon, level, None)
    }

    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        level: f64,
        future_exog: &[f64],
    ) -> Result<Forecast> {
        self.predict_internal(horizon, level, Some(future_exog))
    }

    fn supports_exog(&self) -> bool {
        true
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        if self.seasonal.is_none() {
            "ARIMAX"
        } else {
            "SARIMAX"
        }
    }

    fn method(&self) -> ForecastMethod {
        ForecastMethod::Sarimax
    }
}
