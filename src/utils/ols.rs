//! Least-squares regression on ordered regressor columns.
//!
//! SARIMAX uses it to seed the promo coefficient; the Prophet-style model
//! fits its trend and Fourier terms with it, ridge-penalized per column.

use crate::error::{ForecastError, Result};

/// `y = intercept + sum(coefficients[i] * column[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearFit {
    pub fn predict(&self, columns: &[Vec<f64>]) -> Result<Vec<f64>> {
        let rows = check_columns(columns, self.coefficients.len())?;
        Ok((0..rows)
            .map(|t| {
                self.intercept
                    + self
                        .coefficients
                        .iter()
                        .zip(columns)
                        .map(|(b, x)| b * x[t])
                        .sum::<f64>()
            })
            .collect())
    }

    pub fn residuals(&self, y: &[f64], columns: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fitted = self.predict(columns)?;
        if fitted.len() != y.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: y.len(),
                got: fitted.len(),
            });
        }
        Ok(y.iter().zip(fitted).map(|(a, f)| a - f).collect())
    }
}

/// Number of rows shared by all columns; errors on a ragged or miscounted set.
fn check_columns(columns: &[Vec<f64>], expected: usize) -> Result<usize> {
    if columns.len() != expected {
        return Err(ForecastError::DimensionMismatch {
            expected,
            got: columns.len(),
        });
    }
    let rows = columns.first().map_or(0, Vec::len);
    match columns.iter().find(|c| c.len() != rows) {
        Some(ragged) => Err(ForecastError::DimensionMismatch {
            expected: rows,
            got: ragged.len(),
        }),
        None => Ok(rows),
    }
}

/// Plain least squares.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<LinearFit> {
    ridge_fit(y, columns, 0.0)
}

pub fn ridge_fit(y: &[f64], columns: &[Vec<f64>], lambda: f64) -> Result<LinearFit> {
    ridge_fit_with_penalties(y, columns, &vec![lambda; columns.len()])
}

/// Ridge regression with one L2 penalty per column. The intercept is never
/// penalized.
pub fn ridge_fit_with_penalties(
    y: &[f64],
    columns: &[Vec<f64>],
    penalties: &[f64],
) -> Result<LinearFit> {
    if y.is_empty() {
        return Err(ForecastError::InsufficientHistory { needed: 1, got: 0 });
    }
    if penalties.len() != columns.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: columns.len(),
            got: penalties.len(),
        });
    }
    if let Some(bad) = penalties.iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
        return Err(ForecastError::InvalidParameter(format!(
            "ridge penalty must be finite and non-negative, got {bad}"
        )));
    }
    if columns.is_empty() {
        return Ok(LinearFit {
            intercept: y.iter().sum::<f64>() / y.len() as f64,
            coefficients: vec![],
        });
    }
    if let Some(ragged) = columns.iter().find(|c| c.len() != y.len()) {
        return Err(ForecastError::DimensionMismatch {
            expected: y.len(),
            got: ragged.len(),
        });
    }

    // Normal equations over the design [1, x_1, .., x_k].
    let k = columns.len() + 1;
    let regressor = |j: usize, t: usize| if j == 0 { 1.0 } else { columns[j - 1][t] };
    let mut gram = vec![vec![0.0; k]; k];
    let mut moment = vec![0.0; k];
    for (t, yt) in y.iter().enumerate() {
        for i in 0..k {
            let xi = regressor(i, t);
            moment[i] += xi * yt;
            for j in 0..=i {
                gram[i][j] += xi * regressor(j, t);
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            gram[j][i] = gram[i][j];
        }
        gram[i][i] += 1e-8 + if i > 0 { penalties[i - 1] } else { 0.0 };
    }

    let beta = Cholesky::factor(&gram)
        .map(|c| c.solve(&moment))
        .ok_or_else(|| {
            ForecastError::InvalidParameter("normal equations are not positive definite".into())
        })?;

    Ok(LinearFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Lower-triangular factor `L` with `A = L L'`.
struct Cholesky {
    lower: Vec<Vec<f64>>,
}

impl Cholesky {
    fn factor(a: &[Vec<f64>]) -> Option<Self> {
        let n = a.len();
        let mut lower = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..=i {
                let dot: f64 = (0..j).map(|m| lower[i][m] * lower[j][m]).sum();
                let rest = a[i][j] - dot;
                lower[i][j] = if i == j {
                    if !(rest.is_finite() && rest > 0.0) {
                        return None;
                    }
                    rest.sqrt()
                } else {
                    rest / lower[j][j]
                };
            }
        }
        Some(Self { lower })
    }

    fn solve(&self, b: &[f64]) -> Vec<f64> {
        let l = &self.lower;
        let n = b.len();
        let mut z = vec![0.0; n];
        for i in 0..n {
            let dot: f64 = (0..i).map(|j| l[i][j] * z[j]).sum();
            z[i] = (b[i] - dot) / l[i][i];
        }
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let dot: f64 = (i + 1..n).map(|j| l[j][i] * x[j]).sum();
            x[i] = (z[i] - dot) / l[i][i];
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_line() {
        let fit = ols_fit(&[5.0, 8.0, 11.0, 14.0, 17.0], &[vec![1.0, 2.0, 3.0, 4.0, 5.0]]).unwrap();
        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-6);

        let ahead = fit.predict(&[vec![6.0, 8.0]]).unwrap();
        assert_relative_eq!(ahead[0], 20.0, epsilon = 1e-6);
        assert_relative_eq!(ahead[1], 26.0, epsilon = 1e-6);
    }

    #[test]
    fn coefficients_follow_column_order() {
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let x2 = vec![0.5, 2.5, 1.0, 3.0, 1.5, 3.5, 2.0, 4.0];
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.0 + 2.0 * a + 3.0 * b).collect();

        let fit = ols_fit(&y, &[x1, x2]).unwrap();
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-4);
        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(fit.coefficients[1], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn no_columns_is_the_mean() {
        let fit = ols_fit(&[2.0, 4.0, 6.0, 8.0, 10.0], &[]).unwrap();
        assert_relative_eq!(fit.intercept, 6.0);
        assert!(fit.coefficients.is_empty());
    }

    #[test]
    fn residuals_of_ols_sum_to_zero() {
        let y = [5.1, 7.9, 11.2, 13.8, 17.0];
        let columns = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]];
        let residuals = ols_fit(&y, &columns).unwrap().residuals(&y, &columns).unwrap();
        assert!(residuals.iter().sum::<f64>().abs() < 1e-6);
    }

    #[test]
    fn shape_errors() {
        assert!(matches!(
            ols_fit(&[1.0, 2.0, 3.0], &[vec![1.0, 2.0]]),
            Err(ForecastError::DimensionMismatch { expected: 3, got: 2 })
        ));
        let fit = ols_fit(&[5.0, 8.0, 11.0], &[vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(fit.predict(&[]).is_err());
        assert!(fit.predict(&[vec![1.0], vec![2.0]]).is_err());
        assert!(ridge_fit_with_penalties(&[1.0, 2.0], &[], &[1.0]).is_err());
        assert!(ridge_fit(&[1.0, 2.0], &[vec![1.0, 2.0]], -1.0).is_err());
    }

    #[test]
    fn ridge_shrinks_slope_only() {
        let x = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        let y: Vec<f64> = x.iter().map(|v| 10.0 + 4.0 * v).collect();

        let ridge = ridge_fit(&y, &[x.clone()], 10.0).unwrap();
        assert!(ridge.coefficients[0] < 4.0);
        assert_relative_eq!(ridge.intercept, 10.0, epsilon = 1e-6);

        let unpenalized = ridge_fit_with_penalties(&y, &[x], &[0.0]).unwrap();
        assert_relative_eq!(unpenalized.coefficients[0], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn ridge_handles_collinear_columns() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let fit = ridge_fit(&[2.0, 4.0, 6.0, 8.0], &[x.clone(), x], 1e-3).unwrap();
        let ahead = fit.predict(&[vec![5.0], vec![5.0]]).unwrap();
        assert_relative_eq!(ahead[0], 10.0, epsilon = 1e-2);
    }
}
