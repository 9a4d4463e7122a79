//! Small descriptive statistics and the normal critical values used for
//! prediction bands.

/// Rational approximation coefficients (Abramowitz and Stegun 26.2.23).
const NUMERATOR: [f64; 3] = [2.515517, 0.802853, 0.010328];
const DENOMINATOR: [f64; 3] = [1.432788, 0.189269, 0.001308];

/// Standard normal quantile, accurate to about 4.5e-4.
///
/// ```
/// use marketplace_forecast::utils::quantile_normal;
///
/// let z = quantile_normal(0.925);
/// assert!((z - 1.44).abs() < 0.01);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = p.min(1.0 - p);
    let t = (-2.0 * tail.ln()).sqrt();
    let [c0, c1, c2] = NUMERATOR;
    let [d1, d2, d3] = DENOMINATOR;
    let z = t - (c0 + t * (c1 + t * c2)) / (1.0 + t * (d1 + t * (d2 + t * d3)));

    if p < 0.5 {
        -z
    } else {
        z
    }
}

/// Two-sided critical value for a band at `level`, e.g. 0.85.
pub fn interval_z(level: f64) -> f64 {
    quantile_normal(0.5 + level / 2.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn sum_sq_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|x| (x - m).powi(2)).sum())
}

/// Sample standard deviation; `None` below two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    sum_sq_dev(values).map(|ss| (ss / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation; `None` when empty.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    sum_sq_dev(values).map(|ss| (ss / values.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_quantiles() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 0.01);
        assert_relative_eq!(quantile_normal(0.975), 1.96, epsilon = 0.01);
        assert_relative_eq!(quantile_normal(0.025), -1.96, epsilon = 0.01);
        assert_eq!(quantile_normal(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile_normal(1.0), f64::INFINITY);
    }

    #[test]
    fn band_critical_values() {
        assert_relative_eq!(interval_z(0.95), 1.96, epsilon = 0.01);
        assert_relative_eq!(interval_z(0.85), 1.4395, epsilon = 0.005);
    }

    #[test]
    fn spread() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mean(&[]), None);
        assert_relative_eq!(mean(&v).unwrap(), 3.0);
        assert_eq!(std_dev(&[4.0]), None);
        assert_relative_eq!(std_dev(&v).unwrap(), 2.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(population_std_dev(&v).unwrap(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }
}
