//! Differencing and its inverse, expressed through lag polynomials.

/// Apply `(1 - L^lag)` to `series` `order` times. Stops early once the
/// series is no longer than `lag`.
pub fn lag_difference(series: &[f64], lag: usize, order: usize) -> Vec<f64> {
    let mut out = series.to_vec();
    if lag == 0 {
        return out;
    }
    for _ in 0..order {
        if out.len() <= lag {
            break;
        }
        out = out[lag..].iter().zip(&out).map(|(now, then)| now - then).collect();
    }
    out
}

pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    lag_difference(series, 1, d)
}

pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    lag_difference(series, period, d)
}

/// Product of two lag polynomials; index `k` is the coefficient of `L^k`.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    (0..a.len() + b.len() - 1)
        .map(|k| {
            a.iter()
                .enumerate()
                .filter(|(i, _)| *i <= k && k - i < b.len())
                .map(|(i, x)| x * b[k - i])
                .sum()
        })
        .collect()
}

/// `(1 - L)^d (1 - L^period)^seasonal_d`, leading coefficient 1.
pub fn difference_operator(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut seasonal = vec![0.0; period + 1];
    seasonal[0] = 1.0;
    seasonal[period] -= 1.0;

    let regular = std::iter::repeat([1.0, -1.0].as_slice()).take(d);
    let seasonal = std::iter::repeat(seasonal.as_slice()).take(if period > 0 { seasonal_d } else { 0 });
    regular
        .chain(seasonal)
        .fold(vec![1.0], |acc, factor| multiply(&acc, factor))
}

/// Undo `operator` for values forecast on the differenced scale.
///
/// Solves `operator(L) y_t = w_t` forward from the end of `history`, which
/// must hold at least `operator.len() - 1` values.
pub fn integrate(differenced: &[f64], history: &[f64], operator: &[f64]) -> Vec<f64> {
    if operator.len() <= 1 {
        return differenced.to_vec();
    }
    let mut levels = history.to_vec();
    for w in differenced {
        let t = levels.len();
        let carried: f64 = operator[1..]
            .iter()
            .zip(1..)
            .filter(|(_, k)| *k <= t)
            .map(|(c, k)| c * levels[t - k])
            .sum();
        levels.push(w - carried);
    }
    levels.split_off(history.len())
}
