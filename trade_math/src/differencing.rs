//! Regular and seasonal differencing
//!
//! The combined operator `(1 - B)^d (1 - B^s)^D` is represented by its
//! polynomial coefficients `[1, δ1, δ2, ...]` in the backshift operator `B`.

use crate::{MathError, Result};

/// Coefficients of `(1 - B)^d (1 - B^s)^D`
pub fn difference_polynomial(d: usize, seasonal_d: usize, period: usize) -> Result<Vec<f64>> {
    if seasonal_d > 0 && period == 0 {
        return Err(MathError::InvalidInput(
            "Seasonal differencing needs a positive period".to_string(),
        ));
    }

    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    for _ in 0..seasonal_d {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        poly = multiply(&poly, &seasonal);
    }
    Ok(poly)
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Apply the operator; the result is `poly.len() - 1` values shorter
pub fn difference(series: &[f64], poly: &[f64]) -> Result<Vec<f64>> {
    let order = poly.len().saturating_sub(1);
    if series.len() <= order {
        return Err(MathError::InsufficientData(format!(
            "Differencing of order {} needs more than {} observations, have {}",
            order,
            order,
            series.len()
        )));
    }

    Ok((order..series.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(k, c)| c * series[t - k])
                .sum()
        })
        .collect())
}

/// Rebuild levels from differenced forecasts that continue `history`
pub fn integrate(history: &[f64], differenced: &[f64], poly: &[f64]) -> Result<Vec<f64>> {
    let order = poly.len().saturating_sub(1);
    if history.len() < order {
        return Err(MathError::InsufficientData(format!(
            "Integration of order {} needs {} trailing observations, have {}",
            order,
            order,
            history.len()
        )));
    }

    let mut levels: Vec<f64> = history[history.len() - order..].to_vec();
    for &w in differenced {
        let t = levels.len();
        let carried: f64 = (1..=order).map(|k| poly[k] * levels[t - k]).sum();
        levels.push(w - carried);
    }
    Ok(levels.split_off(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polynomial_shapes() {
        assert_eq!(difference_polynomial(0, 0, 12).unwrap(), vec![1.0]);
        assert_eq!(difference_polynomial(1, 0, 12).unwrap(), vec![1.0, -1.0]);
        assert_eq!(difference_polynomial(2, 0, 12).unwrap(), vec![1.0, -2.0, 1.0]);

        let seasonal = difference_polynomial(1, 1, 4).unwrap();
        assert_eq!(seasonal, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
    }

    #[test]
    fn test_difference_then_integrate() {
        let series: Vec<f64> = (0..30).map(|t| (t as f64 * 0.7).sin() * 10.0 + t as f64).collect();
        let poly = difference_polynomial(1, 1, 6).unwrap();
        let diffed = difference(&series, &poly).unwrap();
        assert_eq!(diffed.len(), series.len() - 7);

        // Feeding the true differences back must recover the tail of the series
        let split = 20;
        let tail_diffs = &diffed[split - 7..];
        let rebuilt = integrate(&series[..split], tail_diffs, &poly).unwrap();
        for (a, b) in rebuilt.iter().zip(&series[split..]) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_insufficient_history() {
        let poly = difference_polynomial(0, 1, 12).unwrap();
        assert!(difference(&[1.0; 12], &poly).is_err());
        assert!(integrate(&[1.0; 5], &[0.0], &poly).is_err());
    }
}
