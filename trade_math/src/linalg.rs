//! Dense linear algebra for small systems
//!
//! The systems solved here are at most a few hundred unknowns (kernel
//! matrices over window rows, regression designs over lag columns), so
//! Gaussian elimination over `ndarray` matrices is sufficient.

use crate::{MathError, Result};
use ndarray::{s, Array1, Array2, Axis};

const PIVOT_EPSILON: f64 = 1e-12;

/// Stack equal-length rows into a matrix
pub fn rows_to_matrix(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    if rows.iter().any(|r| r.len() != width) {
        return Err(MathError::InvalidInput(
            "Rows must share one width".to_string(),
        ));
    }
    let mut m = Array2::<f64>::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        m.row_mut(i).assign(&Array1::from(row.clone()));
    }
    Ok(m)
}

/// Split a matrix back into owned rows
pub fn matrix_to_rows(m: &Array2<f64>) -> Vec<Vec<f64>> {
    m.outer_iter().map(|row| row.to_vec()).collect()
}

/// Solve `A X = B` for a square `A` and a right-hand side with several columns
pub fn solve_multi(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::InsufficientData("Empty system".to_string()));
    }
    if a.ncols() != n {
        return Err(MathError::InvalidInput("Matrix must be square".to_string()));
    }
    if b.nrows() != n {
        return Err(MathError::InvalidInput(format!(
            "Right-hand side has {} rows, expected {}",
            b.nrows(),
            n
        )));
    }

    let mut m = a.to_owned();
    let mut rhs = b.to_owned();

    for col in 0..n {
        // Partial pivoting
        let pivot = (col..n)
            .max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))
            .unwrap_or(col);
        if !m[[pivot, col]].is_finite() || m[[pivot, col]].abs() < PIVOT_EPSILON {
            return Err(MathError::SingularMatrix(format!(
                "No usable pivot in column {}",
                col
            )));
        }
        if pivot != col {
            swap_rows(&mut m, col, pivot);
            swap_rows(&mut rhs, col, pivot);
        }

        let pivot_row = m.row(col).to_owned();
        let pivot_rhs = rhs.row(col).to_owned();
        for row in col + 1..n {
            let factor = m[[row, col]] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            m.row_mut(row).scaled_add(-factor, &pivot_row);
            rhs.row_mut(row).scaled_add(-factor, &pivot_rhs);
        }
    }

    let mut x = Array2::<f64>::zeros(rhs.raw_dim());
    for row in (0..n).rev() {
        let tail = m.slice(s![row, row + 1..]).dot(&x.slice(s![row + 1.., ..]));
        let solved = (&rhs.row(row) - &tail) / m[[row, row]];
        x.row_mut(row).assign(&solved);
    }

    Ok(x)
}

fn swap_rows(m: &mut Array2<f64>, a: usize, b: usize) {
    let first = m.row(a).to_owned();
    let second = m.row(b).to_owned();
    m.row_mut(a).assign(&second);
    m.row_mut(b).assign(&first);
}

/// Solve `A x = b` for a single right-hand side
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let rhs = b.view().insert_axis(Axis(1));
    Ok(solve_multi(a, &rhs.to_owned())?.column(0).to_owned())
}

/// Least squares via ridge-stabilised normal equations
/// `(XᵀX + λI) β = Xᵀy`, one coefficient per design column.
pub fn least_squares(design: &Array2<f64>, target: &Array1<f64>, ridge: f64) -> Result<Array1<f64>> {
    if design.nrows() == 0 || design.nrows() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {}",
            design.nrows(),
            target.len()
        )));
    }
    let cols = design.ncols();
    if cols == 0 {
        return Err(MathError::InvalidInput("Design has no columns".to_string()));
    }
    if design.nrows() < cols {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations for {} coefficients, have {}",
            cols,
            cols,
            design.nrows()
        )));
    }

    let xt = design.t();
    let xtx = xt.dot(design) + Array2::<f64>::eye(cols) * ridge;
    let xty = xt.dot(target);
    solve(&xtx, &xty)
}

/// Largest absolute eigenvalue estimate by power iteration
pub fn spectral_radius(m: &Array2<f64>, iterations: usize) -> f64 {
    let n = m.nrows();
    if n == 0 {
        return 0.0;
    }
    let mut v = Array1::from_elem(n, 1.0 / (n as f64).sqrt());
    let mut radius = 0.0;
    for _ in 0..iterations {
        let next = m.dot(&v);
        let norm = next.dot(&next).sqrt();
        if norm < PIVOT_EPSILON {
            return 0.0;
        }
        radius = norm;
        v = next / norm;
    }
    radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_two_by_two() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let x = solve(&a, &array![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let x = solve(&a, &array![2.0, 7.0]).unwrap();
        assert_eq!(x, array![7.0, 2.0]);
    }

    #[test]
    fn test_solve_several_right_hand_sides() {
        let a = array![[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let b = array![[1.0, 0.0], [2.0, 1.0], [3.0, 5.0]];
        let x = solve_multi(&a, &b).unwrap();
        let residual = a.dot(&x) - &b;
        assert!(residual.iter().all(|r| r.abs() < 1e-10));
    }

    #[test]
    fn test_singular_matrix() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(matches!(
            solve(&a, &array![1.0, 2.0]),
            Err(MathError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_least_squares_recovers_line() {
        let rows: Vec<Vec<f64>> = (0..10).map(|x| vec![1.0, x as f64]).collect();
        let design = rows_to_matrix(&rows).unwrap();
        let target: Array1<f64> = (0..10).map(|x| 3.0 + 2.0 * x as f64).collect();
        let coef = least_squares(&design, &target, 0.0).unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-8);
        assert!((coef[1] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(rows_to_matrix(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        let m = rows_to_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(matrix_to_rows(&m), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_spectral_radius_diagonal() {
        let m = array![[0.5, 0.0], [0.0, -2.0]];
        assert!((spectral_radius(&m, 100) - 2.0).abs() < 1e-6);
    }
}
