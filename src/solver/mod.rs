//! Interchangeable linear-algebra backends.
//!
//! `PortableSolver` is always available. `AcceleratedSolver` delegates to
//! nalgebra and is compiled with the `accelerated` feature; `select` probes it
//! at startup and falls back to the portable solver.
#[cfg(feature = "accelerated")]
pub mod accelerated;
pub mod lu;
pub mod select;

#[cfg(feature = "accelerated")]
pub use accelerated::AcceleratedSolver;
pub use lu::{LuDecomposition, PortableSolver};
pub use select::{create_solver, SolverKind};

use crate::error::{LcaError, Result};
use crate::matrix::{DenseMatrix, Matrix};
use std::fmt::Debug;

pub trait MatrixSolver: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Solves `A * x = b`.
    fn solve_vec(&self, a: &dyn Matrix, b: &[f64]) -> Result<Vec<f64>>;

    /// Calculates the inverse of `A`.
    fn invert(&self, a: &dyn Matrix) -> Result<DenseMatrix>;

    /// Solves `A * x = demand * e_idx`.
    fn solve(&self, a: &dyn Matrix, idx: usize, demand: f64) -> Result<Vec<f64>> {
        if idx >= a.rows() {
            return Err(LcaError::mismatch(format!(
                "demand index {} outside of a {}x{} matrix",
                idx,
                a.rows(),
                a.columns()
            )));
        }
        let mut b = vec![0.0; a.rows()];
        b[idx] = demand;
        self.solve_vec(a, &b)
    }

    /// `A * B`
    fn multiply(&self, a: &dyn Matrix, b: &dyn Matrix) -> Result<DenseMatrix> {
        a.to_dense().multiply(&b.to_dense())
    }

    /// `A * v`
    fn multiply_vec(&self, a: &dyn Matrix, v: &[f64]) -> Result<Vec<f64>> {
        a.multiply_vec(v)
    }

    /// `A * diag(s)`
    fn scale_columns(&self, a: &dyn Matrix, s: &[f64]) -> Result<DenseMatrix> {
        if s.len() != a.columns() {
            return Err(LcaError::mismatch(format!(
                "cannot scale {} columns with {} factors",
                a.columns(),
                s.len()
            )));
        }
        let mut result = DenseMatrix::zeros(a.rows(), a.columns());
        a.for_each_nonzero(&mut |r, c, v| result.set(r, c, v * s[c]));
        Ok(result)
    }
}

/// Per-column pivot bounds: a pivot at or below the bound of its column makes
/// the matrix singular. Columns are measured on their own scale, as every
/// column of a technology matrix carries the units of its process.
pub(crate) fn singularity_bounds(a: &dyn Matrix) -> Vec<f64> {
    let n = a.rows().max(1) as f64;
    let mut scale = vec![0.0f64; a.columns()];
    a.for_each_nonzero(&mut |_, c, v| scale[c] = scale[c].max(v.abs()));
    scale.into_iter().map(|s| n * f64::EPSILON * s).collect()
}

pub(crate) fn ensure_square(a: &dyn Matrix) -> Result<usize> {
    if a.rows() != a.columns() {
        return Err(LcaError::mismatch(format!(
            "expected a square matrix but got {}x{}",
            a.rows(),
            a.columns()
        )));
    }
    Ok(a.rows())
}

/// Rejects results with non-finite values.
pub(crate) fn ensure_finite(values: &[f64], rows: usize, cols: usize) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LcaError::SingularMatrix { rows, cols })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;

    /// All backends compiled into this build.
    pub(crate) fn backends() -> Vec<Arc<dyn MatrixSolver>> {
        let mut solvers: Vec<Arc<dyn MatrixSolver>> = vec![Arc::new(PortableSolver)];
        #[cfg(feature = "accelerated")]
        solvers.push(Arc::new(AcceleratedSolver));
        solvers
    }

    pub(crate) fn portable() -> Arc<dyn MatrixSolver> {
        Arc::new(PortableSolver)
    }

    pub(crate) fn accelerated() -> Arc<dyn MatrixSolver> {
        #[cfg(feature = "accelerated")]
        return Arc::new(AcceleratedSolver);
        #[cfg(not(feature = "accelerated"))]
        return Arc::new(PortableSolver);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_simple_solve(#[case] solver: Arc<dyn MatrixSolver>) {
        let a = DenseMatrix::from_rows(&[vec![1.0, 0.0], vec![-5.0, 4.0]]).unwrap();
        let x = solver.solve(&a, 0, 1.0).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-14);
        assert!((x[1] - 1.25).abs() < 1e-14);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_simple_multiplication(#[case] solver: Arc<dyn MatrixSolver>) {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let b = DenseMatrix::from_rows(&[vec![7.0, 10.0], vec![8.0, 11.0], vec![9.0, 12.0]]).unwrap();
        let c = solver.multiply(&a, &b).unwrap();
        assert_eq!(c.column(0), vec![50.0, 122.0]);
        assert_eq!(c.column(1), vec![68.0, 167.0]);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_multiply_dimension_mismatch(#[case] solver: Arc<dyn MatrixSolver>) {
        let a = DenseMatrix::zeros(2, 3);
        let b = DenseMatrix::zeros(2, 2);
        assert!(matches!(solver.multiply(&a, &b), Err(LcaError::DimensionMismatch { .. })));
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_singular_matrix_is_rejected(#[case] solver: Arc<dyn MatrixSolver>) {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(matches!(solver.solve(&a, 0, 1.0), Err(LcaError::SingularMatrix { .. })));
        assert!(matches!(solver.invert(&a), Err(LcaError::SingularMatrix { .. })));
        let zero = DenseMatrix::zeros(3, 3);
        assert!(matches!(solver.invert(&zero), Err(LcaError::SingularMatrix { .. })));
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_columns_of_different_scale_are_regular(#[case] solver: Arc<dyn MatrixSolver>) {
        let a = DenseMatrix::from_rows(&[vec![1e6, 0.0], vec![-1e-11, 1e-10]]).unwrap();
        let x = solver.solve(&a, 0, 1e6).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 0.1).abs() < 1e-12);
        let inv = solver.invert(&a).unwrap();
        assert!((inv.get(1, 1) - 1e10).abs() / 1e10 < 1e-12);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_inverse_times_matrix_is_identity(#[case] solver: Arc<dyn MatrixSolver>) {
        let a = DenseMatrix::from_rows(&[
            vec![1.0, -0.2, 0.0],
            vec![-0.5, 1.0, -0.1],
            vec![0.0, -0.3, 2.0],
        ])
        .unwrap();
        let inv = solver.invert(&a).unwrap();
        let id = solver.multiply(&a, &inv).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((id.get(r, c) - expected).abs() < 1e-12);
            }
        }
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_sparse_input_is_accepted(#[case] solver: Arc<dyn MatrixSolver>) {
        let mut m = crate::matrix::HashPointMatrix::new(2, 2);
        m.add(0, 0, 2.0);
        m.add(1, 0, -1.0);
        m.add(1, 1, 1.0);
        let csc = m.compress();
        let x = solver.solve(&csc, 0, 4.0).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-14);
        assert!((x[1] - 2.0).abs() < 1e-14);
    }

    #[test]
    fn test_backends_agree_on_well_conditioned_system() {
        let n = 40;
        let mut a = DenseMatrix::identity(n);
        for i in 0..n {
            for j in 0..n {
                if i != j && (i * 7 + j * 3) % 5 == 0 {
                    a.set(i, j, -0.01 * ((i + j) % 7) as f64);
                }
            }
            a.set(i, i, 1.0 + (i % 3) as f64);
        }
        let solutions: Vec<Vec<f64>> = backends().iter().map(|s| s.solve(&a, 0, 2.0).unwrap()).collect();
        for other in &solutions[1..] {
            for (x, y) in solutions[0].iter().zip(other) {
                let scale = x.abs().max(y.abs()).max(1e-300);
                assert!((x - y).abs() / scale < 1e-10 || (x - y).abs() < 1e-15);
            }
        }
    }
}
