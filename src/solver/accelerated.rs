//! Backend delegating to nalgebra's LU and BLAS-like kernels.
use super::{ensure_finite, ensure_square, singularity_bounds, MatrixSolver};
use crate::error::{LcaError, Result};
use crate::matrix::{DenseMatrix, Matrix};
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceleratedSolver;

fn to_nalgebra(a: &dyn Matrix) -> DMatrix<f64> {
    let dense = a.to_dense();
    DMatrix::from_row_slice(dense.rows(), dense.columns(), dense.data())
}

fn from_nalgebra(m: &DMatrix<f64>) -> Result<DenseMatrix> {
    // nalgebra stores column-major
    let data: Vec<f64> = m.transpose().as_slice().to_vec();
    DenseMatrix::from_row_major(m.nrows(), m.ncols(), data)
}

fn factorize(a: &dyn Matrix) -> Result<nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>> {
    let n = ensure_square(a)?;
    let bounds = singularity_bounds(a);
    let lu = to_nalgebra(a).lu();
    let singular = lu.u().diagonal().iter().zip(&bounds).any(|(d, bound)| d.abs() <= *bound || !d.is_finite());
    if singular {
        return Err(LcaError::SingularMatrix { rows: n, cols: n });
    }
    Ok(lu)
}

impl MatrixSolver for AcceleratedSolver {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn solve_vec(&self, a: &dyn Matrix, b: &[f64]) -> Result<Vec<f64>> {
        let n = a.rows();
        if b.len() != n {
            return Err(LcaError::mismatch(format!(
                "right-hand side of length {} for a {}x{} system",
                b.len(),
                n,
                a.columns()
            )));
        }
        let lu = factorize(a)?;
        let x = lu
            .solve(&DVector::from_column_slice(b))
            .ok_or(LcaError::SingularMatrix { rows: n, cols: n })?;
        let x: Vec<f64> = x.iter().copied().collect();
        ensure_finite(&x, n, n)?;
        Ok(x)
    }

    fn invert(&self, a: &dyn Matrix) -> Result<DenseMatrix> {
        let n = a.rows();
        let inverse = factorize(a)?
            .try_inverse()
            .ok_or(LcaError::SingularMatrix { rows: n, cols: n })?;
        ensure_finite(inverse.as_slice(), n, n)?;
        from_nalgebra(&inverse)
    }

    fn multiply(&self, a: &dyn Matrix, b: &dyn Matrix) -> Result<DenseMatrix> {
        if a.columns() != b.rows() {
            return Err(LcaError::mismatch(format!(
                "cannot multiply a {}x{} with a {}x{} matrix",
                a.rows(),
                a.columns(),
                b.rows(),
                b.columns()
            )));
        }
        let product = to_nalgebra(a) * to_nalgebra(b);
        from_nalgebra(&product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_row_major_order() {
        let a = DenseMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let back = from_nalgebra(&to_nalgebra(&a)).unwrap();
        assert_eq!(back, a);
    }
}
