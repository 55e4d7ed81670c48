//! Dense LU decomposition with partial pivoting; the portable fallback backend.
use super::{ensure_finite, ensure_square, singularity_bounds, MatrixSolver};
use crate::error::{LcaError, Result};
use crate::matrix::{DenseMatrix, Matrix};

/// `P * A = L * U`, stored packed in a single matrix. The unit diagonal of
/// `L` is implicit.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    lu: DenseMatrix,
    perm: Vec<usize>,
}

impl LuDecomposition {
    pub fn factorize(a: &dyn Matrix) -> Result<Self> {
        let n = ensure_square(a)?;
        let mut lu = a.to_dense();
        let mut perm: Vec<usize> = (0..n).collect();
        let bounds = singularity_bounds(&lu);

        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_abs = lu.get(k, k).abs();
            for i in (k + 1)..n {
                let v = lu.get(i, k).abs();
                if v > pivot_abs {
                    pivot_row = i;
                    pivot_abs = v;
                }
            }
            if pivot_abs <= bounds[k] || !pivot_abs.is_finite() {
                return Err(LcaError::SingularMatrix { rows: n, cols: n });
            }
            lu.swap_rows(k, pivot_row);
            perm.swap(k, pivot_row);

            let pivot = lu.get(k, k);
            let (upper, lower) = lu.data_mut().split_at_mut((k + 1) * n);
            let pivot_tail = &upper[k * n + k + 1..k * n + n];
            for row in lower.chunks_exact_mut(n) {
                let factor = row[k] / pivot;
                row[k] = factor;
                if factor != 0.0 {
                    crate::matrix::kernel::axpy(&mut row[k + 1..], -factor, pivot_tail);
                }
            }
        }
        Ok(Self { lu, perm })
    }

    pub fn size(&self) -> usize {
        self.perm.len()
    }

    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>> {
        let n = self.size();
        if b.len() != n {
            return Err(LcaError::mismatch(format!(
                "right-hand side of length {} for a {}x{} system",
                b.len(),
                n,
                n
            )));
        }
        let mut x: Vec<f64> = self.perm.iter().map(|&p| b[p]).collect();
        for i in 0..n {
            let row = self.lu.row_slice(i);
            let sum = crate::matrix::kernel::dot(&row[..i], &x[..i]);
            x[i] -= sum;
        }
        for i in (0..n).rev() {
            let row = self.lu.row_slice(i);
            let sum = crate::matrix::kernel::dot(&row[i + 1..], &x[i + 1..]);
            x[i] = (x[i] - sum) / row[i];
        }
        ensure_finite(&x, n, n)?;
        Ok(x)
    }

    pub fn inverse(&self) -> Result<DenseMatrix> {
        let n = self.size();
        let mut inverse = DenseMatrix::zeros(n, n);
        let mut e = vec![0.0; n];
        for j in 0..n {
            e[j] = 1.0;
            let column = self.solve(&e)?;
            e[j] = 0.0;
            for (i, v) in column.into_iter().enumerate() {
                inverse.set(i, j, v);
            }
        }
        Ok(inverse)
    }
}

/// Pure Rust solver that runs everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableSolver;

impl MatrixSolver for PortableSolver {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn solve_vec(&self, a: &dyn Matrix, b: &[f64]) -> Result<Vec<f64>> {
        LuDecomposition::factorize(a)?.solve(b)
    }

    fn invert(&self, a: &dyn Matrix) -> Result<DenseMatrix> {
        LuDecomposition::factorize(a)?.inverse()
    }
}
