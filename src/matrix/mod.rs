//! Matrix storage behind a uniform interface.
//!
//! The builder fills a `HashPointMatrix` and then compacts it either into a
//! `DenseMatrix` or a `CscMatrix`, depending on density and size. Solvers and
//! results only talk to the `Matrix` trait.
pub mod dense;
pub mod io;
pub mod kernel;
pub mod sparse;

pub use dense::DenseMatrix;
pub use sparse::{CscMatrix, HashPointMatrix};

use crate::error::{LcaError, Result};
use std::fmt::Debug;

pub trait Matrix: Debug + Send + Sync {
    fn rows(&self) -> usize;
    fn columns(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> f64;
    fn set(&mut self, row: usize, col: usize, value: f64);

    /// Calls `f(row, col, value)` for every stored non-zero entry.
    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, f64));

    fn to_dense(&self) -> DenseMatrix;
    fn copy(&self) -> Box<dyn Matrix>;

    fn is_sparse(&self) -> bool { false }

    fn row(&self, row: usize) -> Vec<f64> {
        (0..self.columns()).map(|c| self.get(row, c)).collect()
    }

    fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows()).map(|r| self.get(r, col)).collect()
    }

    fn diagonal(&self) -> Vec<f64> {
        let n = self.rows().min(self.columns());
        (0..n).map(|i| self.get(i, i)).collect()
    }

    /// `self * v`
    fn multiply_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.columns() {
            return Err(LcaError::mismatch(format!(
                "cannot multiply a {}x{} matrix with a vector of length {}",
                self.rows(),
                self.columns(),
                v.len()
            )));
        }
        let mut result = vec![0.0; self.rows()];
        self.for_each_nonzero(&mut |r, c, value| result[r] += value * v[c]);
        Ok(result)
    }

    /// Number of stored non-zero entries.
    fn nonzeros(&self) -> usize {
        let mut count = 0;
        self.for_each_nonzero(&mut |_, _, _| count += 1);
        count
    }
}

impl Clone for Box<dyn Matrix> {
    fn clone(&self) -> Self {
        self.copy()
    }
}

/// Storage layout chosen when a built matrix is compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Dense,
    Sparse,
}

/// Picks the storage layout for a matrix of the given shape and fill.
pub fn choose_layout(rows: usize, cols: usize, nonzeros: usize, density_threshold: f64, min_sparse_size: usize) -> Layout {
    let cells = rows.saturating_mul(cols);
    if cells == 0 || rows.max(cols) < min_sparse_size {
        return Layout::Dense;
    }
    let density = nonzeros as f64 / cells as f64;
    if density < density_threshold { Layout::Sparse } else { Layout::Dense }
}
