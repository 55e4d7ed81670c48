use super::kernel;
use super::Matrix;
use crate::error::{LcaError, Result};
use serde::{Deserialize, Serialize};

/// A dense matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Wraps a row-major buffer.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(LcaError::mismatch(format!(
                "buffer of length {} does not fit a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a matrix from nested rows; all rows must have the same length.
    pub fn from_rows(values: &[Vec<f64>]) -> Result<Self> {
        let rows = values.len();
        let cols = values.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows * cols);
        for row in values {
            if row.len() != cols {
                return Err(LcaError::mismatch("rows of different length".to_string()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self { rows, cols, data })
    }

    /// A square matrix with `values` on its diagonal.
    pub fn diagonal_of(values: &[f64]) -> Self {
        let n = values.len();
        let mut m = Self::zeros(n, n);
        for (i, v) in values.iter().enumerate() {
            m.data[i * n + i] = *v;
        }
        m
    }

    pub fn data(&self) -> &[f64] { &self.data }
    pub fn data_mut(&mut self) -> &mut [f64] { &mut self.data }
    pub fn into_data(self) -> Vec<f64> { self.data }

    #[inline(always)]
    pub fn row_slice(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    #[inline(always)]
    pub fn row_slice_mut(&mut self, row: usize) -> &mut [f64] {
        let cols = self.cols;
        &mut self.data[row * cols..(row + 1) * cols]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    pub fn transpose(&self) -> DenseMatrix {
        let mut t = DenseMatrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        t
    }

    /// `self * other`
    pub fn multiply(&self, other: &DenseMatrix) -> Result<DenseMatrix> {
        if self.cols != other.rows {
            return Err(LcaError::mismatch(format!(
                "cannot multiply a {}x{} with a {}x{} matrix",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        // columns of `other` become contiguous rows of the transpose
        let other_t = other.transpose();
        let mut result = DenseMatrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            let lhs = self.row_slice(r);
            for c in 0..other.cols {
                result.data[r * other.cols + c] = kernel::dot(lhs, other_t.row_slice(c));
            }
        }
        Ok(result)
    }

    /// `self * diag(factors)`: scales every column `j` with `factors[j]`.
    pub fn scale_columns(&self, factors: &[f64]) -> Result<DenseMatrix> {
        if factors.len() != self.cols {
            return Err(LcaError::mismatch(format!(
                "cannot scale {} columns with {} factors",
                self.cols,
                factors.len()
            )));
        }
        let mut result = self.clone();
        for r in 0..self.rows {
            for (v, f) in result.row_slice_mut(r).iter_mut().zip(factors) {
                *v *= f;
            }
        }
        Ok(result)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl Matrix for DenseMatrix {
    fn rows(&self) -> usize { self.rows }
    fn columns(&self) -> usize { self.cols }

    #[inline(always)]
    fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline(always)]
    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, f64)) {
        for r in 0..self.rows {
            for (c, &v) in self.row_slice(r).iter().enumerate() {
                if v != 0.0 {
                    f(r, c, v);
                }
            }
        }
    }

    fn to_dense(&self) -> DenseMatrix { self.clone() }
    fn copy(&self) -> Box<dyn Matrix> { Box::new(self.clone()) }

    fn row(&self, row: usize) -> Vec<f64> {
        self.row_slice(row).to_vec()
    }

    fn multiply_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.cols {
            return Err(LcaError::mismatch(format!(
                "cannot multiply a {}x{} matrix with a vector of length {}",
                self.rows,
                self.cols,
                v.len()
            )));
        }
        Ok((0..self.rows).map(|r| kernel::dot(self.row_slice(r), v)).collect())
    }
}
