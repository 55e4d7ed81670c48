//! Sparse storage: a hash based builder format and a compressed column format.
use super::{DenseMatrix, Matrix};
use std::collections::HashMap;

/// A sparse matrix backed by a hash map; used while matrices are assembled.
#[derive(Debug, Clone, Default)]
pub struct HashPointMatrix {
    rows: usize,
    cols: usize,
    data: HashMap<(usize, usize), f64>,
}

impl HashPointMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: HashMap::new() }
    }

    /// Adds `value` to the entry; the matrix grows when the position is
    /// outside of its current shape.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
        *self.data.entry((row, col)).or_insert(0.0) += value;
    }

    /// Fixes the final shape; entries outside of it are not allowed.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = self.rows.max(rows);
        self.cols = self.cols.max(cols);
    }

    /// Converts into compressed sparse column storage.
    pub fn compress(&self) -> CscMatrix {
        let mut entries: Vec<(usize, usize, f64)> = self
            .data
            .iter()
            .filter(|(_, v)| **v != 0.0)
            .map(|(&(r, c), &v)| (r, c, v))
            .collect();
        entries.sort_unstable_by_key(|&(r, c, _)| (c, r));

        let mut col_ptr = vec![0u32; self.cols + 1];
        let mut row_idx = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for &(r, c, v) in &entries {
            col_ptr[c + 1] += 1;
            row_idx.push(r as u32);
            values.push(v);
        }
        for c in 0..self.cols {
            col_ptr[c + 1] += col_ptr[c];
        }
        CscMatrix { rows: self.rows, cols: self.cols, col_ptr, row_idx, values }
    }
}

impl Matrix for HashPointMatrix {
    fn rows(&self) -> usize { self.rows }
    fn columns(&self) -> usize { self.cols }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(&(row, col)).copied().unwrap_or(0.0)
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
        if value == 0.0 {
            self.data.remove(&(row, col));
        } else {
            self.data.insert((row, col), value);
        }
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, f64)) {
        for (&(r, c), &v) in &self.data {
            if v != 0.0 {
                f(r, c, v);
            }
        }
    }

    fn to_dense(&self) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(self.rows, self.cols);
        for (&(r, c), &v) in &self.data {
            m.set(r, c, v);
        }
        m
    }

    fn copy(&self) -> Box<dyn Matrix> { Box::new(self.clone()) }
    fn is_sparse(&self) -> bool { true }
}

/// Compressed sparse column storage (CSC).
///
/// The row indices of column `c` are `row_idx[col_ptr[c]..col_ptr[c + 1]]`,
/// sorted ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CscMatrix {
    rows: usize,
    cols: usize,
    col_ptr: Vec<u32>,
    row_idx: Vec<u32>,
    values: Vec<f64>,
}

impl CscMatrix {
    #[inline(always)]
    fn range(&self, col: usize) -> std::ops::Range<usize> {
        self.col_ptr[col] as usize..self.col_ptr[col + 1] as usize
    }

    fn find(&self, row: usize, col: usize) -> Result<usize, usize> {
        let range = self.range(col);
        let start = range.start;
        self.row_idx[range]
            .binary_search(&(row as u32))
            .map(|i| start + i)
            .map_err(|i| start + i)
    }

    pub fn values(&self) -> &[f64] { &self.values }
}

impl Matrix for CscMatrix {
    fn rows(&self) -> usize { self.rows }
    fn columns(&self) -> usize { self.cols }

    fn get(&self, row: usize, col: usize) -> f64 {
        match self.find(row, col) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Updates a stored entry in place. Setting a position that is not stored
    /// inserts it, which shifts all following entries.
    fn set(&mut self, row: usize, col: usize, value: f64) {
        match self.find(row, col) {
            Ok(pos) => self.values[pos] = value,
            Err(pos) => {
                if value == 0.0 {
                    return;
                }
                self.row_idx.insert(pos, row as u32);
                self.values.insert(pos, value);
                for ptr in &mut self.col_ptr[col + 1..] {
                    *ptr += 1;
                }
            }
        }
    }

    fn for_each_nonzero(&self, f: &mut dyn FnMut(usize, usize, f64)) {
        for c in 0..self.cols {
            for pos in self.range(c) {
                f(self.row_idx[pos] as usize, c, self.values[pos]);
            }
        }
    }

    fn column(&self, col: usize) -> Vec<f64> {
        let mut column = vec![0.0; self.rows];
        for pos in self.range(col) {
            column[self.row_idx[pos] as usize] = self.values[pos];
        }
        column
    }

    fn to_dense(&self) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(self.rows, self.cols);
        self.for_each_nonzero(&mut |r, c, v| m.set(r, c, v));
        m
    }

    fn copy(&self) -> Box<dyn Matrix> { Box::new(self.clone()) }
    fn is_sparse(&self) -> bool { true }
    fn nonzeros(&self) -> usize { self.values.len() }
}
