//! The exchange-level contributions behind every matrix entry.
//!
//! A matrix entry can be the sum of several exchanges (e.g. a self-loop on
//! the diagonal). Each contribution keeps its base amount, its formula and
//! its uncertainty so that a Monte-Carlo run can recompute the entry without
//! rebuilding the topology.
use crate::formula::{Expr, Interpreter};
use crate::matrix::Matrix;
use crate::model::{ParameterScope, Uncertainty};
use rand::Rng;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ExchangeCell {
    pub row: usize,
    pub col: usize,
    /// sign * unit conversion * allocation
    pub factor: f64,
    /// Amount in the unit of the exchange, as stored.
    pub amount: f64,
    pub formula: Option<Arc<Expr>>,
    pub scope: ParameterScope,
    pub uncertainty: Option<Uncertainty>,
}

impl ExchangeCell {
    /// Whether the value of this cell can change between runs.
    pub fn varies(&self) -> bool {
        self.formula.is_some() || self.uncertainty.is_some()
    }

    /// Contribution with the formula evaluated; a failing formula falls back
    /// to the stored amount.
    pub fn value(&self, interpreter: &Interpreter) -> f64 {
        self.factor * self.amount_in(interpreter)
    }

    /// Contribution with a fresh draw of the uncertainty distribution, which
    /// replaces the formula.
    pub fn sample<R: Rng + ?Sized>(&self, interpreter: &Interpreter, rng: &mut R) -> f64 {
        match &self.uncertainty {
            Some(u) => self.factor * u.sample(rng),
            None => self.value(interpreter),
        }
    }

    fn amount_in(&self, interpreter: &Interpreter) -> f64 {
        let Some(expr) = &self.formula else { return self.amount };
        match interpreter.eval_expr(&self.scope, expr) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(row = self.row, col = self.col, error = %e, "using stored amount");
                self.amount
            }
        }
    }
}

/// All contributions to one matrix position.
#[derive(Debug, Clone, Default)]
pub struct CellGroup {
    pub row: usize,
    pub col: usize,
    pub cells: SmallVec<[ExchangeCell; 1]>,
}

impl CellGroup {
    pub fn varies(&self) -> bool {
        self.cells.iter().any(ExchangeCell::varies)
    }
}

/// Contributions of a matrix, grouped by position in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CellTable {
    groups: Vec<CellGroup>,
    positions: HashMap<(usize, usize), usize>,
}

impl CellTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cell: ExchangeCell) {
        let key = (cell.row, cell.col);
        let i = *self.positions.entry(key).or_insert_with(|| {
            self.groups.push(CellGroup { row: key.0, col: key.1, cells: SmallVec::new() });
            self.groups.len() - 1
        });
        self.groups[i].cells.push(cell);
    }

    pub fn groups(&self) -> &[CellGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn has_variation(&self) -> bool {
        self.groups.iter().any(CellGroup::varies)
    }

    /// Writes the evaluated value of every position into `matrix`.
    pub fn fill(&self, matrix: &mut dyn Matrix, interpreter: &Interpreter) {
        for g in &self.groups {
            let value: f64 = g.cells.iter().map(|c| c.value(interpreter)).sum();
            matrix.set(g.row, g.col, value);
        }
    }

    /// Redraws every varying position of `matrix`; constant positions are
    /// left untouched.
    pub fn sample_into<R: Rng + ?Sized>(&self, matrix: &mut dyn Matrix, interpreter: &Interpreter, rng: &mut R) {
        for g in self.groups.iter().filter(|g| g.varies()) {
            let value: f64 = g.cells.iter().map(|c| c.sample(interpreter, rng)).sum();
            matrix.set(g.row, g.col, value);
        }
    }
}
