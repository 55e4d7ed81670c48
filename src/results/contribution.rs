use super::simple::SimpleResult;
use crate::index::ProcessProduct;
use crate::matrix::{DenseMatrix, Matrix};
use crate::model::{FlowId, ImpactCategoryId, ProcessId};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// The share of one product column in a total result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub product: ProcessProduct,
    pub amount: f64,
    /// `amount / total`; 0 when the total is 0.
    pub share: f64,
}

/// Adds the direct contributions of every product column to the totals.
#[derive(Debug, Clone)]
pub struct ContributionResult {
    pub simple: SimpleResult,
    /// `B * diag(s)`: flows x products
    pub direct_flows: DenseMatrix,
    /// `C * B * diag(s)`: impact categories x products
    pub direct_impacts: Option<DenseMatrix>,
    /// `cost_j * s_j`
    pub direct_costs: Option<Vec<f64>>,
}

impl Deref for ContributionResult {
    type Target = SimpleResult;

    fn deref(&self) -> &SimpleResult {
        &self.simple
    }
}

impl ContributionResult {
    pub fn direct_flow(&self, product: &ProcessProduct, flow: FlowId) -> f64 {
        match (self.tech_index.of(product), self.flow_index.of(flow)) {
            (Some(col), Some(row)) => self.direct_flows.get(row, col),
            _ => 0.0,
        }
    }

    /// Direct result of the flow summed over all products of the process.
    pub fn direct_flow_of(&self, process: ProcessId, flow: FlowId) -> f64 {
        let Some(row) = self.flow_index.of(flow) else { return 0.0 };
        self.tech_index.providers_of(process).iter().map(|&col| self.direct_flows.get(row, col)).sum()
    }

    pub fn direct_impact(&self, product: &ProcessProduct, category: ImpactCategoryId) -> f64 {
        let (Some(index), Some(matrix)) = (&self.impact_index, &self.direct_impacts) else { return 0.0 };
        match (self.tech_index.of(product), index.of_key(&category)) {
            (Some(col), Some(row)) => matrix.get(row, col),
            _ => 0.0,
        }
    }

    pub fn direct_cost(&self, product: &ProcessProduct) -> f64 {
        match (&self.direct_costs, self.tech_index.of(product)) {
            (Some(costs), Some(col)) => costs[col],
            _ => 0.0,
        }
    }

    /// Direct contributions of all products to a flow, largest first.
    pub fn flow_contributions(&self, flow: FlowId) -> Vec<Contribution> {
        let Some(row) = self.flow_index.of(flow) else { return Vec::new() };
        self.contributions(self.direct_flows.row_slice(row), self.total_flows[row])
    }

    pub fn impact_contributions(&self, category: ImpactCategoryId) -> Vec<Contribution> {
        let (Some(index), Some(matrix), Some(h)) = (&self.impact_index, &self.direct_impacts, &self.total_impacts)
        else {
            return Vec::new();
        };
        match index.of_key(&category) {
            Some(row) => self.contributions(matrix.row_slice(row), h[row]),
            None => Vec::new(),
        }
    }

    fn contributions(&self, values: &[f64], total: f64) -> Vec<Contribution> {
        let mut items: Vec<Contribution> = self
            .tech_index
            .iter()
            .map(|(col, product)| Contribution {
                product: *product,
                amount: values[col],
                share: if total != 0.0 { values[col] / total } else { 0.0 },
            })
            .collect();
        items.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        items
    }
}
