use super::contribution::ContributionResult;
use super::upstream::{TreeContext, UpstreamTree};
use crate::index::ProcessProduct;
use crate::matrix::{DenseMatrix, Matrix};
use crate::model::{FlowId, ImpactCategoryId};
use std::ops::Deref;

/// Adds the inverse of the technology matrix and the upstream totals of
/// every product to a contribution result.
///
/// The upstream total of product `j` is `(B * A^-1)[:, j] * tr_j * lf_j`
/// where `lf_j = 1 / (A_jj * A^-1_jj)` removes the share of `j` that loops
/// back into its own supply chain. The upstream column of the reference
/// product therefore equals the total inventory.
#[derive(Debug, Clone)]
pub struct FullResult {
    pub contributions: ContributionResult,
    pub tech_matrix: DenseMatrix,
    pub inverse: DenseMatrix,
    pub loop_factors: Vec<f64>,
    /// `B * A^-1`: flows per unit of each product delivered
    pub flow_intensities: DenseMatrix,
    pub impact_intensities: Option<DenseMatrix>,
    pub upstream_flows: DenseMatrix,
    pub upstream_impacts: Option<DenseMatrix>,
}

impl Deref for FullResult {
    type Target = ContributionResult;

    fn deref(&self) -> &ContributionResult {
        &self.contributions
    }
}

/// `1 / (A_jj * A^-1_jj)`; 1 where that product is zero or not finite.
pub(crate) fn loop_factors(tech_matrix: &DenseMatrix, inverse: &DenseMatrix) -> Vec<f64> {
    (0..tech_matrix.rows())
        .map(|j| {
            let f = tech_matrix.get(j, j) * inverse.get(j, j);
            if f != 0.0 && f.is_finite() { 1.0 / f } else { 1.0 }
        })
        .collect()
}

impl FullResult {
    pub fn upstream_flow(&self, product: &ProcessProduct, flow: FlowId) -> f64 {
        match (self.tech_index.of(product), self.flow_index.of(flow)) {
            (Some(col), Some(row)) => self.upstream_flows.get(row, col),
            _ => 0.0,
        }
    }

    pub fn upstream_impact(&self, product: &ProcessProduct, category: ImpactCategoryId) -> f64 {
        let (Some(index), Some(matrix)) = (&self.impact_index, &self.upstream_impacts) else { return 0.0 };
        match (self.tech_index.of(product), index.of_key(&category)) {
            (Some(col), Some(row)) => matrix.get(row, col),
            _ => 0.0,
        }
    }

    /// Upstream tree of a flow, expanded `max_depth` levels below the
    /// reference product.
    pub fn flow_tree(&self, flow: FlowId, max_depth: usize) -> Option<UpstreamTree> {
        let row = self.flow_index.of(flow)?;
        let name = self.flow_index.at(row).map(|f| f.name.clone()).unwrap_or_default();
        Some(self.tree(name, self.flow_intensities.row_slice(row), max_depth))
    }

    pub fn impact_tree(&self, category: ImpactCategoryId, max_depth: usize) -> Option<UpstreamTree> {
        let index = self.impact_index.as_ref()?;
        let intensities = self.impact_intensities.as_ref()?;
        let row = index.of_key(&category)?;
        let name = index.at(row).map(|c| c.name.clone()).unwrap_or_default();
        Some(self.tree(name, intensities.row_slice(row), max_depth))
    }

    fn tree(&self, name: String, intensities: &[f64], max_depth: usize) -> UpstreamTree {
        let ctx = TreeContext {
            products: self.tech_index.content(),
            tech_matrix: &self.tech_matrix,
            intensities,
            loop_factors: &self.loop_factors,
        };
        ctx.expand(name, self.total_requirements[0], max_depth)
    }
}
