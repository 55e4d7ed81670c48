use crate::index::{FlowIndex, ImpactIndex, ProcessProduct, TechIndex};
use crate::inventory::NwTable;
use crate::model::{FlowId, ImpactCategoryId, ProcessId};
use std::sync::Arc;

/// Total results of a calculation: scaling vector, inventory and, with an
/// impact method, the impact assessment.
///
/// Lookups of products, flows or categories that are not part of the result
/// return 0.
#[derive(Debug, Clone)]
pub struct SimpleResult {
    pub tech_index: Arc<TechIndex>,
    pub flow_index: Arc<FlowIndex>,
    pub impact_index: Option<Arc<ImpactIndex>>,
    /// `s` with `A * s = d * e0`
    pub scaling_vector: Vec<f64>,
    /// `tr_i = s_i * A_ii`, the product amounts needed to fulfill the demand.
    pub total_requirements: Vec<f64>,
    /// `g = B * s`; inputs are negative.
    pub total_flows: Vec<f64>,
    /// `h = C * g`
    pub total_impacts: Option<Vec<f64>>,
    /// Net costs of all products, when costs were included.
    pub total_costs: Option<f64>,
    pub nw_table: Option<Arc<NwTable>>,
}

impl SimpleResult {
    pub fn has_impacts(&self) -> bool {
        self.total_impacts.is_some()
    }

    pub fn scaling_factor(&self, product: &ProcessProduct) -> f64 {
        self.tech_index.of(product).map_or(0.0, |i| self.scaling_vector[i])
    }

    /// Sum of the scaling factors of all products of the process.
    pub fn scaling_factor_of(&self, process: ProcessId) -> f64 {
        self.tech_index.providers_of(process).iter().map(|&i| self.scaling_vector[i]).sum()
    }

    pub fn total_requirement(&self, product: &ProcessProduct) -> f64 {
        self.tech_index.of(product).map_or(0.0, |i| self.total_requirements[i])
    }

    pub fn total_flow(&self, flow: FlowId) -> f64 {
        self.flow_index.of(flow).map_or(0.0, |i| self.total_flows[i])
    }

    pub fn total_impact(&self, category: ImpactCategoryId) -> f64 {
        match (&self.impact_index, &self.total_impacts) {
            (Some(index), Some(h)) => index.of_key(&category).map_or(0.0, |i| h[i]),
            _ => 0.0,
        }
    }

    pub fn normalized_impacts(&self) -> Option<Vec<f64>> {
        Some(self.nw_table.as_ref()?.normalize(self.total_impacts.as_ref()?))
    }

    pub fn weighted_impacts(&self) -> Option<Vec<f64>> {
        Some(self.nw_table.as_ref()?.weight(self.total_impacts.as_ref()?))
    }

    pub fn single_score(&self) -> Option<f64> {
        Some(self.nw_table.as_ref()?.single_score(self.total_impacts.as_ref()?))
    }
}
