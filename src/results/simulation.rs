use super::statistics::Statistics;
use crate::index::{FlowIndex, ImpactIndex};
use crate::model::{FlowId, ImpactCategoryId};
use std::sync::Arc;

/// The rows of a Monte-Carlo simulation, one per successful run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub flow_index: Arc<FlowIndex>,
    pub impact_index: Option<Arc<ImpactIndex>>,
    flow_rows: Vec<Vec<f64>>,
    impact_rows: Vec<Vec<f64>>,
    failed: usize,
}

impl SimulationResult {
    pub fn new(flow_index: Arc<FlowIndex>, impact_index: Option<Arc<ImpactIndex>>) -> Self {
        Self { flow_index, impact_index, flow_rows: Vec::new(), impact_rows: Vec::new(), failed: 0 }
    }

    pub(crate) fn append(&mut self, flows: Vec<f64>, impacts: Option<Vec<f64>>) {
        self.flow_rows.push(flows);
        if let Some(h) = impacts {
            self.impact_rows.push(h);
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Number of successful runs.
    pub fn runs(&self) -> usize {
        self.flow_rows.len()
    }

    pub fn failed_runs(&self) -> usize {
        self.failed
    }

    pub fn flow_rows(&self) -> &[Vec<f64>] {
        &self.flow_rows
    }

    pub fn impact_rows(&self) -> &[Vec<f64>] {
        &self.impact_rows
    }

    /// Values of the flow over all runs; empty for unknown flows.
    pub fn flow_results(&self, flow: FlowId) -> Vec<f64> {
        match self.flow_index.of(flow) {
            Some(col) => self.flow_rows.iter().map(|row| row[col]).collect(),
            None => Vec::new(),
        }
    }

    pub fn impact_results(&self, category: ImpactCategoryId) -> Vec<f64> {
        match self.impact_index.as_ref().and_then(|index| index.of_key(&category)) {
            Some(col) => self.impact_rows.iter().map(|row| row[col]).collect(),
            None => Vec::new(),
        }
    }

    pub fn flow_statistics(&self, flow: FlowId) -> Option<Statistics> {
        Statistics::of(&self.flow_results(flow))
    }

    pub fn impact_statistics(&self, category: ImpactCategoryId) -> Option<Statistics> {
        Statistics::of(&self.impact_results(category))
    }
}
