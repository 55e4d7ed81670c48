//! Characterization factors and normalization/weighting factors.
use super::cells::{CellTable, ExchangeCell};
use crate::formula::Expr;
use crate::index::{FlowIndex, ImpactDescriptor, ImpactIndex};
use crate::model::{ImpactMethod, NwSet, ParameterScope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Builds the impact index of a method and the cells of its characterization
/// matrix `C` (categories x flows).
///
/// Factors are given per reference unit of a flow for its natural direction.
/// Rows of input flows hold negative amounts in `B`, so their factors are
/// negated to keep `C * g` positive for resource use.
pub fn impact_cells(method: &ImpactMethod, flows: &FlowIndex) -> (ImpactIndex, CellTable) {
    let mut index = ImpactIndex::new();
    let mut cells = CellTable::new();
    let scope = ParameterScope::ImpactMethod(method.id);
    for category in &method.categories {
        let row = index.put(ImpactDescriptor::from(category));
        for factor in &category.factors {
            let Some(col) = flows.of(factor.flow) else { continue };
            let sign = if flows.is_input(col) { -1.0 } else { 1.0 };
            let formula = factor.formula.as_deref().and_then(|f| match Expr::parse(f) {
                Ok(expr) => Some(Arc::new(expr)),
                Err(e) => {
                    tracing::warn!(category = %category.name, error = %e, "invalid factor formula");
                    None
                }
            });
            cells.add(ExchangeCell {
                row,
                col,
                factor: sign,
                amount: factor.value,
                formula,
                scope: scope.clone(),
                uncertainty: factor.uncertainty.clone(),
            });
        }
    }
    (index, cells)
}

/// Normalization and weighting factors aligned with an impact index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NwTable {
    normalisation: Vec<Option<f64>>,
    weighting: Vec<Option<f64>>,
    pub weighted_score_unit: Option<String>,
}

impl NwTable {
    pub fn new(set: &NwSet, index: &ImpactIndex) -> Self {
        let mut normalisation = vec![None; index.size()];
        let mut weighting = vec![None; index.size()];
        for f in &set.factors {
            if let Some(i) = index.of_key(&f.category) {
                normalisation[i] = f.normalisation;
                weighting[i] = f.weighting;
            }
        }
        Self { normalisation, weighting, weighted_score_unit: set.weighted_score_unit.clone() }
    }

    /// `n_k = h_k / nf_k`; categories without a (non-zero) factor are 0.
    pub fn normalize(&self, impacts: &[f64]) -> Vec<f64> {
        impacts
            .iter()
            .zip(&self.normalisation)
            .map(|(h, nf)| match nf {
                Some(nf) if *nf != 0.0 => h / nf,
                _ => 0.0,
            })
            .collect()
    }

    /// `w_k = n_k * wf_k`. Without normalisation factors the weighting is
    /// applied to the impact results directly.
    pub fn weight(&self, impacts: &[f64]) -> Vec<f64> {
        let has_normalisation = self.normalisation.iter().any(Option::is_some);
        let base = if has_normalisation { self.normalize(impacts) } else { impacts.to_vec() };
        base.iter()
            .zip(&self.weighting)
            .map(|(n, wf)| wf.map_or(0.0, |wf| n * wf))
            .collect()
    }

    pub fn single_score(&self, impacts: &[f64]) -> f64 {
        self.weight(impacts).iter().sum()
    }
}
