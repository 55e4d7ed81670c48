use super::cells::CellTable;
use super::impact::NwTable;
use crate::error::{LcaError, Result};
use crate::formula::ParameterTable;
use crate::index::{FlowIndex, ImpactIndex, TechIndex};
use crate::matrix::Matrix;
use std::sync::Arc;

/// The contributions behind the matrices, kept for Monte-Carlo runs.
#[derive(Debug, Clone, Default)]
pub struct MatrixCells {
    pub tech: CellTable,
    pub flows: CellTable,
    pub impacts: CellTable,
}

impl MatrixCells {
    pub fn has_variation(&self) -> bool {
        self.tech.has_variation() || self.flows.has_variation() || self.impacts.has_variation()
    }
}

/// The matrices of a calculation together with their indices.
///
/// The topology (indices and stored positions) is fixed after the build;
/// only values may change, on private copies.
#[derive(Debug, Clone)]
pub struct MatrixData {
    pub tech_index: Arc<TechIndex>,
    pub flow_index: Arc<FlowIndex>,
    pub impact_index: Option<Arc<ImpactIndex>>,
    /// `A`: products x products
    pub tech_matrix: Box<dyn Matrix>,
    /// `B`: flows x products
    pub flow_matrix: Box<dyn Matrix>,
    /// `C`: impact categories x flows
    pub impact_matrix: Option<Box<dyn Matrix>>,
    /// Net costs per column at the declared reference amount of the process.
    pub cost_vector: Option<Vec<f64>>,
    pub nw_table: Option<Arc<NwTable>>,
    pub parameters: Arc<ParameterTable>,
    pub cells: Arc<MatrixCells>,
}

impl MatrixData {
    /// Wraps prebuilt matrices; there are no cells and parameters to vary.
    pub fn new(
        tech_index: TechIndex,
        flow_index: FlowIndex,
        tech_matrix: Box<dyn Matrix>,
        flow_matrix: Box<dyn Matrix>,
    ) -> Result<Self> {
        let data = Self {
            tech_index: Arc::new(tech_index),
            flow_index: Arc::new(flow_index),
            impact_index: None,
            tech_matrix,
            flow_matrix,
            impact_matrix: None,
            cost_vector: None,
            nw_table: None,
            parameters: Arc::new(ParameterTable::default()),
            cells: Arc::new(MatrixCells::default()),
        };
        data.check()?;
        Ok(data)
    }

    pub fn with_impacts(mut self, index: ImpactIndex, matrix: Box<dyn Matrix>) -> Result<Self> {
        self.impact_index = Some(Arc::new(index));
        self.impact_matrix = Some(matrix);
        self.check()?;
        Ok(self)
    }

    pub fn with_costs(mut self, costs: Vec<f64>) -> Result<Self> {
        self.cost_vector = Some(costs);
        self.check()?;
        Ok(self)
    }

    pub fn demand(&self) -> f64 {
        self.tech_index.demand()
    }

    /// Matrix dimensions must match the index sizes.
    pub fn check(&self) -> Result<()> {
        let n = self.tech_index.size();
        let m = self.flow_index.size();
        let shape = |name: &str, mat: &dyn Matrix, rows: usize, cols: usize| {
            if mat.rows() != rows || mat.columns() != cols {
                Err(LcaError::mismatch(format!(
                    "{} is {}x{} but the indices require {}x{}",
                    name,
                    mat.rows(),
                    mat.columns(),
                    rows,
                    cols
                )))
            } else {
                Ok(())
            }
        };
        shape("technology matrix", self.tech_matrix.as_ref(), n, n)?;
        shape("intervention matrix", self.flow_matrix.as_ref(), m, n)?;
        if let (Some(index), Some(c)) = (&self.impact_index, &self.impact_matrix) {
            shape("impact matrix", c.as_ref(), index.size(), m)?;
        }
        if let Some(costs) = &self.cost_vector {
            if costs.len() != n {
                return Err(LcaError::mismatch(format!("{} costs for {} products", costs.len(), n)));
            }
        }
        Ok(())
    }
}
