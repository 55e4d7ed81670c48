//! Point calculations over built matrices.
use crate::error::Result;
use crate::inventory::MatrixData;
use crate::matrix::{DenseMatrix, Matrix};
use crate::results::full::loop_factors;
use crate::results::{ContributionResult, FullResult, SimpleResult};
use crate::solver::MatrixSolver;
use std::sync::Arc;

/// Calculates results of increasing fidelity from a `MatrixData`.
#[derive(Debug, Clone)]
pub struct LcaCalculator {
    solver: Arc<dyn MatrixSolver>,
}

impl LcaCalculator {
    pub fn new(solver: Arc<dyn MatrixSolver>) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &Arc<dyn MatrixSolver> {
        &self.solver
    }

    /// Scaling vector, total inventory and total impacts.
    pub fn calculate_simple(&self, data: &MatrixData) -> Result<SimpleResult> {
        self.simple_with(data, data.tech_matrix.as_ref(), data.flow_matrix.as_ref(), data.impact_matrix.as_deref())
    }

    /// Adds the direct contributions of every product to the simple result.
    pub fn calculate_contributions(&self, data: &MatrixData) -> Result<ContributionResult> {
        let simple = self.calculate_simple(data)?;
        self.contributions_of(data, simple)
    }

    /// Inverts the technology matrix and adds the upstream totals.
    pub fn calculate_full(&self, data: &MatrixData) -> Result<FullResult> {
        let solver = self.solver.as_ref();
        let inverse = solver.invert(data.tech_matrix.as_ref())?;
        let demand = data.demand();
        let s: Vec<f64> = inverse.column(0).iter().map(|v| v * demand).collect();
        let simple = self.simple_of(
            data,
            data.tech_matrix.as_ref(),
            data.flow_matrix.as_ref(),
            data.impact_matrix.as_deref(),
            s,
        )?;
        let contributions = self.contributions_of(data, simple)?;

        let tech_matrix = data.tech_matrix.to_dense();
        let factors = loop_factors(&tech_matrix, &inverse);
        let flow_intensities = solver.multiply(data.flow_matrix.as_ref(), &inverse)?;
        let totals: Vec<f64> =
            contributions.total_requirements.iter().zip(&factors).map(|(tr, lf)| tr * lf).collect();
        let upstream_flows = flow_intensities.scale_columns(&totals)?;
        let (impact_intensities, upstream_impacts) = match data.impact_matrix.as_deref() {
            Some(c) => (Some(solver.multiply(c, &flow_intensities)?), Some(solver.multiply(c, &upstream_flows)?)),
            None => (None, None),
        };
        tracing::debug!(products = tech_matrix.rows(), solver = solver.name(), "full result calculated");

        Ok(FullResult {
            contributions,
            tech_matrix,
            inverse,
            loop_factors: factors,
            flow_intensities,
            impact_intensities,
            upstream_flows,
            upstream_impacts,
        })
    }

    /// Simple calculation with the indices of `data` but other matrices
    /// of the same shape, as drawn in a simulation run.
    pub(crate) fn simple_with(
        &self,
        data: &MatrixData,
        a: &dyn Matrix,
        b: &dyn Matrix,
        c: Option<&dyn Matrix>,
    ) -> Result<SimpleResult> {
        let demand = data.demand();
        let s = if demand == 0.0 { vec![0.0; a.rows()] } else { self.solver.solve(a, 0, demand)? };
        self.simple_of(data, a, b, c, s)
    }

    fn simple_of(
        &self,
        data: &MatrixData,
        a: &dyn Matrix,
        b: &dyn Matrix,
        c: Option<&dyn Matrix>,
        s: Vec<f64>,
    ) -> Result<SimpleResult> {
        let total_requirements: Vec<f64> = a.diagonal().iter().zip(&s).map(|(aii, si)| aii * si).collect();
        let total_flows = self.solver.multiply_vec(b, &s)?;
        let total_impacts = c.map(|c| self.solver.multiply_vec(c, &total_flows)).transpose()?;
        let total_costs = data.cost_vector.as_ref().map(|costs| costs.iter().zip(&s).map(|(c, s)| c * s).sum());
        tracing::trace!(products = s.len(), flows = total_flows.len(), "simple result calculated");
        Ok(SimpleResult {
            tech_index: data.tech_index.clone(),
            flow_index: data.flow_index.clone(),
            impact_index: data.impact_index.clone(),
            scaling_vector: s,
            total_requirements,
            total_flows,
            total_impacts,
            total_costs,
            nw_table: data.nw_table.clone(),
        })
    }

    fn contributions_of(&self, data: &MatrixData, simple: SimpleResult) -> Result<ContributionResult> {
        let solver = self.solver.as_ref();
        let direct_flows: DenseMatrix = solver.scale_columns(data.flow_matrix.as_ref(), &simple.scaling_vector)?;
        let direct_impacts = data.impact_matrix.as_deref().map(|c| solver.multiply(c, &direct_flows)).transpose()?;
        let direct_costs = data
            .cost_vector
            .as_ref()
            .map(|costs| costs.iter().zip(&simple.scaling_vector).map(|(c, s)| c * s).collect());
        Ok(ContributionResult { simple, direct_flows, direct_impacts, direct_costs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::CalculationSetup;
    use crate::config::{ForcedLayout, StorageConfig};
    use crate::error::LcaError;
    use crate::index::{FlowDescriptor, FlowIndex, ProcessProduct, TechIndex};
    use crate::inventory::InventoryBuilder;
    use crate::model::*;
    use crate::solver::tests::{accelerated, portable};
    use crate::testing;
    use rstest::rstest;

    const EPS: f64 = 1e-12;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn build(registry: &Registry, setup: &CalculationSetup) -> MatrixData {
        InventoryBuilder::new(registry, portable().as_ref()).build(setup).unwrap()
    }

    fn loop_with_method() -> (Registry, CalculationSetup) {
        let (mut registry, system) = testing::two_process_loop();
        registry.add_method(testing::climate_method(3.0));
        let setup = CalculationSetup::new(system, 1.0)
            .with_impact_method(ImpactMethodId(1))
            .with_nw_set(NwSetId(1));
        (registry, setup)
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_single_process(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, system) = testing::single_process_system();
        let data = build(&registry, &CalculationSetup::new(system, 10.0));
        let result = LcaCalculator::new(solver).calculate_simple(&data).unwrap();
        assert!(close(result.scaling_vector[0], 5.0));
        assert!(close(result.total_flow(FlowId(20)), -5.0));
        assert!(close(result.total_requirements[0], 10.0));
        assert!(close(result.scaling_factor_of(ProcessId(1)), 5.0));
        assert!(result.total_impacts.is_none());
        assert_eq!(result.total_impact(ImpactCategoryId(1)), 0.0);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_one_by_one_system(#[case] solver: Arc<dyn MatrixSolver>) {
        let product = ProcessProduct::of_process(ProcessId(1), FlowId(1));
        let mut flows = FlowIndex::new();
        for id in 0..4 {
            flows.put_output(FlowDescriptor {
                id: FlowId(100 + id),
                name: format!("f{}", id),
                flow_type: FlowType::Elementary,
                polarity: None,
            });
        }
        let a = DenseMatrix::from_rows(&[vec![1.0]]).unwrap();
        let b = DenseMatrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let data = MatrixData::new(TechIndex::new(product, 1.0), flows, Box::new(a), Box::new(b)).unwrap();
        let result = LcaCalculator::new(solver).calculate_simple(&data).unwrap();
        assert_eq!(result.total_flows, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_loop_is_solved(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, system) = testing::two_process_loop();
        let data = build(&registry, &CalculationSetup::new(system, 1.0));
        let result = LcaCalculator::new(solver).calculate_simple(&data).unwrap();
        assert!(close(result.scaling_vector[0], 1.0 / 0.9));
        assert!(close(result.scaling_vector[1], 0.5 / 0.9));
        assert!(close(result.total_flow(FlowId(20)), 2.5 / 0.9));
    }

    #[test]
    fn test_zero_demand_gives_zero_vectors() {
        let (registry, system) = testing::two_process_loop();
        let data = build(&registry, &CalculationSetup::new(system, 0.0));
        let result = LcaCalculator::new(portable()).calculate_simple(&data).unwrap();
        assert_eq!(result.scaling_vector, vec![0.0, 0.0]);
        assert_eq!(result.total_flows, vec![0.0]);
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_impacts_are_dot_products(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, setup) = loop_with_method();
        let data = build(&registry, &setup);
        let result = LcaCalculator::new(solver).calculate_simple(&data).unwrap();
        let c = data.impact_matrix.as_ref().unwrap();
        let expected: f64 = (0..result.total_flows.len()).map(|k| c.get(0, k) * result.total_flows[k]).sum();
        let h = result.total_impact(ImpactCategoryId(1));
        assert!(close(h, expected));
        assert!(close(h, 3.0 * 2.5 / 0.9));
        assert!(close(result.normalized_impacts().unwrap()[0], h / 10.0));
        assert!(close(result.single_score().unwrap(), h / 10.0 * 2.0));
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_cut_off_consistency(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, system) = testing::cut_off_system();
        let data = build(&registry, &CalculationSetup::new(system, 2.0));
        let result = LcaCalculator::new(solver).calculate_simple(&data).unwrap();
        assert_eq!(result.scaling_vector.len(), 1);
        assert!(close(result.total_flow(FlowId(20)), 8.0));
        // the cut-off product appears neither as a product nor as a flow
        assert_eq!(result.total_flow(FlowId(11)), 0.0);
        assert_eq!(result.scaling_factor(&ProcessProduct::of_process(ProcessId(2), FlowId(11))), 0.0);
    }

    #[test]
    fn test_singular_technology_matrix_fails() {
        let product = ProcessProduct::of_process(ProcessId(1), FlowId(1));
        let a = DenseMatrix::zeros(1, 1);
        let b = DenseMatrix::zeros(0, 1);
        let data = MatrixData::new(TechIndex::new(product, 1.0), FlowIndex::new(), Box::new(a), Box::new(b)).unwrap();
        let calculator = LcaCalculator::new(portable());
        assert!(matches!(calculator.calculate_simple(&data), Err(LcaError::SingularMatrix { .. })));
        assert!(matches!(calculator.calculate_full(&data), Err(LcaError::SingularMatrix { .. })));
    }

    #[test]
    fn test_costs() {
        let (mut registry, system) = testing::single_process_system();
        let process = registry.processes.get_mut(&ProcessId(1)).unwrap();
        process.exchanges[0].cost = Some(8.0);
        process.exchanges[1].cost = Some(3.0);
        let data = build(&registry, &CalculationSetup::new(system, 10.0).with_costs());
        let result = LcaCalculator::new(portable()).calculate_contributions(&data).unwrap();
        assert!(close(result.total_costs.unwrap(), -25.0));
        assert!(close(result.direct_cost(&data.tech_index.reference()), -25.0));
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_contributions_add_up(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, setup) = loop_with_method();
        let data = build(&registry, &setup);
        let result = LcaCalculator::new(solver).calculate_contributions(&data).unwrap();
        let p1 = data.tech_index.content()[0];
        assert!(close(result.direct_flow(&p1, FlowId(20)), 2.0 / 0.9));
        assert!(close(result.direct_flow_of(ProcessId(2), FlowId(20)), 0.5 / 0.9));
        let items = result.flow_contributions(FlowId(20));
        assert_eq!(items[0].product, p1);
        let share: f64 = items.iter().map(|c| c.share).sum();
        assert!(close(share, 1.0));
        let impacts: f64 = result.impact_contributions(ImpactCategoryId(1)).iter().map(|c| c.amount).sum();
        assert!(close(impacts, result.total_impact(ImpactCategoryId(1))));
        assert!(close(result.direct_impact(&p1, ImpactCategoryId(1)), 6.0 / 0.9));
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_full_result_upstream(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, setup) = loop_with_method();
        let data = build(&registry, &setup);
        let result = LcaCalculator::new(solver).calculate_full(&data).unwrap();
        let [p1, p2] = [data.tech_index.content()[0], data.tech_index.content()[1]];
        let g = result.total_flow(FlowId(20));
        assert!(close(result.scaling_vector[0], 1.0 / 0.9));
        assert!(close(result.upstream_flow(&p1, FlowId(20)), g));
        assert!(close(result.upstream_flow(&p2, FlowId(20)), 0.7 / 0.9));
        assert!(close(result.upstream_impact(&p1, ImpactCategoryId(1)), 3.0 * g));

        let tree = result.flow_tree(FlowId(20), 3).unwrap();
        assert_eq!(tree.name, "co2");
        assert!(close(tree.root.result, g));
        let child = &tree.root.children[0];
        assert_eq!(child.product, p2);
        assert!(close(child.amount, 0.5));
        assert!(close(child.result, 0.7));
        assert!(result.impact_tree(ImpactCategoryId(1), 1).is_some());
        assert!(result.flow_tree(FlowId(999), 1).is_none());
    }

    #[test]
    fn test_sparse_storage_gives_same_results() {
        let (registry, system) = testing::two_process_loop();
        let setup = CalculationSetup::new(system, 1.0);
        let storage = StorageConfig { force: Some(ForcedLayout::Sparse), ..Default::default() };
        let sparse = InventoryBuilder::new(&registry, portable().as_ref())
            .with_storage(storage)
            .build(&setup)
            .unwrap();
        let dense = build(&registry, &setup);
        let calculator = LcaCalculator::new(portable());
        let a = calculator.calculate_simple(&sparse).unwrap();
        let b = calculator.calculate_simple(&dense).unwrap();
        assert!(close(a.total_flows[0], b.total_flows[0]));
    }
}
