//! Assembles the matrices of a calculation from the records of a product system.
//!
//! Sign convention: inputs are negative and outputs positive. In the
//! technology matrix, waste flows are negated on top of that, so that a
//! waste output is a demand for treatment (negative) and the waste input of a
//! treatment process is its positive reference output. Co-products that are
//! not the product of a column are left out of that column, and exchanges
//! without a provider (cut-offs) contribute to neither `A` nor `B`.
use super::allocation::{is_product_exchange, Allocation};
use super::cells::{CellTable, ExchangeCell};
use super::chain::SupplyChain;
use super::data::{MatrixCells, MatrixData};
use super::impact::{impact_cells, NwTable};
use crate::cache::{CacheSnapshot, ConversionTable, FlowTable};
use crate::calculation::CalculationSetup;
use crate::config::StorageConfig;
use crate::error::{LcaError, Result};
use crate::formula::{Expr, ParameterTable};
use crate::index::{FlowDescriptor, FlowIndex, ProcessProduct, TechIndex};
use crate::matrix::{HashPointMatrix, Layout, Matrix};
use crate::model::{
    AllocationMethod, Direction, Exchange, ExchangeId, Flow, FlowId, FlowType, ParameterScope, ProcessId,
    ProductSystem, Provider, Registry, SystemId,
};
use crate::solver::MatrixSolver;
use std::sync::Arc;

pub struct InventoryBuilder<'a> {
    registry: &'a Registry,
    solver: &'a dyn MatrixSolver,
    storage: StorageConfig,
    cache: Option<&'a CacheSnapshot>,
    flow_table: Option<Arc<FlowTable>>,
    conversions: Option<Arc<ConversionTable>>,
    /// Systems currently being built; guards against recursive system links.
    visiting: Vec<SystemId>,
}

/// Contributions collected while the columns are walked.
struct Assembly {
    flow_index: FlowIndex,
    tech: CellTable,
    flows: CellTable,
    costs: Option<Vec<f64>>,
}

enum Target {
    Tech(usize),
    Flow(usize),
    CutOff,
}

impl<'a> InventoryBuilder<'a> {
    pub fn new(registry: &'a Registry, solver: &'a dyn MatrixSolver) -> Self {
        Self {
            registry,
            solver,
            storage: StorageConfig::default(),
            cache: None,
            flow_table: None,
            conversions: None,
            visiting: Vec::new(),
        }
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// A builder over the registry of a cache snapshot that reuses its supply
    /// chains and lookup tables.
    pub fn from_snapshot(snapshot: &'a CacheSnapshot, solver: &'a dyn MatrixSolver) -> Self {
        let mut builder = Self::new(snapshot.registry(), solver);
        builder.flow_table = Some(snapshot.flow_table());
        builder.conversions = Some(snapshot.conversions());
        builder.cache = Some(snapshot);
        builder
    }

    pub fn build(&mut self, setup: &CalculationSetup) -> Result<MatrixData> {
        let registry = self.registry;
        let system = registry
            .system(setup.system)
            .ok_or_else(|| LcaError::structural(format!("product system {} does not exist", setup.system)))?;
        if self.visiting.contains(&system.id) {
            return Err(LcaError::structural(format!("product system '{}' is linked into itself", system.name)));
        }
        let demand = setup.demand(registry, system).ok_or_else(|| {
            LcaError::structural(format!("demand of system '{}' cannot be converted", system.name))
        })?;

        self.visiting.push(system.id);
        let data = self.build_system(system, setup, demand);
        self.visiting.pop();
        data
    }

    fn build_system(&mut self, system: &ProductSystem, setup: &CalculationSetup, demand: f64) -> Result<MatrixData> {
        let registry = self.registry;
        let chain = self.chain_of(system)?;
        let parameters =
            ParameterTable::build(registry, chain.processes(), setup.impact_method, &setup.redefs_for(system));
        let interpreter = parameters.evaluate();

        let mut tech_index = chain.tech_index().clone();
        tech_index.set_demand(demand);
        let mut asm = Assembly {
            flow_index: FlowIndex::new(),
            tech: CellTable::new(),
            flows: CellTable::new(),
            costs: setup.with_costs.then(|| vec![0.0; tech_index.size()]),
        };

        let products: Vec<ProcessProduct> = tech_index.content().to_vec();
        for (col, product) in products.into_iter().enumerate() {
            match product.provider {
                Provider::Process(pid) => {
                    let reference = (col == 0).then_some(system.reference_exchange);
                    self.fill_process_column(&mut asm, &chain, col, pid, product.flow, reference, setup.allocation)?;
                }
                Provider::System(sid) => {
                    let sub = self.fill_system_column(&mut asm, col, sid, setup)?;
                    tech_index.add_sub_index(product, sub);
                }
            }
        }

        let (impact_index, impact_table, nw_table) = match setup.impact_method {
            None => (None, CellTable::new(), None),
            Some(id) => {
                let method = registry
                    .method(id)
                    .ok_or_else(|| LcaError::structural(format!("impact method {} does not exist", id)))?;
                let (index, table) = impact_cells(method, &asm.flow_index);
                let nw = setup
                    .nw_set
                    .and_then(|nw| method.nw_set(nw))
                    .map(|set| Arc::new(NwTable::new(set, &index)));
                (Some(index), table, nw)
            }
        };

        let n = tech_index.size();
        let m = asm.flow_index.size();
        let tech_matrix = self.assemble(&asm.tech, n, n, &interpreter);
        let flow_matrix = self.assemble(&asm.flows, m, n, &interpreter);
        let impact_matrix = impact_index
            .as_ref()
            .map(|index| self.assemble(&impact_table, index.size(), m, &interpreter));

        tracing::debug!(
            system = %system.id,
            products = n,
            flows = m,
            sparse = tech_matrix.is_sparse(),
            "inventory matrices built"
        );

        let data = MatrixData {
            tech_index: Arc::new(tech_index),
            flow_index: Arc::new(asm.flow_index),
            impact_index: impact_index.map(Arc::new),
            tech_matrix,
            flow_matrix,
            impact_matrix,
            cost_vector: asm.costs,
            nw_table,
            parameters: Arc::new(parameters),
            cells: Arc::new(MatrixCells { tech: asm.tech, flows: asm.flows, impacts: impact_table }),
        };
        data.check()?;
        Ok(data)
    }

    fn chain_of(&self, system: &ProductSystem) -> Result<Arc<SupplyChain>> {
        match self.cache {
            Some(cache) => cache.supply_chain(system.id),
            None => Ok(Arc::new(SupplyChain::build(self.registry, system)?)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_process_column(
        &self,
        asm: &mut Assembly,
        chain: &SupplyChain,
        col: usize,
        pid: ProcessId,
        product: FlowId,
        reference: Option<ExchangeId>,
        method: Option<AllocationMethod>,
    ) -> Result<()> {
        let registry = self.registry;
        let process = registry
            .process(pid)
            .ok_or_else(|| LcaError::structural(format!("process {} does not exist", pid)))?;
        let product_exchange = match reference {
            Some(id) => process.exchange(id),
            None => process
                .exchanges
                .iter()
                .find(|e| e.flow == product && is_product_exchange(registry, e)),
        }
        .ok_or_else(|| {
            LcaError::structural(format!("process '{}' does not provide flow {}", process.name, product))
        })?;
        let allocation = Allocation::new(registry, process, product, method);
        let scope = ParameterScope::Process(pid);

        for exchange in &process.exchanges {
            let flow = registry.flow(exchange.flow).ok_or_else(|| {
                LcaError::structural(format!("process '{}' uses unknown flow {}", process.name, exchange.flow))
            })?;
            let is_product = exchange.id == product_exchange.id;
            let target = if is_product {
                Target::Tech(col)
            } else {
                match flow.flow_type {
                    FlowType::Elementary => {
                        let direction = flow.polarity.unwrap_or(exchange.direction);
                        Target::Flow(asm.flow_index.put(self.descriptor(flow), direction))
                    }
                    // co-products of multi-output processes
                    _ if is_product_exchange(registry, exchange) => continue,
                    _ => chain.provider(col, exchange.id).map_or(Target::CutOff, Target::Tech),
                }
            };
            let share = if is_product { 1.0 } else { allocation.factor(exchange) };

            if let (Some(costs), Some(cost)) = (asm.costs.as_mut(), exchange.cost) {
                let signed = if exchange.is_input() { cost } else { -cost };
                costs[col] += signed * share;
            }

            let direction = if exchange.is_input() { -1.0 } else { 1.0 };
            match target {
                Target::Tech(row) => {
                    let waste = if flow.flow_type == FlowType::Waste { -1.0 } else { 1.0 };
                    let conversion = self.conversion(exchange, &process.name)?;
                    asm.tech.add(self.cell(row, col, direction * waste * conversion * share, exchange, &scope));
                }
                Target::Flow(row) => {
                    let conversion = self.conversion(exchange, &process.name)?;
                    asm.flows.add(self.cell(row, col, direction * conversion * share, exchange, &scope));
                }
                Target::CutOff => {
                    tracing::trace!(process = %pid, exchange = %exchange.id, "cut-off exchange");
                }
            }
        }
        Ok(())
    }

    /// A nested product system is solved for its own target amount; its
    /// column holds that amount on the diagonal and the resulting total flows.
    fn fill_system_column(
        &mut self,
        asm: &mut Assembly,
        col: usize,
        sid: SystemId,
        setup: &CalculationSetup,
    ) -> Result<Arc<TechIndex>> {
        let sub_system = self
            .registry
            .system(sid)
            .ok_or_else(|| LcaError::structural(format!("product system {} does not exist", sid)))?;
        let mut sub_setup = CalculationSetup::of(sub_system);
        sub_setup.allocation = setup.allocation;
        sub_setup.with_costs = setup.with_costs;
        let sub = self.build(&sub_setup)?;

        let s = self.solver.solve(sub.tech_matrix.as_ref(), 0, sub.demand())?;
        let g = self.solver.multiply_vec(sub.flow_matrix.as_ref(), &s)?;

        asm.tech.add(fixed_cell(col, col, sub.demand()));
        for (i, flow) in sub.flow_index.iter() {
            if g[i] == 0.0 {
                continue;
            }
            let direction = if sub.flow_index.is_input(i) { Direction::Input } else { Direction::Output };
            let row = asm.flow_index.put(flow.clone(), direction);
            asm.flows.add(fixed_cell(row, col, g[i]));
        }
        if let (Some(costs), Some(sub_costs)) = (asm.costs.as_mut(), &sub.cost_vector) {
            costs[col] += sub_costs.iter().zip(&s).map(|(c, s)| c * s).sum::<f64>();
        }
        Ok(sub.tech_index.clone())
    }

    fn cell(&self, row: usize, col: usize, factor: f64, exchange: &Exchange, scope: &ParameterScope) -> ExchangeCell {
        let formula = exchange.formula.as_deref().and_then(|f| match Expr::parse(f) {
            Ok(expr) => Some(Arc::new(expr)),
            Err(e) => {
                tracing::warn!(exchange = %exchange.id, error = %e, "invalid amount formula; using stored amount");
                None
            }
        });
        ExchangeCell {
            row,
            col,
            factor,
            amount: exchange.amount,
            formula,
            scope: scope.clone(),
            uncertainty: exchange.uncertainty.clone(),
        }
    }

    fn descriptor(&self, flow: &Flow) -> FlowDescriptor {
        self.flow_table
            .as_ref()
            .and_then(|t| t.get(flow.id).cloned())
            .unwrap_or_else(|| FlowDescriptor::from(flow))
    }

    /// Factor converting the exchange unit into the reference unit of its flow.
    fn conversion(&self, exchange: &Exchange, process: &str) -> Result<f64> {
        let factor = match &self.conversions {
            Some(table) => table.factor(exchange.flow, exchange.unit, exchange.property),
            None => self.registry.exchange_amount(exchange, 1.0),
        };
        factor.filter(|f| f.is_finite()).ok_or_else(|| {
            LcaError::structural(format!(
                "amount of exchange {} in process '{}' cannot be converted to the reference unit",
                exchange.id, process
            ))
        })
    }

    fn assemble(
        &self,
        cells: &CellTable,
        rows: usize,
        cols: usize,
        interpreter: &crate::formula::Interpreter,
    ) -> Box<dyn Matrix> {
        let mut matrix = HashPointMatrix::new(rows, cols);
        cells.fill(&mut matrix, interpreter);
        match self.storage.layout_for(rows, cols, matrix.nonzeros()) {
            Layout::Dense => Box::new(matrix.to_dense()),
            Layout::Sparse => Box::new(matrix.compress()),
        }
    }
}

fn fixed_cell(row: usize, col: usize, value: f64) -> ExchangeCell {
    ExchangeCell {
        row,
        col,
        factor: 1.0,
        amount: value,
        formula: None,
        scope: ParameterScope::Global,
        uncertainty: None,
    }
}
