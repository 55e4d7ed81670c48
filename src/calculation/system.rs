use super::calculator::LcaCalculator;
use super::dispatch::{dispatch, CalculationHandle};
use super::setup::CalculationSetup;
use crate::cache::MatrixCache;
use crate::config::EngineConfig;
use crate::error::{LcaError, Result};
use crate::inventory::{InventoryBuilder, MatrixData};
use crate::model::Registry;
use crate::results::{ContributionResult, FullResult, SimpleResult};
use crate::simulation::Simulator;
use crate::solver::{create_solver, MatrixSolver};
use crate::validation::Validator;
use std::sync::Arc;

/// Entry point for calculations of product systems: validates a setup,
/// builds its matrices with the shared cache and calculates the result.
///
/// Cloning is cheap; clones share the cache and the solver.
#[derive(Debug, Clone)]
pub struct SystemCalculator {
    cache: Arc<MatrixCache>,
    config: EngineConfig,
    solver: Arc<dyn MatrixSolver>,
}

impl SystemCalculator {
    pub fn new(cache: Arc<MatrixCache>, config: EngineConfig) -> Self {
        let solver = create_solver(config.solver);
        tracing::debug!(solver = solver.name(), "system calculator created");
        Self { cache, config, solver }
    }

    /// A calculator with its own cache over `registry`.
    pub fn of_registry(registry: Registry, config: EngineConfig) -> Self {
        let cache = Arc::new(MatrixCache::new(Arc::new(registry), config.cache));
        Self::new(cache, config)
    }

    pub fn with_solver(mut self, solver: Arc<dyn MatrixSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn cache(&self) -> &Arc<MatrixCache> {
        &self.cache
    }

    pub fn solver(&self) -> &Arc<dyn MatrixSolver> {
        &self.solver
    }

    /// Validates the setup and builds the matrices of its product system.
    pub fn prepare(&self, setup: &CalculationSetup) -> Result<MatrixData> {
        let snapshot = self.cache.snapshot();
        Validator::new(snapshot.registry()).validate(setup).map_err(LcaError::Validation)?;
        InventoryBuilder::from_snapshot(&snapshot, self.solver.as_ref())
            .with_storage(self.config.storage.clone())
            .build(setup)
    }

    pub fn calculate_simple(&self, setup: &CalculationSetup) -> Result<SimpleResult> {
        let data = self.prepare(setup)?;
        self.calculator().calculate_simple(&data)
    }

    pub fn calculate_contributions(&self, setup: &CalculationSetup) -> Result<ContributionResult> {
        let data = self.prepare(setup)?;
        self.calculator().calculate_contributions(&data)
    }

    pub fn calculate_full(&self, setup: &CalculationSetup) -> Result<FullResult> {
        let data = self.prepare(setup)?;
        self.calculator().calculate_full(&data)
    }

    /// A simulator over the matrices of the setup, configured with the
    /// simulation settings of the engine.
    pub fn simulator(&self, setup: &CalculationSetup) -> Result<Simulator> {
        let data = self.prepare(setup)?;
        Simulator::new(data, self.solver.clone(), self.config.simulation.clone())
    }

    /// Runs a simple calculation on a worker thread.
    pub fn dispatch_simple(&self, setup: CalculationSetup) -> CalculationHandle<SimpleResult> {
        let calculator = self.clone();
        dispatch(move || calculator.calculate_simple(&setup))
    }

    pub fn dispatch_full(&self, setup: CalculationSetup) -> CalculationHandle<FullResult> {
        let calculator = self.clone();
        dispatch(move || calculator.calculate_full(&setup))
    }

    fn calculator(&self) -> LcaCalculator {
        LcaCalculator::new(self.solver.clone())
    }
}
