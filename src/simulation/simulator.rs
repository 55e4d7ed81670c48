use crate::calculation::LcaCalculator;
use crate::config::SimulationConfig;
use crate::error::{LcaError, Result};
use crate::inventory::MatrixData;
use crate::results::SimulationResult;
use crate::solver::MatrixSolver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type RunRow = (Vec<f64>, Option<Vec<f64>>);

/// Runs Monte-Carlo iterations over a fixed matrix topology.
///
/// Every run draws its values into private copies of the matrices, so runs
/// are independent of each other. Run `i` uses the random seed `seed + i`:
/// a batch gives the same rows as the same number of single runs.
pub struct Simulator {
    data: MatrixData,
    calculator: LcaCalculator,
    config: SimulationConfig,
    pool: Option<rayon::ThreadPool>,
    result: SimulationResult,
    next_index: usize,
    cancelled: Arc<AtomicBool>,
}

impl Simulator {
    pub fn new(data: MatrixData, solver: Arc<dyn MatrixSolver>, config: SimulationConfig) -> Result<Self> {
        let pool = match config.threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| LcaError::Config(format!("cannot create simulation thread pool: {}", e)))?,
            ),
            None => None,
        };
        if !data.cells.has_variation() && !data.parameters.has_uncertainty() {
            tracing::debug!("no uncertain values; all runs will be equal");
        }
        let result = SimulationResult::new(data.flow_index.clone(), data.impact_index.clone());
        Ok(Self {
            data,
            calculator: LcaCalculator::new(solver),
            config,
            pool,
            result,
            next_index: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Performs one run and appends its row. Returns `false` when the run
    /// failed or the simulation was cancelled.
    pub fn next_run(&mut self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let index = self.next_index;
        self.next_index += 1;
        match run_once(&self.data, &self.calculator, self.config.seed, index) {
            Ok((flows, impacts)) => {
                self.result.append(flows, impacts);
                true
            }
            Err(e) => {
                tracing::warn!(run = index, error = %e, "simulation run failed");
                self.result.record_failure();
                false
            }
        }
    }

    /// Performs `runs` runs in parallel and appends the rows in run order.
    /// Returns the number of successful runs.
    pub fn run_batch(&mut self, runs: usize) -> Result<usize> {
        let start = self.next_index;
        let span = tracing::info_span!("simulation_batch", start, runs);
        let _enter = span.enter();
        self.next_index += runs;

        let (data, calculator, seed, cancelled) = (&self.data, &self.calculator, self.config.seed, &self.cancelled);
        let job = || {
            (start..start + runs)
                .into_par_iter()
                .map(|index| {
                    if cancelled.load(Ordering::Relaxed) {
                        return None;
                    }
                    Some(run_once(data, calculator, seed, index))
                })
                .collect::<Vec<_>>()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        };

        let mut accepted = 0;
        for (offset, outcome) in outcomes.into_iter().enumerate() {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            match outcome {
                Some(Ok((flows, impacts))) => {
                    self.result.append(flows, impacts);
                    accepted += 1;
                }
                Some(Err(e)) => {
                    tracing::warn!(run = start + offset, error = %e, "simulation run failed");
                    self.result.record_failure();
                }
                None => break,
            }
        }
        if self.is_cancelled() {
            return Err(LcaError::Cancelled);
        }
        tracing::debug!(accepted, failed = self.result.failed_runs(), "batch finished");
        Ok(accepted)
    }

    /// Runs the configured number of runs as one batch.
    pub fn run(&mut self) -> Result<&SimulationResult> {
        self.run_batch(self.config.runs)?;
        Ok(&self.result)
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn into_result(self) -> SimulationResult {
        self.result
    }

    /// Stops the simulation before the next run starts. Rows of runs that
    /// finish after this call are not accepted.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Flag that cancels the simulation when set, e.g. from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

fn run_once(data: &MatrixData, calculator: &LcaCalculator, seed: u64, index: usize) -> Result<RunRow> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
    let interpreter = data.parameters.sample(&mut rng);

    let mut a = data.tech_matrix.copy();
    data.cells.tech.sample_into(a.as_mut(), &interpreter, &mut rng);
    let mut b = data.flow_matrix.copy();
    data.cells.flows.sample_into(b.as_mut(), &interpreter, &mut rng);
    let c = match &data.impact_matrix {
        Some(c) => {
            let mut c = c.copy();
            data.cells.impacts.sample_into(c.as_mut(), &interpreter, &mut rng);
            Some(c)
        }
        None => None,
    };

    let result = calculator.simple_with(data, a.as_ref(), b.as_ref(), c.as_deref())?;
    Ok((result.total_flows, result.total_impacts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::CalculationSetup;
    use crate::inventory::InventoryBuilder;
    use crate::model::*;
    use crate::solver::tests::{accelerated, portable};
    use crate::testing;
    use rstest::rstest;

    fn config(runs: usize) -> SimulationConfig {
        SimulationConfig { runs, seed: 7, threads: Some(2) }
    }

    fn simulator(registry: &Registry, setup: &CalculationSetup, solver: Arc<dyn MatrixSolver>) -> Simulator {
        let data = InventoryBuilder::new(registry, portable().as_ref()).build(setup).unwrap();
        Simulator::new(data, solver, config(20)).unwrap()
    }

    /// The loop system with a normally distributed emission of p1.
    fn uncertain_loop() -> (Registry, CalculationSetup) {
        let (mut registry, system) = testing::two_process_loop();
        let p1 = registry.processes.get_mut(&ProcessId(1)).unwrap();
        p1.exchanges[2].uncertainty = Some(Uncertainty::Normal { mean: 2.0, sd: 0.5 });
        registry.add_method(testing::climate_method(3.0));
        let setup = CalculationSetup::new(system, 1.0).with_impact_method(ImpactMethodId(1));
        (registry, setup)
    }

    #[rstest]
    #[case::portable(portable())]
    #[case::accelerated(accelerated())]
    fn test_without_uncertainty_there_is_no_variance(#[case] solver: Arc<dyn MatrixSolver>) {
        let (registry, system) = testing::single_process_system();
        let mut sim = simulator(&registry, &CalculationSetup::new(system, 10.0), solver);
        let result = sim.run().unwrap();
        assert_eq!(result.runs(), 20);
        let stats = result.flow_statistics(FlowId(20)).unwrap();
        assert_eq!(stats.sd, 0.0);
        assert!((stats.mean + 5.0).abs() < 1e-12);
        assert_eq!(stats.min, stats.max);
    }

    #[test]
    fn test_batch_equals_single_runs() {
        let (registry, setup) = uncertain_loop();
        let mut batch = simulator(&registry, &setup, portable());
        assert_eq!(batch.run_batch(8).unwrap(), 8);
        let mut single = simulator(&registry, &setup, portable());
        for _ in 0..8 {
            assert!(single.next_run());
        }
        assert_eq!(batch.result().flow_rows(), single.result().flow_rows());
        assert_eq!(batch.result().impact_rows(), single.result().impact_rows());
    }

    #[test]
    fn test_uncertain_exchange_varies_results() {
        let (registry, setup) = uncertain_loop();
        let mut sim = simulator(&registry, &setup, portable());
        sim.run().unwrap();
        let flows = sim.result().flow_results(FlowId(20));
        let impacts = sim.result().impact_results(ImpactCategoryId(1));
        assert_eq!(flows.len(), 20);
        assert!(sim.result().flow_statistics(FlowId(20)).unwrap().sd > 0.0);
        for (g, h) in flows.iter().zip(&impacts) {
            assert!((3.0 * g - h).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uncertain_parameter_flows_into_formula() {
        let (mut registry, system) = testing::single_process_system();
        let process = registry.processes.get_mut(&ProcessId(1)).unwrap();
        process.exchanges[1].formula = Some("2 * k".into());
        let mut k = Parameter::input("k", ParameterScope::Global, 1.0);
        k.uncertainty = Some(Uncertainty::Uniform { min: 1.0, max: 2.0 });
        process.parameters.push(k);
        let mut sim = simulator(&registry, &CalculationSetup::new(system, 2.0), portable());
        sim.run().unwrap();
        // one process run with an input of 2k, k in [1, 2]
        for g in sim.result().flow_results(FlowId(20)) {
            assert!((-4.0..=-2.0).contains(&g), "{}", g);
        }
    }

    #[test]
    fn test_failed_runs_are_counted() {
        let (mut registry, system) = testing::single_process_system();
        let process = registry.processes.get_mut(&ProcessId(1)).unwrap();
        // the reference output is always 0, which makes A singular
        process.exchanges[0].uncertainty = Some(Uncertainty::Uniform { min: 0.0, max: 0.0 });
        let mut sim = simulator(&registry, &CalculationSetup::new(system, 1.0), portable());
        assert_eq!(sim.run_batch(5).unwrap(), 0);
        assert_eq!(sim.result().failed_runs(), 5);
        assert_eq!(sim.result().runs(), 0);
    }

    #[test]
    fn test_cancelled_simulation_stops() {
        let (registry, setup) = uncertain_loop();
        let mut sim = simulator(&registry, &setup, portable());
        sim.cancel();
        assert!(!sim.next_run());
        assert!(matches!(sim.run_batch(4), Err(LcaError::Cancelled)));
        assert_eq!(sim.result().runs(), 0);
    }
}
