use super::tables::{ConversionTable, FlowTable};
use crate::config::CacheMode;
use crate::error::{LcaError, Result};
use crate::inventory::SupplyChain;
use crate::model::{Registry, SystemId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// One generation of cached tables. A reload replaces the whole generation,
/// so a calculation that holds a snapshot sees one consistent registry.
#[derive(Debug)]
pub struct CacheSnapshot {
    registry: Arc<Registry>,
    flows: OnceLock<Arc<FlowTable>>,
    conversions: OnceLock<Arc<ConversionTable>>,
    chains: RwLock<HashMap<SystemId, Arc<SupplyChain>>>,
}

impl CacheSnapshot {
    fn new(registry: Arc<Registry>) -> Self {
        Self { registry, flows: OnceLock::new(), conversions: OnceLock::new(), chains: RwLock::new(HashMap::new()) }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn flow_table(&self) -> Arc<FlowTable> {
        self.flows.get_or_init(|| Arc::new(FlowTable::build(&self.registry))).clone()
    }

    pub fn conversions(&self) -> Arc<ConversionTable> {
        self.conversions.get_or_init(|| Arc::new(ConversionTable::build(&self.registry))).clone()
    }

    /// The memoized supply chain of a product system.
    pub fn supply_chain(&self, system: SystemId) -> Result<Arc<SupplyChain>> {
        if let Some(chain) = self.chains.read().unwrap_or_else(|e| e.into_inner()).get(&system) {
            return Ok(chain.clone());
        }
        let record = self
            .registry
            .system(system)
            .ok_or_else(|| LcaError::structural(format!("product system {} does not exist", system)))?;
        let chain = Arc::new(SupplyChain::build(&self.registry, record)?);
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        // another thread may have built it in the meantime
        Ok(chains.entry(system).or_insert(chain).clone())
    }

    pub fn cached_chains(&self) -> usize {
        self.chains.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn populate(&self) {
        self.flow_table();
        self.conversions();
        let mut ids: Vec<SystemId> = self.registry.systems.keys().copied().collect();
        ids.sort();
        for id in ids {
            if let Err(e) = self.supply_chain(id) {
                tracing::warn!(system = %id, error = %e, "could not pre-build supply chain");
            }
        }
    }
}

/// Reusable lookups shared by calculations over the same registry.
///
/// Constructed once and passed by reference (or `Arc`) to whatever needs it.
/// All tables are read-only once populated.
#[derive(Debug)]
pub struct MatrixCache {
    mode: CacheMode,
    current: RwLock<Arc<CacheSnapshot>>,
}

impl MatrixCache {
    pub fn new(registry: Arc<Registry>, mode: CacheMode) -> Self {
        let snapshot = Arc::new(CacheSnapshot::new(registry));
        if mode == CacheMode::Eager {
            snapshot.populate();
        }
        Self { mode, current: RwLock::new(snapshot) }
    }

    /// The current generation; it stays valid when the cache is reloaded.
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.snapshot().registry.clone()
    }

    pub fn flow_table(&self) -> Arc<FlowTable> {
        self.snapshot().flow_table()
    }

    pub fn conversions(&self) -> Arc<ConversionTable> {
        self.snapshot().conversions()
    }

    pub fn supply_chain(&self, system: SystemId) -> Result<Arc<SupplyChain>> {
        self.snapshot().supply_chain(system)
    }

    pub fn cached_chains(&self) -> usize {
        self.snapshot().cached_chains()
    }

    /// Discards all tables and starts over with `registry`.
    pub fn reload(&self, registry: Arc<Registry>) {
        tracing::debug!("reloading matrix cache");
        let snapshot = Arc::new(CacheSnapshot::new(registry));
        if self.mode == CacheMode::Eager {
            snapshot.populate();
        }
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }
}
