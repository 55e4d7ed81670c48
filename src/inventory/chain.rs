//! Resolution of the process links of a product system.
use super::allocation::{is_linkable, is_product_exchange};
use crate::error::{LcaError, Result};
use crate::index::{ProcessProduct, TechIndex};
use crate::model::{ExchangeId, FlowId, ProcessId, ProcessLink, ProductSystem, Provider, Registry, SystemId};
use std::collections::{HashMap, VecDeque};

/// The topology of a product system: the technosphere index and the provider
/// of every linked exchange, per column.
///
/// It does not depend on the demand or on parameter values, so it can be
/// shared between calculations of the same system.
#[derive(Debug, Clone)]
pub struct SupplyChain {
    pub system: SystemId,
    tech_index: TechIndex,
    providers: HashMap<(usize, ExchangeId), usize>,
}

impl SupplyChain {
    /// Walks the links breadth-first, starting at the reference product.
    /// Exchanges without a link are cut off.
    pub fn build(registry: &Registry, system: &ProductSystem) -> Result<Self> {
        check_links(registry, system)?;

        let mut by_exchange: HashMap<(ProcessId, ExchangeId), &ProcessLink> = HashMap::new();
        let mut by_flow: HashMap<(ProcessId, FlowId), &ProcessLink> = HashMap::new();
        // a link that names its exchange covers only that exchange
        for link in &system.links {
            match link.exchange {
                Some(exchange) => by_exchange.entry((link.process, exchange)).or_insert(link),
                None => by_flow.entry((link.process, link.flow)).or_insert(link),
            };
        }

        let reference = registry.process(system.reference_process).ok_or_else(|| {
            LcaError::structural(format!("reference process {} does not exist", system.reference_process))
        })?;
        let ref_exchange = reference.exchange(system.reference_exchange).ok_or_else(|| {
            LcaError::structural(format!("reference exchange {} does not exist", system.reference_exchange))
        })?;
        let ref_product =
            ProcessProduct::of_process(reference.id, ref_exchange.flow).with_location(reference.location);

        let mut tech_index = TechIndex::new(ref_product, system.target_amount);
        let mut providers = HashMap::new();
        let mut queue = VecDeque::from([0usize]);
        let mut cutoffs = 0usize;

        while let Some(col) = queue.pop_front() {
            let Some(Provider::Process(pid)) = tech_index.at(col).map(|p| p.provider) else { continue };
            let Some(process) = registry.process(pid) else { continue };
            for exchange in process.exchanges.iter().filter(|e| is_linkable(registry, e)) {
                let link = by_exchange.get(&(pid, exchange.id)).or_else(|| by_flow.get(&(pid, exchange.flow)));
                let Some(link) = link else {
                    cutoffs += 1;
                    continue;
                };
                let product = match link.provider {
                    Provider::Process(p) => ProcessProduct::of_process(p, link.flow)
                        .with_location(registry.process(p).and_then(|p| p.location)),
                    Provider::System(s) => ProcessProduct::of_system(s, link.flow),
                };
                let known = tech_index.contains(&product);
                let row = tech_index.put(product);
                if !known {
                    queue.push_back(row);
                }
                providers.insert((col, exchange.id), row);
            }
        }

        tracing::debug!(
            system = %system.id,
            products = tech_index.size(),
            links = providers.len(),
            cutoffs,
            "supply chain built"
        );
        Ok(Self { system: system.id, tech_index, providers })
    }

    pub fn tech_index(&self) -> &TechIndex {
        &self.tech_index
    }

    /// Row of the provider linked to `exchange` in column `col`; `None` for
    /// cut-off exchanges.
    pub fn provider(&self, col: usize, exchange: ExchangeId) -> Option<usize> {
        self.providers.get(&(col, exchange)).copied()
    }

    pub fn link_count(&self) -> usize {
        self.providers.len()
    }

    /// Distinct processes of the chain in column order.
    pub fn processes(&self) -> Vec<ProcessId> {
        let mut seen = Vec::new();
        for (_, product) in self.tech_index.iter() {
            if let Some(p) = product.process() {
                if !seen.contains(&p) {
                    seen.push(p);
                }
            }
        }
        seen
    }
}

fn check_links(registry: &Registry, system: &ProductSystem) -> Result<()> {
    for link in &system.links {
        let consumer = registry.process(link.process).ok_or_else(|| {
            LcaError::structural(format!("link to flow {} starts at unknown process {}", link.flow, link.process))
        })?;
        if registry.flow(link.flow).is_none() {
            return Err(LcaError::structural(format!("link of process {} uses unknown flow {}", link.process, link.flow)));
        }
        if let Some(exchange) = link.exchange {
            if consumer.exchange(exchange).is_none() {
                return Err(LcaError::structural(format!(
                    "process '{}' has no exchange {} to link",
                    consumer.name, exchange
                )));
            }
        }
        match link.provider {
            Provider::Process(p) => {
                let provider = registry
                    .process(p)
                    .ok_or_else(|| LcaError::structural(format!("link refers to unknown provider process {}", p)))?;
                let delivers = provider
                    .exchanges
                    .iter()
                    .any(|e| e.flow == link.flow && is_product_exchange(registry, e));
                if !delivers {
                    return Err(LcaError::structural(format!(
                        "provider '{}' does not deliver flow {}",
                        provider.name, link.flow
                    )));
                }
            }
            Provider::System(s) => {
                if registry.system(s).is_none() {
                    return Err(LcaError::structural(format!("link refers to unknown product system {}", s)));
                }
            }
        }
    }
    Ok(())
}
