//! Allocation of multi-output processes onto a single product.
use crate::model::{AllocationMethod, Exchange, FlowId, FlowType, Process, Registry};

/// Products of a process: its product outputs and waste inputs.
pub fn products<'p>(registry: &Registry, process: &'p Process) -> Vec<&'p Exchange> {
    process
        .exchanges
        .iter()
        .filter(|e| is_product_exchange(registry, e))
        .collect()
}

pub fn is_product_exchange(registry: &Registry, exchange: &Exchange) -> bool {
    match registry.flow(exchange.flow).map(|f| f.flow_type) {
        Some(FlowType::Product) => !exchange.is_input(),
        Some(FlowType::Waste) => exchange.is_input(),
        _ => false,
    }
}

/// Exchanges that need a provider: product inputs and waste outputs.
pub fn is_linkable(registry: &Registry, exchange: &Exchange) -> bool {
    match registry.flow(exchange.flow).map(|f| f.flow_type) {
        Some(FlowType::Product) => exchange.is_input(),
        Some(FlowType::Waste) => !exchange.is_input(),
        _ => false,
    }
}

/// Resolves allocation factors of one process for one of its products.
#[derive(Debug, Clone, Copy)]
pub struct Allocation<'p> {
    process: &'p Process,
    method: Option<AllocationMethod>,
    product: FlowId,
}

impl<'p> Allocation<'p> {
    /// `method` overrides the default method of the process. Allocation is
    /// disabled for single-output processes.
    pub fn new(
        registry: &Registry,
        process: &'p Process,
        product: FlowId,
        method: Option<AllocationMethod>,
    ) -> Self {
        let multi_output = products(registry, process).len() > 1;
        let method = if multi_output { method.or(process.default_allocation) } else { None };
        Self { process, method, product }
    }

    /// The share of `exchange` that is allocated to the product. A missing
    /// factor counts as 1.
    pub fn factor(&self, exchange: &Exchange) -> f64 {
        let Some(method) = self.method else { return 1.0 };
        let matches = |f: &&crate::model::AllocationFactor| {
            f.method == method
                && f.product == self.product
                && match method {
                    AllocationMethod::Causal => f.exchange == Some(exchange.id),
                    _ => true,
                }
        };
        self.process
            .allocation_factors
            .iter()
            .find(matches)
            .map_or(1.0, |f| f.value)
    }
}
