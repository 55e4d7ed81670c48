//! Read-only lookup tables derived from the registry.
use crate::index::FlowDescriptor;
use crate::model::{FlowId, FlowPropertyId, Registry, UnitId};
use std::collections::HashMap;

/// Flow metadata by id.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    flows: HashMap<FlowId, FlowDescriptor>,
}

impl FlowTable {
    pub fn build(registry: &Registry) -> Self {
        let flows = registry.flows.values().map(|f| (f.id, FlowDescriptor::from(f))).collect();
        Self { flows }
    }

    pub fn get(&self, flow: FlowId) -> Option<&FlowDescriptor> {
        self.flows.get(&flow)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Unit and flow property factors, flattened for fast reference amount
/// conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    units: HashMap<UnitId, (FlowPropertyId, f64)>,
    properties: HashMap<(FlowId, FlowPropertyId), f64>,
    references: HashMap<FlowId, FlowPropertyId>,
}

impl ConversionTable {
    pub fn build(registry: &Registry) -> Self {
        let mut units = HashMap::new();
        for property in registry.flow_properties.values() {
            for unit in &property.units {
                units.insert(unit.id, (property.id, unit.conversion_factor));
            }
        }
        let mut properties = HashMap::new();
        let mut references = HashMap::new();
        for flow in registry.flows.values() {
            references.insert(flow.id, flow.reference_property);
            properties.insert((flow.id, flow.reference_property), 1.0);
            for f in &flow.property_factors {
                properties.insert((flow.id, f.property), f.conversion_factor);
            }
        }
        Self { units, properties, references }
    }

    /// The factor that converts one `unit` of `property` into the reference
    /// unit of `flow`, with the same rules as `Registry::reference_amount`.
    pub fn factor(&self, flow: FlowId, unit: Option<UnitId>, property: Option<FlowPropertyId>) -> Option<f64> {
        match (unit, property) {
            (None, None) => self.references.contains_key(&flow).then_some(1.0),
            (Some(unit), p) => {
                let (unit_property, factor) = *self.units.get(&unit)?;
                if p.is_some_and(|p| p != unit_property) {
                    return None;
                }
                Some(factor / self.properties.get(&(flow, unit_property))?)
            }
            (None, Some(p)) => Some(1.0 / self.properties.get(&(flow, p))?),
        }
    }
}
