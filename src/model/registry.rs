use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory store of the structural records a calculation consumes.
///
/// The registry is the hand-over point to the data-provider collaborators: they
/// fill it from whatever storage they use, the calculation core only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredRegistry")]
pub struct Registry {
    pub flows: HashMap<FlowId, Flow>,
    pub flow_properties: HashMap<FlowPropertyId, FlowProperty>,
    pub processes: HashMap<ProcessId, Process>,
    pub systems: HashMap<SystemId, ProductSystem>,
    pub methods: HashMap<ImpactMethodId, ImpactMethod>,
    pub global_parameters: Vec<Parameter>,

    // Derived lookup, rebuilt on insert and after deserialization.
    #[serde(skip)]
    units: HashMap<UnitId, (FlowPropertyId, f64)>,
}

/// The serialized form of a registry, without derived lookups.
#[derive(Deserialize)]
struct StoredRegistry {
    #[serde(default)]
    flows: HashMap<FlowId, Flow>,
    #[serde(default)]
    flow_properties: HashMap<FlowPropertyId, FlowProperty>,
    #[serde(default)]
    processes: HashMap<ProcessId, Process>,
    #[serde(default)]
    systems: HashMap<SystemId, ProductSystem>,
    #[serde(default)]
    methods: HashMap<ImpactMethodId, ImpactMethod>,
    #[serde(default)]
    global_parameters: Vec<Parameter>,
}

impl From<StoredRegistry> for Registry {
    fn from(stored: StoredRegistry) -> Self {
        let mut registry = Self {
            flows: stored.flows,
            flow_properties: stored.flow_properties,
            processes: stored.processes,
            systems: stored.systems,
            methods: stored.methods,
            global_parameters: stored.global_parameters,
            units: HashMap::new(),
        };
        registry.rebuild_units();
        registry
    }
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    fn rebuild_units(&mut self) {
        self.units.clear();
        for property in self.flow_properties.values() {
            for unit in &property.units {
                self.units.insert(unit.id, (property.id, unit.conversion_factor));
            }
        }
    }

    pub fn add_flow(&mut self, flow: Flow) -> FlowId {
        let id = flow.id;
        self.flows.insert(id, flow);
        id
    }

    pub fn add_flow_property(&mut self, property: FlowProperty) -> FlowPropertyId {
        let id = property.id;
        for unit in &property.units {
            self.units.insert(unit.id, (id, unit.conversion_factor));
        }
        self.flow_properties.insert(id, property);
        id
    }

    pub fn add_process(&mut self, process: Process) -> ProcessId {
        let id = process.id;
        self.processes.insert(id, process);
        id
    }

    pub fn add_system(&mut self, system: ProductSystem) -> SystemId {
        let id = system.id;
        self.systems.insert(id, system);
        id
    }

    pub fn add_method(&mut self, method: ImpactMethod) -> ImpactMethodId {
        let id = method.id;
        self.methods.insert(id, method);
        id
    }

    pub fn add_global_parameter(&mut self, parameter: Parameter) {
        self.global_parameters.push(parameter);
    }

    pub fn flow(&self, id: FlowId) -> Option<&Flow> { self.flows.get(&id) }
    pub fn process(&self, id: ProcessId) -> Option<&Process> { self.processes.get(&id) }
    pub fn system(&self, id: SystemId) -> Option<&ProductSystem> { self.systems.get(&id) }
    pub fn method(&self, id: ImpactMethodId) -> Option<&ImpactMethod> { self.methods.get(&id) }

    /// Conversion factor of a unit into the reference unit of its flow property.
    pub fn unit_factor(&self, unit: UnitId) -> Option<f64> {
        self.units.get(&unit).map(|&(_, factor)| factor)
    }

    /// Converts an amount given in `unit` of `property` into the reference
    /// unit of the reference flow property of `flow`:
    /// `amount * unit_factor / property_factor`.
    ///
    /// Returns `None` when the unit, the flow property or the flow is unknown.
    pub fn reference_amount(
        &self,
        flow: FlowId,
        amount: f64,
        unit: Option<UnitId>,
        property: Option<FlowPropertyId>,
    ) -> Option<f64> {
        let flow = self.flow(flow)?;
        let mut value = amount;
        if let Some(unit) = unit {
            let (unit_property, factor) = *self.units.get(&unit)?;
            if let Some(p) = property {
                if p != unit_property {
                    return None;
                }
            }
            value *= factor;
            value /= flow.property_factor(unit_property)?;
        } else if let Some(p) = property {
            value /= flow.property_factor(p)?;
        }
        Some(value)
    }

    /// Reference amount of an exchange.
    pub fn exchange_amount(&self, exchange: &Exchange, amount: f64) -> Option<f64> {
        self.reference_amount(exchange.flow, amount, exchange.unit, exchange.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mass_registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_flow_property(FlowProperty {
            id: FlowPropertyId(1),
            name: "Mass".into(),
            units: vec![
                Unit { id: UnitId(1), name: "kg".into(), conversion_factor: 1.0 },
                Unit { id: UnitId(2), name: "t".into(), conversion_factor: 1000.0 },
            ],
        });
        reg.add_flow_property(FlowProperty {
            id: FlowPropertyId(2),
            name: "Volume".into(),
            units: vec![Unit { id: UnitId(3), name: "m3".into(), conversion_factor: 1.0 }],
        });
        reg.add_flow(Flow {
            id: FlowId(1),
            name: "water".into(),
            flow_type: FlowType::Product,
            reference_property: FlowPropertyId(1),
            property_factors: vec![
                FlowPropertyFactor { property: FlowPropertyId(1), conversion_factor: 1.0 },
                FlowPropertyFactor { property: FlowPropertyId(2), conversion_factor: 0.001 },
            ],
            polarity: None,
        });
        reg
    }

    #[test]
    fn test_reference_amount_conversions() {
        let reg = mass_registry();
        assert_eq!(reg.reference_amount(FlowId(1), 2.0, None, None), Some(2.0));
        assert_eq!(reg.reference_amount(FlowId(1), 2.0, Some(UnitId(2)), None), Some(2000.0));
        // 1 m3 of water = 1000 kg
        let v = reg.reference_amount(FlowId(1), 1.0, Some(UnitId(3)), Some(FlowPropertyId(2))).unwrap();
        assert!((v - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_unresolvable_conversion_is_none() {
        let reg = mass_registry();
        assert_eq!(reg.reference_amount(FlowId(1), 1.0, Some(UnitId(99)), None), None);
        assert_eq!(reg.reference_amount(FlowId(1), 1.0, Some(UnitId(1)), Some(FlowPropertyId(2))), None);
        assert_eq!(reg.reference_amount(FlowId(9), 1.0, None, None), None);
    }

    #[test]
    fn test_units_resolve_after_json_round_trip() {
        let reg = mass_registry();
        let json = serde_json::to_string(&reg).unwrap();
        let restored: Registry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.unit_factor(UnitId(2)), Some(1000.0));
        assert_eq!(
            restored.reference_amount(FlowId(1), 2.0, Some(UnitId(2)), None),
            reg.reference_amount(FlowId(1), 2.0, Some(UnitId(2)), None)
        );
        let empty: Registry = serde_json::from_str("{}").unwrap();
        assert!(empty.flows.is_empty());
    }
}
