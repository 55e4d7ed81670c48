use crate::model::{
    AllocationMethod, FlowPropertyId, ImpactMethodId, NwSetId, ParameterRedef, ProductSystem, Registry, SystemId,
    UnitId,
};
use serde::{Deserialize, Serialize};

/// What to calculate: a product system, the demanded amount and the optional
/// impact assessment, cost and parameter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSetup {
    pub system: SystemId,
    pub amount: f64,
    /// Unit of `amount`; the system's target unit when not set.
    #[serde(default)]
    pub unit: Option<UnitId>,
    /// Flow property of `unit`; the system's target property when not set.
    #[serde(default)]
    pub property: Option<FlowPropertyId>,
    #[serde(default)]
    pub impact_method: Option<ImpactMethodId>,
    #[serde(default)]
    pub nw_set: Option<NwSetId>,
    /// Applied after the redefinitions stored in the product system.
    #[serde(default)]
    pub parameter_redefs: Vec<ParameterRedef>,
    #[serde(default)]
    pub with_costs: bool,
    /// Overrides the default allocation method of every process.
    #[serde(default)]
    pub allocation: Option<AllocationMethod>,
}

impl CalculationSetup {
    pub fn new(system: SystemId, amount: f64) -> Self {
        Self {
            system,
            amount,
            unit: None,
            property: None,
            impact_method: None,
            nw_set: None,
            parameter_redefs: Vec::new(),
            with_costs: false,
            allocation: None,
        }
    }

    /// A setup for the target amount of the given system.
    pub fn of(system: &ProductSystem) -> Self {
        let mut setup = Self::new(system.id, system.target_amount);
        setup.unit = system.target_unit;
        setup.property = system.target_property;
        setup
    }

    pub fn with_unit(mut self, unit: UnitId, property: FlowPropertyId) -> Self {
        self.unit = Some(unit);
        self.property = Some(property);
        self
    }

    pub fn with_impact_method(mut self, method: ImpactMethodId) -> Self {
        self.impact_method = Some(method);
        self
    }

    pub fn with_nw_set(mut self, nw_set: NwSetId) -> Self {
        self.nw_set = Some(nw_set);
        self
    }

    pub fn with_costs(mut self) -> Self {
        self.with_costs = true;
        self
    }

    pub fn with_allocation(mut self, method: AllocationMethod) -> Self {
        self.allocation = Some(method);
        self
    }

    pub fn with_redef(mut self, redef: ParameterRedef) -> Self {
        self.parameter_redefs.push(redef);
        self
    }

    /// The redefinitions of the system followed by the ones of this setup.
    pub fn redefs_for(&self, system: &ProductSystem) -> Vec<ParameterRedef> {
        let mut redefs = system.parameter_redefs.clone();
        redefs.extend(self.parameter_redefs.iter().cloned());
        redefs
    }

    /// The demanded amount in the reference unit of the reference flow, or
    /// `None` when the reference exchange or the unit cannot be resolved.
    pub fn demand(&self, registry: &Registry, system: &ProductSystem) -> Option<f64> {
        let process = registry.process(system.reference_process)?;
        let exchange = process.exchange(system.reference_exchange)?;
        registry.reference_amount(exchange.flow, self.amount, self.unit, self.property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_from_json_uses_defaults() {
        let setup: CalculationSetup = serde_json::from_str(r#"{ "system": 4, "amount": 2.5 }"#).unwrap();
        assert_eq!(setup, CalculationSetup::new(SystemId(4), 2.5));
        assert!(!setup.with_costs);
    }
}
