use super::uncertainty::Uncertainty;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
            pub struct $name(pub u64);

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

id_type!(
    FlowId,
    ProcessId,
    SystemId,
    ExchangeId,
    ImpactMethodId,
    ImpactCategoryId,
    NwSetId,
    UnitId,
    FlowPropertyId,
    LocationId,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowType {
    Elementary,
    Product,
    Waste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn is_input(self) -> bool {
        self == Direction::Input
    }
}

/// Conversion factor of a flow into one of its flow properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPropertyFactor {
    pub property: FlowPropertyId,
    pub conversion_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub flow_type: FlowType,
    pub reference_property: FlowPropertyId,
    #[serde(default)]
    pub property_factors: Vec<FlowPropertyFactor>,
    /// Fixed polarity of an elementary flow (e.g. resources are inputs).
    #[serde(default)]
    pub polarity: Option<Direction>,
}

impl Flow {
    pub fn property_factor(&self, property: FlowPropertyId) -> Option<f64> {
        self.property_factors
            .iter()
            .find(|f| f.property == property)
            .map(|f| f.conversion_factor)
            .or_else(|| (property == self.reference_property).then_some(1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub conversion_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowProperty {
    pub id: FlowPropertyId,
    pub name: String,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub flow: FlowId,
    pub direction: Direction,
    pub amount: f64,
    #[serde(default)]
    pub formula: Option<String>,
    /// Unit of `amount`; `None` means the reference unit of the flow.
    #[serde(default)]
    pub unit: Option<UnitId>,
    /// Flow property of `amount`; `None` means the reference property.
    #[serde(default)]
    pub property: Option<FlowPropertyId>,
    #[serde(default)]
    pub uncertainty: Option<Uncertainty>,
    /// Net cost of this exchange in the process' currency.
    #[serde(default)]
    pub cost: Option<f64>,
}

impl Exchange {
    pub fn is_input(&self) -> bool {
        self.direction.is_input()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationMethod {
    Physical,
    Economic,
    Causal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationFactor {
    pub method: AllocationMethod,
    /// The product flow the share is allocated to.
    pub product: FlowId,
    /// Only set for causal factors, which are given per exchange.
    #[serde(default)]
    pub exchange: Option<ExchangeId>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterScope {
    Global,
    Process(ProcessId),
    ImpactMethod(ImpactMethodId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub scope: ParameterScope,
    pub value: f64,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub uncertainty: Option<Uncertainty>,
}

impl Parameter {
    pub fn input(name: impl Into<String>, scope: ParameterScope, value: f64) -> Self {
        Self { name: name.into(), scope, value, formula: None, uncertainty: None }
    }

    pub fn calculated(name: impl Into<String>, scope: ParameterScope, formula: impl Into<String>) -> Self {
        Self { name: name.into(), scope, value: 0.0, formula: Some(formula.into()), uncertainty: None }
    }

    pub fn is_input(&self) -> bool {
        self.formula.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub reference_exchange: ExchangeId,
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub default_allocation: Option<AllocationMethod>,
    #[serde(default)]
    pub allocation_factors: Vec<AllocationFactor>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub location: Option<LocationId>,
}

impl Process {
    pub fn exchange(&self, id: ExchangeId) -> Option<&Exchange> {
        self.exchanges.iter().find(|e| e.id == id)
    }

    pub fn reference(&self) -> Option<&Exchange> {
        self.exchange(self.reference_exchange)
    }
}

/// The provider side of a process link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    Process(ProcessId),
    /// A nested product system solved before it is used as a column.
    System(SystemId),
}

/// States that `provider` delivers `flow` to the exchange `exchange` of `process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessLink {
    pub process: ProcessId,
    #[serde(default)]
    pub exchange: Option<ExchangeId>,
    pub flow: FlowId,
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRedef {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub context: Option<RedefContext>,
    #[serde(default)]
    pub uncertainty: Option<Uncertainty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedefContext {
    Process(ProcessId),
    ImpactMethod(ImpactMethodId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSystem {
    pub id: SystemId,
    pub name: String,
    pub reference_process: ProcessId,
    pub reference_exchange: ExchangeId,
    pub target_amount: f64,
    #[serde(default)]
    pub target_unit: Option<UnitId>,
    #[serde(default)]
    pub target_property: Option<FlowPropertyId>,
    #[serde(default)]
    pub links: Vec<ProcessLink>,
    #[serde(default)]
    pub parameter_redefs: Vec<ParameterRedef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactFactor {
    pub flow: FlowId,
    /// Characterization factor per reference unit of the flow.
    pub value: f64,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub uncertainty: Option<Uncertainty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactCategory {
    pub id: ImpactCategoryId,
    pub name: String,
    #[serde(default)]
    pub reference_unit: Option<String>,
    pub factors: Vec<ImpactFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NwFactor {
    pub category: ImpactCategoryId,
    #[serde(default)]
    pub normalisation: Option<f64>,
    #[serde(default)]
    pub weighting: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NwSet {
    pub id: NwSetId,
    pub name: String,
    #[serde(default)]
    pub weighted_score_unit: Option<String>,
    pub factors: Vec<NwFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactMethod {
    pub id: ImpactMethodId,
    pub name: String,
    pub categories: Vec<ImpactCategory>,
    #[serde(default)]
    pub nw_sets: Vec<NwSet>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ImpactMethod {
    pub fn nw_set(&self, id: NwSetId) -> Option<&NwSet> {
        self.nw_sets.iter().find(|s| s.id == id)
    }
}
