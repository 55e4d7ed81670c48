use super::dindex::{Index, Keyed};
use crate::model::{FlowId, LocationId, ProcessId, Provider, SystemId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A product (or waste-treatment service) of a process or nested product system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessProduct {
    pub provider: Provider,
    pub flow: FlowId,
    pub location: Option<LocationId>,
}

impl ProcessProduct {
    pub fn of_process(process: ProcessId, flow: FlowId) -> Self {
        Self { provider: Provider::Process(process), flow, location: None }
    }

    pub fn of_system(system: SystemId, flow: FlowId) -> Self {
        Self { provider: Provider::System(system), flow, location: None }
    }

    pub fn with_location(mut self, location: Option<LocationId>) -> Self {
        self.location = location;
        self
    }

    pub fn process(&self) -> Option<ProcessId> {
        match self.provider {
            Provider::Process(id) => Some(id),
            Provider::System(_) => None,
        }
    }
}

impl Keyed for ProcessProduct {
    type Key = (Provider, FlowId);
    fn key(&self) -> Self::Key { (self.provider, self.flow) }
}

/// Index of the columns (and rows) of the technology matrix.
///
/// Position 0 always holds the reference product of the calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredTechIndex")]
pub struct TechIndex {
    index: Index<ProcessProduct>,
    demand: f64,
    /// Indices of nested product systems backing a column.
    #[serde(skip)]
    sub_indices: HashMap<ProcessProduct, Arc<TechIndex>>,
}

#[derive(Deserialize)]
struct StoredTechIndex {
    index: Index<ProcessProduct>,
    demand: f64,
}

impl TryFrom<StoredTechIndex> for TechIndex {
    type Error = String;

    fn try_from(stored: StoredTechIndex) -> Result<Self, Self::Error> {
        if stored.index.is_empty() {
            return Err("a technology index needs a reference product".to_string());
        }
        Ok(Self { index: stored.index, demand: stored.demand, sub_indices: HashMap::new() })
    }
}

impl TechIndex {
    pub fn new(reference: ProcessProduct, demand: f64) -> Self {
        let mut index = Index::new();
        index.put(reference);
        Self { index, demand, sub_indices: HashMap::new() }
    }

    pub fn reference(&self) -> ProcessProduct {
        // position 0 exists from construction on
        self.index.content()[0]
    }

    pub fn demand(&self) -> f64 { self.demand }

    pub fn set_demand(&mut self, demand: f64) {
        self.demand = demand;
    }

    pub fn put(&mut self, product: ProcessProduct) -> usize { self.index.put(product) }
    pub fn of(&self, product: &ProcessProduct) -> Option<usize> { self.index.of(product) }
    pub fn at(&self, position: usize) -> Option<&ProcessProduct> { self.index.at(position) }
    pub fn contains(&self, product: &ProcessProduct) -> bool { self.index.contains(product) }
    pub fn content(&self) -> &[ProcessProduct] { self.index.content() }
    pub fn size(&self) -> usize { self.index.size() }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ProcessProduct)> {
        self.index.iter()
    }

    /// All positions whose provider is the given process.
    pub fn providers_of(&self, process: ProcessId) -> Vec<usize> {
        self.index
            .iter()
            .filter(|(_, p)| p.provider == Provider::Process(process))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn add_sub_index(&mut self, product: ProcessProduct, sub: Arc<TechIndex>) {
        self.sub_indices.insert(product, sub);
    }

    pub fn sub_index(&self, product: &ProcessProduct) -> Option<&Arc<TechIndex>> {
        self.sub_indices.get(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_position_zero() {
        let reference = ProcessProduct::of_process(ProcessId(10), FlowId(1));
        let mut index = TechIndex::new(reference, 2.5);
        assert_eq!(index.put(reference), 0);
        let other = ProcessProduct::of_process(ProcessId(11), FlowId(2));
        assert_eq!(index.put(other), 1);
        assert_eq!(index.reference(), reference);
        assert_eq!(index.demand(), 2.5);
        assert_eq!(index.size(), 2);
    }

    #[test]
    fn test_providers_of_process() {
        let a = ProcessProduct::of_process(ProcessId(1), FlowId(1));
        let mut index = TechIndex::new(a, 1.0);
        index.put(ProcessProduct::of_process(ProcessId(2), FlowId(2)));
        index.put(ProcessProduct::of_process(ProcessId(1), FlowId(3)));
        index.put(ProcessProduct::of_system(SystemId(1), FlowId(4)));
        assert_eq!(index.providers_of(ProcessId(1)), vec![0, 2]);
        assert!(index.providers_of(ProcessId(9)).is_empty());
    }

    #[test]
    fn test_deserialization_requires_a_reference() {
        let a = ProcessProduct::of_process(ProcessId(1), FlowId(1));
        let mut index = TechIndex::new(a, 3.0);
        index.put(ProcessProduct::of_process(ProcessId(2), FlowId(2)));
        let json = serde_json::to_string(&index).unwrap();
        let back: TechIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reference(), a);
        assert_eq!(back.size(), 2);
        assert_eq!(back.demand(), 3.0);

        let empty = serde_json::from_str::<TechIndex>(r#"{"index": [], "demand": 1.0}"#);
        assert!(empty.is_err());
    }

    #[test]
    fn test_location_is_not_part_of_identity() {
        let a = ProcessProduct::of_process(ProcessId(1), FlowId(1));
        let mut index = TechIndex::new(a, 1.0);
        let located = a.with_location(Some(LocationId(3)));
        assert_eq!(index.put(located), 0);
    }
}
