use super::dindex::{Index, Keyed};
use crate::model::{Direction, Flow, FlowId, FlowType, ImpactCategory, ImpactCategoryId};
use serde::{Deserialize, Serialize};

/// The light-weight view of a flow that is kept in indices and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDescriptor {
    pub id: FlowId,
    pub name: String,
    pub flow_type: FlowType,
    pub polarity: Option<Direction>,
}

impl From<&Flow> for FlowDescriptor {
    fn from(flow: &Flow) -> Self {
        Self {
            id: flow.id,
            name: flow.name.clone(),
            flow_type: flow.flow_type,
            polarity: flow.polarity,
        }
    }
}

impl Keyed for FlowDescriptor {
    type Key = FlowId;
    fn key(&self) -> FlowId { self.id }
}

/// Index of the rows of the intervention matrix.
///
/// Every row carries a polarity that is fixed when the flow is first put into
/// the index and never changes afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowIndex {
    index: Index<FlowDescriptor>,
    inputs: Vec<bool>,
}

impl FlowIndex {
    pub fn new() -> Self { Self::default() }

    pub fn put_input(&mut self, flow: FlowDescriptor) -> usize {
        self.put(flow, Direction::Input)
    }

    pub fn put_output(&mut self, flow: FlowDescriptor) -> usize {
        self.put(flow, Direction::Output)
    }

    /// Puts the flow with the given polarity; the polarity of an already
    /// indexed flow is kept.
    pub fn put(&mut self, flow: FlowDescriptor, direction: Direction) -> usize {
        let pos = self.index.put(flow);
        if pos == self.inputs.len() {
            self.inputs.push(direction.is_input());
        }
        pos
    }

    pub fn of(&self, flow: FlowId) -> Option<usize> { self.index.of_key(&flow) }
    pub fn at(&self, position: usize) -> Option<&FlowDescriptor> { self.index.at(position) }
    pub fn contains(&self, flow: FlowId) -> bool { self.index.contains_key(&flow) }
    pub fn content(&self) -> &[FlowDescriptor] { self.index.content() }
    pub fn size(&self) -> usize { self.index.size() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }

    pub fn is_input(&self, position: usize) -> bool {
        self.inputs.get(position).copied().unwrap_or(false)
    }

    pub fn is_input_flow(&self, flow: FlowId) -> bool {
        self.of(flow).map(|pos| self.is_input(pos)).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &FlowDescriptor)> {
        self.index.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactDescriptor {
    pub id: ImpactCategoryId,
    pub name: String,
    pub reference_unit: Option<String>,
}

impl From<&ImpactCategory> for ImpactDescriptor {
    fn from(category: &ImpactCategory) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            reference_unit: category.reference_unit.clone(),
        }
    }
}

impl Keyed for ImpactDescriptor {
    type Key = ImpactCategoryId;
    fn key(&self) -> ImpactCategoryId { self.id }
}

/// Index of the rows of the characterization matrix.
pub type ImpactIndex = Index<ImpactDescriptor>;
