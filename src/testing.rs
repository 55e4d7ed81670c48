//! Small product systems shared by the unit tests.
use crate::model::*;

pub(crate) const MASS: FlowPropertyId = FlowPropertyId(1);

/// A registry with the mass flow property (kg, t).
pub(crate) fn base_registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_flow_property(FlowProperty {
        id: MASS,
        name: "Mass".into(),
        units: vec![
            Unit { id: UnitId(1), name: "kg".into(), conversion_factor: 1.0 },
            Unit { id: UnitId(2), name: "t".into(), conversion_factor: 1000.0 },
        ],
    });
    registry
}

fn add_flow(registry: &mut Registry, id: u64, name: &str, flow_type: FlowType, polarity: Option<Direction>) {
    registry.add_flow(Flow {
        id: FlowId(id),
        name: name.into(),
        flow_type,
        reference_property: MASS,
        property_factors: vec![],
        polarity,
    });
}

pub(crate) fn add_product(registry: &mut Registry, id: u64, name: &str) {
    add_flow(registry, id, name, FlowType::Product, None);
}

pub(crate) fn add_waste(registry: &mut Registry, id: u64, name: &str) {
    add_flow(registry, id, name, FlowType::Waste, None);
}

pub(crate) fn add_elementary(registry: &mut Registry, id: u64, name: &str, polarity: Option<Direction>) {
    add_flow(registry, id, name, FlowType::Elementary, polarity);
}

pub(crate) fn exchange(id: u64, flow: u64, direction: Direction, amount: f64) -> Exchange {
    Exchange {
        id: ExchangeId(id),
        flow: FlowId(flow),
        direction,
        amount,
        formula: None,
        unit: None,
        property: None,
        uncertainty: None,
        cost: None,
    }
}

pub(crate) fn process(id: u64, name: &str, reference: u64, exchanges: Vec<Exchange>) -> Process {
    Process {
        id: ProcessId(id),
        name: name.into(),
        reference_exchange: ExchangeId(reference),
        exchanges,
        default_allocation: None,
        allocation_factors: vec![],
        parameters: vec![],
        location: None,
    }
}

pub(crate) fn system(id: u64, process: u64, exchange: u64, amount: f64, links: Vec<ProcessLink>) -> ProductSystem {
    ProductSystem {
        id: SystemId(id),
        name: format!("system {}", id),
        reference_process: ProcessId(process),
        reference_exchange: ExchangeId(exchange),
        target_amount: amount,
        target_unit: None,
        target_property: None,
        links,
        parameter_redefs: vec![],
    }
}

pub(crate) fn link(process: u64, exchange: u64, flow: u64, provider: Provider) -> ProcessLink {
    ProcessLink { process: ProcessId(process), exchange: Some(ExchangeId(exchange)), flow: FlowId(flow), provider }
}

/// One process with a reference output of 2 and an elementary input of 1.
pub(crate) fn single_process_system() -> (Registry, SystemId) {
    let mut registry = base_registry();
    add_product(&mut registry, 10, "product");
    add_elementary(&mut registry, 20, "resource", None);
    registry.add_process(process(
        1,
        "p1",
        11,
        vec![exchange(11, 10, Direction::Output, 2.0), exchange(12, 20, Direction::Input, 1.0)],
    ));
    let id = registry.add_system(system(1, 1, 11, 2.0, vec![]));
    (registry, id)
}

/// Two processes that supply each other:
/// p1 makes `a` (needs 0.5 `b`, emits 2 co2), p2 makes `b` (needs 0.2 `a`, emits 1 co2).
pub(crate) fn two_process_loop() -> (Registry, SystemId) {
    let mut registry = base_registry();
    add_product(&mut registry, 10, "a");
    add_product(&mut registry, 11, "b");
    add_elementary(&mut registry, 20, "co2", None);
    registry.add_process(process(
        1,
        "p1",
        11,
        vec![
            exchange(11, 10, Direction::Output, 1.0),
            exchange(12, 11, Direction::Input, 0.5),
            exchange(13, 20, Direction::Output, 2.0),
        ],
    ));
    registry.add_process(process(
        2,
        "p2",
        21,
        vec![
            exchange(21, 11, Direction::Output, 1.0),
            exchange(22, 10, Direction::Input, 0.2),
            exchange(23, 20, Direction::Output, 1.0),
        ],
    ));
    let links = vec![
        link(1, 12, 11, Provider::Process(ProcessId(2))),
        link(2, 22, 10, Provider::Process(ProcessId(1))),
    ];
    let id = registry.add_system(system(1, 1, 11, 1.0, links));
    (registry, id)
}

/// A process with an unlinked product input of 3 and an emission of 4.
pub(crate) fn cut_off_system() -> (Registry, SystemId) {
    let mut registry = base_registry();
    add_product(&mut registry, 10, "a");
    add_product(&mut registry, 11, "b");
    add_elementary(&mut registry, 20, "co2", None);
    registry.add_process(process(
        1,
        "p1",
        11,
        vec![
            exchange(11, 10, Direction::Output, 1.0),
            exchange(12, 11, Direction::Input, 3.0),
            exchange(13, 20, Direction::Output, 4.0),
        ],
    ));
    let id = registry.add_system(system(1, 1, 11, 1.0, vec![]));
    (registry, id)
}

/// A producer with 0.5 waste output, treated by a process that takes 1 unit
/// of waste and emits 0.8 co2.
pub(crate) fn waste_system() -> (Registry, SystemId) {
    let mut registry = base_registry();
    add_product(&mut registry, 10, "a");
    add_waste(&mut registry, 30, "waste");
    add_elementary(&mut registry, 20, "co2", None);
    registry.add_process(process(
        1,
        "producer",
        11,
        vec![exchange(11, 10, Direction::Output, 1.0), exchange(12, 30, Direction::Output, 0.5)],
    ));
    registry.add_process(process(
        3,
        "treatment",
        31,
        vec![exchange(31, 30, Direction::Input, 1.0), exchange(32, 20, Direction::Output, 0.8)],
    ));
    let links = vec![link(1, 12, 30, Provider::Process(ProcessId(3)))];
    let id = registry.add_system(system(1, 1, 11, 1.0, links));
    (registry, id)
}

/// System 1 uses product `b` from system 2, which delivers 2 units of `b`
/// and emits 3 co2 per unit.
pub(crate) fn system_link() -> (Registry, SystemId) {
    let mut registry = base_registry();
    add_product(&mut registry, 10, "a");
    add_product(&mut registry, 11, "b");
    add_elementary(&mut registry, 20, "co2", None);
    registry.add_process(process(
        1,
        "p1",
        11,
        vec![exchange(11, 10, Direction::Output, 1.0), exchange(12, 11, Direction::Input, 1.0)],
    ));
    registry.add_process(process(
        5,
        "p5",
        51,
        vec![exchange(51, 11, Direction::Output, 1.0), exchange(52, 20, Direction::Output, 3.0)],
    ));
    registry.add_system(system(2, 5, 51, 2.0, vec![]));
    let links = vec![link(1, 12, 11, Provider::System(SystemId(2)))];
    let id = registry.add_system(system(1, 1, 11, 1.0, links));
    (registry, id)
}

/// An impact method with one category that characterizes flow 20 with `co2`
/// and an nw-set (normalisation 10, weighting 2).
pub(crate) fn climate_method(co2: f64) -> ImpactMethod {
    ImpactMethod {
        id: ImpactMethodId(1),
        name: "climate".into(),
        categories: vec![ImpactCategory {
            id: ImpactCategoryId(1),
            name: "GWP".into(),
            reference_unit: Some("kg CO2 eq".into()),
            factors: vec![ImpactFactor { flow: FlowId(20), value: co2, formula: None, uncertainty: None }],
        }],
        nw_sets: vec![NwSet {
            id: NwSetId(1),
            name: "nw".into(),
            weighted_score_unit: Some("Pt".into()),
            factors: vec![NwFactor { category: ImpactCategoryId(1), normalisation: Some(10.0), weighting: Some(2.0) }],
        }],
        parameters: vec![],
    }
}
