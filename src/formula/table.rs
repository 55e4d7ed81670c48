//! The parameter table of a calculation.
//!
//! Collects the global, process and impact method parameters that are visible
//! in a calculation, applies redefinitions, and orders the calculated
//! parameters so that every formula is evaluated after the parameters it
//! references. The dependency graph is built once; evaluating the table (once
//! per calculation or once per Monte-Carlo run) only walks the fixed order.
use super::{Expr, FormulaError, Interpreter, FALLBACK_VALUE};
use crate::model::{
    ImpactMethodId, Parameter, ParameterRedef, ParameterScope, ProcessId, RedefContext, Registry, Uncertainty,
};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterKey {
    pub scope: ParameterScope,
    /// Lowercase name.
    pub name: String,
}

impl ParameterKey {
    pub fn new(scope: ParameterScope, name: &str) -> Self {
        Self { scope, name: name.to_lowercase() }
    }
}

#[derive(Debug, Clone)]
enum Definition {
    Value(f64),
    Formula(Arc<Expr>),
    /// Could not be ordered or parsed; always evaluates to the fallback.
    Broken(FormulaError),
}

#[derive(Debug, Clone)]
struct Entry {
    key: ParameterKey,
    definition: Definition,
    uncertainty: Option<Uncertainty>,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: Vec<Entry>,
    positions: HashMap<ParameterKey, usize>,
    /// Evaluation order: dependencies before dependents.
    order: Vec<usize>,
}

impl ParameterTable {
    /// Collects the parameters visible to a calculation over `processes`,
    /// optionally with the parameters of an impact method.
    pub fn build(
        registry: &Registry,
        processes: impl IntoIterator<Item = ProcessId>,
        method: Option<ImpactMethodId>,
        redefs: &[ParameterRedef],
    ) -> Self {
        let mut params: Vec<Parameter> = registry.global_parameters.clone();
        for id in processes {
            if let Some(process) = registry.process(id) {
                params.extend(process.parameters.iter().map(|p| Parameter {
                    scope: ParameterScope::Process(id),
                    ..p.clone()
                }));
            }
        }
        if let Some(method) = method.and_then(|m| registry.method(m)) {
            params.extend(method.parameters.iter().map(|p| Parameter {
                scope: ParameterScope::ImpactMethod(method.id),
                ..p.clone()
            }));
        }
        Self::from_parameters(params, redefs)
    }

    pub fn from_parameters(params: impl IntoIterator<Item = Parameter>, redefs: &[ParameterRedef]) -> Self {
        let mut table = ParameterTable::default();
        for param in params {
            let key = ParameterKey::new(param.scope.clone(), &param.name);
            if table.positions.contains_key(&key) {
                tracing::debug!(name = %key.name, "duplicate parameter ignored");
                continue;
            }
            let definition = match &param.formula {
                None => Definition::Value(param.value),
                Some(f) => match Expr::parse(f) {
                    Ok(expr) => Definition::Formula(Arc::new(expr)),
                    Err(e) => {
                        tracing::warn!(name = %key.name, error = %e, "invalid parameter formula");
                        Definition::Broken(e)
                    }
                },
            };
            table.positions.insert(key.clone(), table.entries.len());
            table.entries.push(Entry { key, definition, uncertainty: param.uncertainty });
        }
        table.apply_redefs(redefs);
        table.order();
        table
    }

    fn apply_redefs(&mut self, redefs: &[ParameterRedef]) {
        for redef in redefs {
            let scope = match redef.context {
                None => ParameterScope::Global,
                Some(RedefContext::Process(p)) => ParameterScope::Process(p),
                Some(RedefContext::ImpactMethod(m)) => ParameterScope::ImpactMethod(m),
            };
            let key = ParameterKey::new(scope, &redef.name);
            match self.positions.get(&key) {
                Some(&i) => {
                    let entry = &mut self.entries[i];
                    entry.definition = Definition::Value(redef.value);
                    entry.uncertainty = redef.uncertainty.clone();
                }
                None => tracing::warn!(name = %redef.name, "redefined parameter does not exist"),
            }
        }
    }

    /// Resolves the references of every formula and sorts the table. Members
    /// of a cycle and formulas with unknown names become broken.
    fn order(&mut self) {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.entries.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.entries.len()).map(|i| graph.add_node(i)).collect();
        let mut broken = Vec::new();

        for (i, entry) in self.entries.iter().enumerate() {
            let Definition::Formula(expr) = &entry.definition else { continue };
            for var in expr.variables() {
                match self.resolve(&entry.key.scope, var) {
                    Some(dep) => {
                        graph.add_edge(nodes[i], nodes[dep], ());
                    }
                    None => broken.push((i, FormulaError::UnknownVariable(var.to_string()))),
                }
            }
        }

        // Tarjan emits components in reverse topological order. With edges
        // pointing from a formula to what it references, dependencies come first.
        let mut order = Vec::with_capacity(self.entries.len());
        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1 || graph.contains_edge(component[0], component[0]);
            for node in component {
                let i = graph[node];
                if cyclic {
                    broken.push((i, FormulaError::Cycle(self.entries[i].key.name.clone())));
                }
                order.push(i);
            }
        }

        for (i, error) in broken {
            let entry = &mut self.entries[i];
            if matches!(entry.definition, Definition::Formula(_)) {
                entry.definition = Definition::Broken(error);
            }
        }
        self.order = order;
    }

    fn resolve(&self, scope: &ParameterScope, name: &str) -> Option<usize> {
        if !matches!(scope, ParameterScope::Global) {
            if let Some(&i) = self.positions.get(&ParameterKey { scope: scope.clone(), name: name.to_string() }) {
                return Some(i);
            }
        }
        self.positions
            .get(&ParameterKey { scope: ParameterScope::Global, name: name.to_string() })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ParameterKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn has_uncertainty(&self) -> bool {
        self.entries.iter().any(|e| e.uncertainty.is_some())
    }

    /// Evaluates all parameters with their stored values.
    pub fn evaluate(&self) -> Interpreter {
        self.run::<rand::rngs::StdRng>(None)
    }

    /// Evaluates all parameters, drawing a new value for every parameter with
    /// an uncertainty distribution. The draw replaces a formula.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Interpreter {
        self.run(Some(rng))
    }

    fn run<R: Rng + ?Sized>(&self, mut rng: Option<&mut R>) -> Interpreter {
        let mut interp = Interpreter::new();
        for &i in &self.order {
            let entry = &self.entries[i];
            let drawn = match (rng.as_deref_mut(), &entry.uncertainty) {
                (Some(rng), Some(u)) => Some(u.sample(rng)),
                _ => None,
            };
            let value = match (drawn, &entry.definition) {
                (Some(v), _) => v,
                (None, Definition::Value(v)) => *v,
                (None, Definition::Broken(e)) => {
                    interp.record_failure(&entry.key.name, e.clone());
                    FALLBACK_VALUE
                }
                (None, Definition::Formula(expr)) => match interp.eval_expr(&entry.key.scope, expr) {
                    Ok(v) => v,
                    Err(e) => {
                        interp.record_failure(&entry.key.name, e);
                        FALLBACK_VALUE
                    }
                },
            };
            interp.bind(&entry.key.scope, &entry.key.name, value);
        }
        interp
    }
}
