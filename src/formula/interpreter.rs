use super::{Expr, FormulaError, FALLBACK_VALUE};
use crate::model::ParameterScope;
use std::collections::HashMap;

/// Evaluated parameter values per scope.
///
/// A name is looked up in the requested local scope first and then in the
/// global scope.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    globals: HashMap<String, f64>,
    locals: HashMap<ParameterScope, HashMap<String, f64>>,
    failures: Vec<(String, FormulaError)>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, scope: &ParameterScope, name: &str, value: f64) {
        let name = name.to_lowercase();
        match scope {
            ParameterScope::Global => {
                self.globals.insert(name, value);
            }
            local => {
                self.locals.entry(local.clone()).or_default().insert(name, value);
            }
        }
    }

    pub fn value(&self, scope: &ParameterScope, name: &str) -> Option<f64> {
        if !matches!(scope, ParameterScope::Global) {
            if let Some(v) = self.locals.get(scope).and_then(|vars| vars.get(name)) {
                return Some(*v);
            }
        }
        self.globals.get(name).copied()
    }

    pub fn eval_expr(&self, scope: &ParameterScope, expr: &Expr) -> Result<f64, FormulaError> {
        let value = expr.eval(&|name| self.value(scope, name))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite(format!("{:?}", expr)))
        }
    }

    pub fn eval(&self, scope: &ParameterScope, formula: &str) -> Result<f64, FormulaError> {
        let expr = Expr::parse(formula)?;
        self.eval_expr(scope, &expr).map_err(|e| match e {
            FormulaError::NonFinite(_) => FormulaError::NonFinite(formula.to_string()),
            other => other,
        })
    }

    /// Evaluates `formula`, returning `fallback` and logging a warning when it fails.
    pub fn eval_or(&self, scope: &ParameterScope, formula: &str, fallback: f64) -> f64 {
        match self.eval(scope, formula) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(formula, error = %e, fallback, "formula evaluation failed");
                fallback
            }
        }
    }

    pub(crate) fn record_failure(&mut self, name: &str, error: FormulaError) {
        tracing::warn!(parameter = name, error = %error, "parameter set to {}", FALLBACK_VALUE);
        self.failures.push((name.to_string(), error));
    }

    /// Parameters that fell back to the default value during the last evaluation.
    pub fn failures(&self) -> &[(String, FormulaError)] {
        &self.failures
    }
}
