//! Parameter formulas: parsing, scoped evaluation and dependency ordering.
pub mod expr;
pub mod interpreter;
pub mod table;

pub use expr::Expr;
pub use interpreter::Interpreter;
pub use table::{ParameterKey, ParameterTable};

use thiserror::Error;

/// Errors of a single formula. They never abort a calculation: the affected
/// value falls back to 1 and a warning is logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Cannot parse '{formula}': {msg}")]
    Parse { formula: String, msg: String },
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Function '{function}' takes one argument but {given} were given")]
    Arity { function: String, given: usize },
    #[error("Parameter '{0}' is part of a dependency cycle")]
    Cycle(String),
    #[error("Formula '{0}' evaluated to a non-finite value")]
    NonFinite(String),
}

/// Value used for formulas that cannot be evaluated.
pub const FALLBACK_VALUE: f64 = 1.0;
