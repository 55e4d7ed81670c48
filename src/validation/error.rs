//! Defines the error types for the validation module.

/// The specific category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorType {
    MissingSystem,
    MissingReferenceProcess,
    MissingReferenceExchange,
    /// The demanded amount is not a finite number.
    InvalidDemand,
    /// The unit or flow property of the demand does not fit the reference flow.
    UnresolvableConversion,
    UnknownImpactMethod,
    UnknownNwSet,
    /// A parameter redefinition points to a process or method that does not exist.
    UnknownRedefContext,
}

/// A structured error report of a rejected calculation setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub error_type: ValidationErrorType,
    /// A human-readable message explaining the error.
    pub message: String,
}

impl ValidationError {
    pub fn new(error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self { error_type, message: message.into() }
    }
}
