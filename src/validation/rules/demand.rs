//! Rules for the demanded amount.
use crate::calculation::CalculationSetup;
use crate::model::{ProductSystem, Registry};
use crate::validation::error::{ValidationError, ValidationErrorType};

/// The amount must be finite and convertible into the reference unit of the
/// reference flow. Zero and negative amounts are valid.
pub(crate) fn validate_demand(
    registry: &Registry,
    system: &ProductSystem,
    setup: &CalculationSetup,
) -> Option<ValidationError> {
    if !setup.amount.is_finite() {
        return Some(ValidationError::new(
            ValidationErrorType::InvalidDemand,
            format!("Demand {} is not a finite number", setup.amount),
        ));
    }
    match setup.demand(registry, system) {
        Some(d) if d.is_finite() => None,
        _ => Some(ValidationError::new(
            ValidationErrorType::UnresolvableConversion,
            format!("Demand of system '{}' cannot be converted into the reference unit", system.name),
        )),
    }
}
