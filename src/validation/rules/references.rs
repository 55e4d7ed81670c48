//! Rules for records referenced by a setup.
use crate::calculation::CalculationSetup;
use crate::model::{ProductSystem, RedefContext, Registry};
use crate::validation::error::{ValidationError, ValidationErrorType};

/// The reference process must exist and own the reference exchange.
pub(crate) fn validate_reference(registry: &Registry, system: &ProductSystem) -> Option<ValidationError> {
    let Some(process) = registry.process(system.reference_process) else {
        return Some(ValidationError::new(
            ValidationErrorType::MissingReferenceProcess,
            format!("Reference process {} of system '{}' does not exist", system.reference_process, system.name),
        ));
    };
    if process.exchange(system.reference_exchange).is_none() {
        return Some(ValidationError::new(
            ValidationErrorType::MissingReferenceExchange,
            format!(
                "Process '{}' has no exchange {} to use as reference of system '{}'",
                process.name, system.reference_exchange, system.name
            ),
        ));
    }
    None
}

pub(crate) fn validate_method(registry: &Registry, setup: &CalculationSetup) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let method = match setup.impact_method {
        None => None,
        Some(id) => match registry.method(id) {
            Some(m) => Some(m),
            None => {
                errors.push(ValidationError::new(
                    ValidationErrorType::UnknownImpactMethod,
                    format!("Impact method {} does not exist", id),
                ));
                None
            }
        },
    };
    if let Some(nw) = setup.nw_set {
        let known = method.map_or(false, |m| m.nw_set(nw).is_some());
        if !known {
            errors.push(ValidationError::new(
                ValidationErrorType::UnknownNwSet,
                format!("Normalization and weighting set {} is not part of the selected impact method", nw),
            ));
        }
    }
    errors
}

/// Redefinitions may only point to processes and methods that exist.
pub(crate) fn validate_redefs(
    registry: &Registry,
    system: &ProductSystem,
    setup: &CalculationSetup,
) -> Vec<ValidationError> {
    setup
        .redefs_for(system)
        .iter()
        .filter_map(|redef| {
            let missing = match redef.context {
                None => None,
                Some(RedefContext::Process(p)) => registry.process(p).is_none().then(|| format!("process {}", p)),
                Some(RedefContext::ImpactMethod(m)) => {
                    registry.method(m).is_none().then(|| format!("impact method {}", m))
                }
            };
            missing.map(|what| {
                ValidationError::new(
                    ValidationErrorType::UnknownRedefContext,
                    format!("Redefinition of '{}' refers to the unknown {}", redef.name, what),
                )
            })
        })
        .collect()
}
