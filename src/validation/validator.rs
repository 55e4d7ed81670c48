//! The central validator that runs all rules against a calculation setup.
use super::error::{ValidationError, ValidationErrorType};
use super::rules::{demand, references};
use crate::calculation::CalculationSetup;
use crate::model::Registry;

/// Collects every problem of a setup instead of stopping at the first one,
/// so that a caller can report them together.
pub struct Validator<'a> {
    registry: &'a Registry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, setup: &CalculationSetup) -> Result<(), Vec<ValidationError>> {
        let Some(system) = self.registry.system(setup.system) else {
            return Err(vec![ValidationError::new(
                ValidationErrorType::MissingSystem,
                format!("Product system {} does not exist", setup.system),
            )]);
        };

        let mut errors = Vec::new();
        match references::validate_reference(self.registry, system) {
            Some(err) => errors.push(err),
            // the demand can only be converted with a valid reference
            None => errors.extend(demand::validate_demand(self.registry, system, setup)),
        }
        errors.extend(references::validate_method(self.registry, setup));
        errors.extend(references::validate_redefs(self.registry, system, setup));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::testing;

    fn kinds(result: Result<(), Vec<ValidationError>>) -> Vec<ValidationErrorType> {
        result.unwrap_err().into_iter().map(|e| e.error_type).collect()
    }

    #[test]
    fn test_valid_setup_passes() {
        let (registry, system) = testing::single_process_system();
        let setup = CalculationSetup::new(system, 5.0);
        assert!(Validator::new(&registry).validate(&setup).is_ok());
    }

    #[test]
    fn test_missing_system() {
        let (registry, _) = testing::single_process_system();
        let setup = CalculationSetup::new(SystemId(999), 1.0);
        assert_eq!(kinds(Validator::new(&registry).validate(&setup)), vec![ValidationErrorType::MissingSystem]);
    }

    #[test]
    fn test_all_problems_are_reported() {
        let (registry, system) = testing::single_process_system();
        let setup = CalculationSetup::new(system, f64::NAN)
            .with_impact_method(ImpactMethodId(77))
            .with_nw_set(NwSetId(1))
            .with_redef(ParameterRedef {
                name: "x".into(),
                value: 1.0,
                context: Some(RedefContext::Process(ProcessId(404))),
                uncertainty: None,
            });
        assert_eq!(
            kinds(Validator::new(&registry).validate(&setup)),
            vec![
                ValidationErrorType::InvalidDemand,
                ValidationErrorType::UnknownImpactMethod,
                ValidationErrorType::UnknownNwSet,
                ValidationErrorType::UnknownRedefContext,
            ]
        );
    }

    #[test]
    fn test_unit_of_another_property_is_rejected() {
        let (mut registry, system) = testing::single_process_system();
        registry.add_flow_property(FlowProperty {
            id: FlowPropertyId(9),
            name: "Energy".into(),
            units: vec![Unit { id: UnitId(90), name: "MJ".into(), conversion_factor: 1.0 }],
        });
        let setup = CalculationSetup::new(system, 1.0).with_unit(UnitId(90), FlowPropertyId(9));
        assert_eq!(
            kinds(Validator::new(&registry).validate(&setup)),
            vec![ValidationErrorType::UnresolvableConversion]
        );
    }
}
