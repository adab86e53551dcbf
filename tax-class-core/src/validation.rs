use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::{TaxClassInput, TaxClassType};

pub const FIELD_CLASS_NAME: &str = "class_name";
pub const FIELD_CLASS_TYPE: &str = "class_type";

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn required(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{field} is a required field."),
        }
    }

    pub fn invalid_value(
        field: &'static str,
        value: &str,
    ) -> Self {
        Self {
            field,
            message: format!("Invalid value of \"{value}\" provided for the {field} field."),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every violation found in one candidate, in the order the fields were
/// checked. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("One or more input exceptions have occurred.")]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A candidate that passed validation. The name is trimmed and the type is
/// one of the enumerated values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTaxClass {
    pub class_id: Option<i64>,
    pub class_name: String,
    pub class_type: TaxClassType,
}

/// Checks required fields and the class type before anything touches the
/// store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxClassValidator;

impl TaxClassValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `input`, collecting every violation rather than stopping at
    /// the first. `class_name` is checked before `class_type`.
    pub fn validate(
        &self,
        input: &TaxClassInput,
    ) -> Result<ValidTaxClass, ValidationErrors> {
        let mut violations = Vec::new();

        let class_name = match non_blank(input.class_name.as_deref()) {
            Some(name) => Some(name.to_string()),
            None => {
                violations.push(FieldViolation::required(FIELD_CLASS_NAME));
                None
            }
        };

        let class_type = match non_blank(input.class_type.as_deref()) {
            Some(raw) => match TaxClassType::parse(raw) {
                Some(class_type) => Some(class_type),
                None => {
                    violations.push(FieldViolation::invalid_value(FIELD_CLASS_TYPE, raw));
                    None
                }
            },
            None => {
                violations.push(FieldViolation::required(FIELD_CLASS_TYPE));
                None
            }
        };

        match (class_name, class_type) {
            (Some(class_name), Some(class_type)) => Ok(ValidTaxClass {
                class_id: input.class_id,
                class_name,
                class_type,
            }),
            _ => Err(ValidationErrors { violations }),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn raw(
        class_name: Option<&str>,
        class_type: Option<&str>,
    ) -> TaxClassInput {
        TaxClassInput {
            class_id: None,
            class_name: class_name.map(str::to_string),
            class_type: class_type.map(str::to_string),
        }
    }

    #[test]
    fn valid_input_passes() {
        let valid = TaxClassValidator::new()
            .validate(&TaxClassInput::new("Wholesale Customer", TaxClassType::Customer))
            .expect("should validate");

        assert_eq!(
            valid,
            ValidTaxClass {
                class_id: None,
                class_name: "Wholesale Customer".to_string(),
                class_type: TaxClassType::Customer,
            }
        );
    }

    #[test]
    fn class_id_is_carried_through() {
        let input = TaxClassInput::new("Wholesale", TaxClassType::Product).with_class_id(7);
        let valid = TaxClassValidator::new().validate(&input).unwrap();
        assert_eq!(valid.class_id, Some(7));
    }

    #[test]
    fn class_name_is_trimmed() {
        let valid = TaxClassValidator::new()
            .validate(&raw(Some("  Gift Cards \t"), Some("PRODUCT")))
            .unwrap();
        assert_eq!(valid.class_name, "Gift Cards");
    }

    #[test]
    fn missing_name_and_empty_type_report_both_in_order() {
        let errors = TaxClassValidator::new()
            .validate(&raw(None, Some("")))
            .unwrap_err();

        assert_eq!(
            errors.messages(),
            vec![
                "class_name is a required field.",
                "class_type is a required field.",
            ]
        );
        assert_eq!(errors.violations()[0].field, FIELD_CLASS_NAME);
        assert_eq!(errors.violations()[1].field, FIELD_CLASS_TYPE);
    }

    #[test]
    fn blank_name_is_required_violation() {
        let errors = TaxClassValidator::new()
            .validate(&raw(Some("   "), Some("CUSTOMER")))
            .unwrap_err();
        assert_eq!(errors.messages(), vec!["class_name is a required field."]);
    }

    #[test]
    fn missing_type_is_required_violation() {
        let errors = TaxClassValidator::new()
            .validate(&raw(Some("Retail"), None))
            .unwrap_err();
        assert_eq!(errors.messages(), vec!["class_type is a required field."]);
    }

    #[test]
    fn unknown_type_is_invalid_value_violation() {
        let errors = TaxClassValidator::new()
            .validate(&raw(Some("Retail"), Some("SHIPPING")))
            .unwrap_err();
        assert_eq!(
            errors.messages(),
            vec!["Invalid value of \"SHIPPING\" provided for the class_type field."]
        );
    }

    #[test]
    fn class_type_is_trimmed() {
        let valid = TaxClassValidator::new()
            .validate(&raw(Some("Gift Cards"), Some(" PRODUCT\t")))
            .unwrap();
        assert_eq!(valid.class_type, TaxClassType::Product);
    }

    #[test]
    fn invalid_type_is_reported_trimmed() {
        let errors = TaxClassValidator::new()
            .validate(&raw(Some("Retail"), Some("  SHIPPING ")))
            .unwrap_err();
        assert_eq!(
            errors.messages(),
            vec!["Invalid value of \"SHIPPING\" provided for the class_type field."]
        );
    }

    #[test]
    fn lowercase_type_is_not_accepted() {
        let errors = TaxClassValidator::new()
            .validate(&raw(Some("Retail"), Some("customer")))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn composite_error_has_summary_message() {
        let errors = TaxClassValidator::new()
            .validate(&raw(None, None))
            .unwrap_err();
        assert_eq!(
            errors.to_string(),
            "One or more input exceptions have occurred."
        );
        assert!(!errors.is_empty());
    }
}
