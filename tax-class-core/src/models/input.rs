use serde::{Deserialize, Serialize};

use super::tax_class::{TaxClass, TaxClassType};

/// Candidate tax class as submitted to `TaxClassRepository::save`.
///
/// Every field is raw and optional: the validator decides what is missing
/// or malformed. Leave `class_id` unset to create a new class; set it to
/// rename an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxClassInput {
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub class_type: Option<String>,
}

impl TaxClassInput {
    pub fn new(
        class_name: impl Into<String>,
        class_type: TaxClassType,
    ) -> Self {
        Self {
            class_id: None,
            class_name: Some(class_name.into()),
            class_type: Some(class_type.as_str().to_string()),
        }
    }

    pub fn with_class_id(
        mut self,
        class_id: i64,
    ) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn with_class_name(
        mut self,
        class_name: impl Into<String>,
    ) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the class type from text that has not been checked yet.
    pub fn with_raw_class_type(
        mut self,
        class_type: impl Into<String>,
    ) -> Self {
        self.class_type = Some(class_type.into());
        self
    }
}

impl From<&TaxClass> for TaxClassInput {
    fn from(tax_class: &TaxClass) -> Self {
        TaxClassInput::new(tax_class.class_name.clone(), tax_class.class_type)
            .with_class_id(tax_class.class_id)
    }
}
