use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a tax class applies to products or to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxClassType {
    Product,
    Customer,
}

impl TaxClassType {
    pub const ALL: [TaxClassType; 2] = [Self::Product, Self::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "PRODUCT",
            Self::Customer => "CUSTOMER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRODUCT" => Some(Self::Product),
            "CUSTOMER" => Some(Self::Customer),
            _ => None,
        }
    }
}

impl fmt::Display for TaxClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxClass {
    pub class_id: i64,
    pub class_name: String,
    pub class_type: TaxClassType,
}

/// For inserting new tax classes (the store assigns the id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxClass {
    pub class_name: String,
    pub class_type: TaxClassType,
}
