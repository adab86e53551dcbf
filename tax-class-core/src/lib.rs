pub mod db;
pub mod models;
pub mod repository;
pub mod validation;

pub use db::{StoreError, TaxClassStore};
pub use models::*;
pub use repository::{TaxClassError, TaxClassRepository};
pub use validation::{FieldViolation, TaxClassValidator, ValidTaxClass, ValidationErrors};
