mod input;
mod tax_class;

pub use input::TaxClassInput;
pub use tax_class::{NewTaxClass, TaxClass, TaxClassType};
