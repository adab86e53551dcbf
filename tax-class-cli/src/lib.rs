pub mod app;
pub mod import;
pub mod logging;

pub use import::{ImportError, ImportReport, RowFailure, TaxClassImporter};
