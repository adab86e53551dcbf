pub mod factory;
pub mod memory;
pub mod store;

pub use factory::{DbConfig, StoreFactory, StoreRegistry};
pub use memory::{MemoryStoreFactory, MemoryTaxClassStore};
pub use store::{StoreError, TaxClassStore};
