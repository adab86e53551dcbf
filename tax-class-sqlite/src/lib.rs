pub mod factory;
pub mod store;

pub use factory::{SEEDS_DIR_ENV, SqliteStoreFactory, seeds_dir};
pub use store::SqliteTaxClassStore;
