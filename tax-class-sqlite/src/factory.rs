use std::path::PathBuf;

use async_trait::async_trait;
use tax_class_core::db::{DbConfig, StoreError, StoreFactory, TaxClassStore};
use tracing::debug;

use crate::store::SqliteTaxClassStore;

/// Environment variable that overrides where seed SQL files are read from.
pub const SEEDS_DIR_ENV: &str = "TAX_CLASS_SQLITE_SEEDS_DIR";

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`TAX_CLASS_SQLITE_SEEDS_DIR`**, if set.
/// 2. **`./seeds`**, if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** as a last resort (dev/tests run from the
///    build tree).
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`tax_class_core::db::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use tax_class_core::db::StoreRegistry;
/// use tax_class_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, bring the
    /// schema up to date, and apply any seed file the database has not seen.
    /// The default tax classes are therefore inserted once, when the database
    /// is new.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"tax_classes.db"`.  Created if missing.
    /// * A `sqlite:` URL, e.g. `"sqlite:tax_classes.db?mode=rwc"`.
    /// * `":memory:"` for an ephemeral database (useful for tests).
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn TaxClassStore>, StoreError> {
        let store = SqliteTaxClassStore::new(&config.connection_string)
            .await
            .map_err(|e| StoreError::Connection(format!("{e:#}")))?;
        store
            .run_migrations()
            .await
            .map_err(|e| StoreError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        let applied = store
            .run_seeds(&seeds)
            .await
            .map_err(|e| StoreError::Database(format!("{e:#}")))?;
        debug!(seeds = %seeds.display(), applied, "seed data checked");

        Ok(Box::new(store))
    }
}
