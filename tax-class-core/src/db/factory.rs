use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use super::store::{StoreError, TaxClassStore};

/// Which tax class store to open and where.
///
/// `connection_string` is only meaningful to the chosen backend: a file path,
/// `sqlite:` URL or `:memory:` for `sqlite`; ignored by `memory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    pub fn new(backend: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            connection_string: connection_string.into(),
        }
    }

    /// A SQLite database at `location`.
    pub fn sqlite(location: impl Into<String>) -> Self {
        Self::new("sqlite", location)
    }

    /// A process-local store that starts empty.
    pub fn memory() -> Self {
        Self::new("memory", "")
    }
}

/// A fresh, seeded in-memory SQLite database.
impl Default for DbConfig {
    fn default() -> Self {
        Self::sqlite(":memory:")
    }
}

/// Opens one kind of tax class store.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Name selected by [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Open the store, bringing its schema and default data up to date.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn TaxClassStore>, StoreError>;
}

/// The tax class store backends a program knows how to open.
#[derive(Default)]
pub struct StoreRegistry {
    factories: BTreeMap<&'static str, Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend. A later factory with the same name wins.
    pub fn register(&mut self, factory: Box<dyn StoreFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Open the store `config.backend` names.
    ///
    /// An unregistered name is a [`StoreError::Configuration`] that lists the
    /// registered ones; factory failures pass through unchanged.
    pub async fn create(&self, config: &DbConfig) -> Result<Box<dyn TaxClassStore>, StoreError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(StoreError::Configuration(format!(
                "no tax class store backend named '{}' (registered: {})",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        debug!(backend = factory.backend_name(), "opening tax class store");
        factory.create(config).await
    }
}
