use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewTaxClass, TaxClass, TaxClassType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Persistence collaborator behind [`crate::TaxClassRepository`].
///
/// Implementations must enforce uniqueness of `(class_name, class_type)`
/// themselves and report a violation as [`StoreError::Duplicate`]; the
/// repository's own lookup is only a pre-check.
#[async_trait]
pub trait TaxClassStore: Send + Sync {
    async fn find_by_id(&self, class_id: i64) -> Result<Option<TaxClass>, StoreError>;

    async fn find_by_name_and_type(
        &self,
        class_name: &str,
        class_type: TaxClassType,
    ) -> Result<Option<TaxClass>, StoreError>;

    /// Insert and return the newly assigned id.
    async fn insert(&self, tax_class: &NewTaxClass) -> Result<i64, StoreError>;

    /// Returns [`StoreError::NotFound`] when no row has `tax_class.class_id`.
    async fn update(&self, tax_class: &TaxClass) -> Result<(), StoreError>;

    /// Returns [`StoreError::NotFound`] when no row has `class_id`.
    async fn delete(&self, class_id: i64) -> Result<(), StoreError>;

    /// All tax classes ordered by id, optionally restricted to one type.
    async fn list(&self, class_type: Option<TaxClassType>) -> Result<Vec<TaxClass>, StoreError>;
}
