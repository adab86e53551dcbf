use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{StoreError, TaxClassStore};
use crate::models::{NewTaxClass, TaxClass, TaxClassInput, TaxClassType};
use crate::validation::{TaxClassValidator, ValidTaxClass, ValidationErrors};

#[derive(Debug, Error)]
pub enum TaxClassError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("A class with the same name already exists for ClassType {class_type}.")]
    Conflict { class_type: TaxClassType },

    #[error("No such entity with class_id = {class_id}")]
    NotFound { class_id: i64 },

    #[error("Updating classType is not allowed.")]
    ImmutableField,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated CRUD façade over a [`TaxClassStore`].
///
/// Every operation either succeeds with exactly one store write (for
/// mutations) or fails without writing anything.
pub struct TaxClassRepository {
    store: Box<dyn TaxClassStore>,
    validator: TaxClassValidator,
}

impl TaxClassRepository {
    pub fn new(store: Box<dyn TaxClassStore>) -> Self {
        Self::with_validator(store, TaxClassValidator::new())
    }

    pub fn with_validator(
        store: Box<dyn TaxClassStore>,
        validator: TaxClassValidator,
    ) -> Self {
        Self { store, validator }
    }

    /// Create or rename a tax class and return its id.
    ///
    /// Without a `class_id` the candidate is inserted; with one, the stored
    /// class is renamed. The class type can never change.
    ///
    /// # Errors
    /// * [`TaxClassError::Validation`] listing every missing or malformed field.
    /// * [`TaxClassError::NotFound`] if `class_id` is set but unknown.
    /// * [`TaxClassError::ImmutableField`] if the type differs from the stored one.
    /// * [`TaxClassError::Conflict`] if the name is already taken for that type.
    pub async fn save(&self, candidate: TaxClassInput) -> Result<i64, TaxClassError> {
        let valid = self.validator.validate(&candidate).inspect_err(|errors| {
            debug!(violations = errors.len(), "tax class rejected by validation");
        })?;

        match valid.class_id {
            None => self.create(valid).await,
            Some(class_id) => self.rename(class_id, valid).await,
        }
    }

    async fn create(&self, valid: ValidTaxClass) -> Result<i64, TaxClassError> {
        self.ensure_unique(&valid.class_name, valid.class_type, None)
            .await?;

        let new_class = NewTaxClass {
            class_name: valid.class_name,
            class_type: valid.class_type,
        };
        let class_id = self
            .store
            .insert(&new_class)
            .await
            .map_err(|e| write_error(e, new_class.class_type, None))?;

        info!(class_id, class_type = %new_class.class_type, "tax class created");
        Ok(class_id)
    }

    async fn rename(
        &self,
        class_id: i64,
        valid: ValidTaxClass,
    ) -> Result<i64, TaxClassError> {
        let existing = self.get(class_id).await?;

        if existing.class_type != valid.class_type {
            warn!(
                class_id,
                stored = %existing.class_type,
                requested = %valid.class_type,
                "refusing to change tax class type"
            );
            return Err(TaxClassError::ImmutableField);
        }

        if existing.class_name != valid.class_name {
            self.ensure_unique(&valid.class_name, existing.class_type, Some(class_id))
                .await?;
        }

        let updated = TaxClass {
            class_id,
            class_name: valid.class_name,
            class_type: existing.class_type,
        };
        self.store
            .update(&updated)
            .await
            .map_err(|e| write_error(e, updated.class_type, Some(class_id)))?;

        info!(class_id, "tax class updated");
        Ok(class_id)
    }

    /// Fail with [`TaxClassError::Conflict`] if a class other than `except`
    /// already uses `class_name` for `class_type`.
    async fn ensure_unique(
        &self,
        class_name: &str,
        class_type: TaxClassType,
        except: Option<i64>,
    ) -> Result<(), TaxClassError> {
        match self
            .store
            .find_by_name_and_type(class_name, class_type)
            .await?
        {
            Some(found) if Some(found.class_id) != except => {
                debug!(
                    existing_id = found.class_id,
                    %class_type,
                    "tax class name already taken"
                );
                Err(TaxClassError::Conflict { class_type })
            }
            _ => Ok(()),
        }
    }

    /// Load a tax class by id.
    pub async fn get(&self, class_id: i64) -> Result<TaxClass, TaxClassError> {
        self.store
            .find_by_id(class_id)
            .await?
            .ok_or(TaxClassError::NotFound { class_id })
    }

    /// Delete a tax class. The id is invalid for every later call.
    pub async fn delete_by_id(&self, class_id: i64) -> Result<(), TaxClassError> {
        self.get(class_id).await?;

        self.store.delete(class_id).await.map_err(|e| match e {
            StoreError::NotFound => TaxClassError::NotFound { class_id },
            other => TaxClassError::Store(other),
        })?;

        info!(class_id, "tax class deleted");
        Ok(())
    }

    /// Every tax class ordered by id, optionally restricted to one type.
    pub async fn list(
        &self,
        class_type: Option<TaxClassType>,
    ) -> Result<Vec<TaxClass>, TaxClassError> {
        Ok(self.store.list(class_type).await?)
    }
}

/// Map a failed write. A duplicate means another writer won the race
/// after the pre-check; a missing row means it was deleted in between.
fn write_error(
    err: StoreError,
    class_type: TaxClassType,
    class_id: Option<i64>,
) -> TaxClassError {
    match (err, class_id) {
        (StoreError::Duplicate(_), _) => TaxClassError::Conflict { class_type },
        (StoreError::NotFound, Some(class_id)) => TaxClassError::NotFound { class_id },
        (err, _) => TaxClassError::Store(err),
    }
}
