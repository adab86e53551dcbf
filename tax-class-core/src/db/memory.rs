use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::factory::{DbConfig, StoreFactory};
use super::store::{StoreError, TaxClassStore};
use crate::models::{NewTaxClass, TaxClass, TaxClassType};

#[derive(Debug, Default)]
struct MemoryState {
    rows: BTreeMap<i64, TaxClass>,
    last_id: i64,
}

/// Process-local [`TaxClassStore`].
///
/// Ids start at 1 and are never reissued, even after a delete. The
/// `(class_name, class_type)` uniqueness rule is enforced on every write.
#[derive(Debug, Default)]
pub struct MemoryTaxClassStore {
    state: Mutex<MemoryState>,
}

impl MemoryTaxClassStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Database(format!("memory store poisoned: {e}")))
    }
}

impl MemoryState {
    fn conflicting(
        &self,
        class_name: &str,
        class_type: TaxClassType,
        except: Option<i64>,
    ) -> bool {
        self.rows.values().any(|row| {
            row.class_name == class_name
                && row.class_type == class_type
                && Some(row.class_id) != except
        })
    }
}

#[async_trait]
impl TaxClassStore for MemoryTaxClassStore {
    async fn find_by_id(&self, class_id: i64) -> Result<Option<TaxClass>, StoreError> {
        Ok(self.lock()?.rows.get(&class_id).cloned())
    }

    async fn find_by_name_and_type(
        &self,
        class_name: &str,
        class_type: TaxClassType,
    ) -> Result<Option<TaxClass>, StoreError> {
        Ok(self
            .lock()?
            .rows
            .values()
            .find(|row| row.class_name == class_name && row.class_type == class_type)
            .cloned())
    }

    async fn insert(&self, tax_class: &NewTaxClass) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        if state.conflicting(&tax_class.class_name, tax_class.class_type, None) {
            return Err(StoreError::Duplicate(format!(
                "{} / {}",
                tax_class.class_name, tax_class.class_type
            )));
        }

        state.last_id += 1;
        let class_id = state.last_id;
        state.rows.insert(
            class_id,
            TaxClass {
                class_id,
                class_name: tax_class.class_name.clone(),
                class_type: tax_class.class_type,
            },
        );
        Ok(class_id)
    }

    async fn update(&self, tax_class: &TaxClass) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if !state.rows.contains_key(&tax_class.class_id) {
            return Err(StoreError::NotFound);
        }
        if state.conflicting(
            &tax_class.class_name,
            tax_class.class_type,
            Some(tax_class.class_id),
        ) {
            return Err(StoreError::Duplicate(format!(
                "{} / {}",
                tax_class.class_name, tax_class.class_type
            )));
        }

        state.rows.insert(tax_class.class_id, tax_class.clone());
        Ok(())
    }

    async fn delete(&self, class_id: i64) -> Result<(), StoreError> {
        self.lock()?
            .rows
            .remove(&class_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, class_type: Option<TaxClassType>) -> Result<Vec<TaxClass>, StoreError> {
        Ok(self
            .lock()?
            .rows
            .values()
            .filter(|row| class_type.is_none_or(|t| row.class_type == t))
            .cloned()
            .collect())
    }
}

/// [`StoreFactory`] for the `"memory"` backend. The connection string is
/// ignored; every call yields a fresh, empty store.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, _config: &DbConfig) -> Result<Box<dyn TaxClassStore>, StoreError> {
        Ok(Box::new(MemoryTaxClassStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn new_class(
        name: &str,
        class_type: TaxClassType,
    ) -> NewTaxClass {
        NewTaxClass {
            class_name: name.to_string(),
            class_type,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryTaxClassStore::new();

        let first = store
            .insert(&new_class("Taxable Goods", TaxClassType::Product))
            .await
            .unwrap();
        let second = store
            .insert(&new_class("Retail Customer", TaxClassType::Customer))
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reissued() {
        let store = MemoryTaxClassStore::new();
        let id = store
            .insert(&new_class("Taxable Goods", TaxClassType::Product))
            .await
            .unwrap();
        store.delete(id).await.unwrap();

        let next = store
            .insert(&new_class("Taxable Goods", TaxClassType::Product))
            .await
            .unwrap();

        assert_ne!(next, id);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_name_and_type() {
        let store = MemoryTaxClassStore::new();
        store
            .insert(&new_class("Taxable Goods", TaxClassType::Product))
            .await
            .unwrap();

        let result = store
            .insert(&new_class("Taxable Goods", TaxClassType::Product))
            .await;

        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn same_name_is_allowed_across_types() {
        let store = MemoryTaxClassStore::new();
        store
            .insert(&new_class("Wholesale", TaxClassType::Product))
            .await
            .unwrap();

        let result = store
            .insert(&new_class("Wholesale", TaxClassType::Customer))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryTaxClassStore::new();
        let result = store
            .update(&TaxClass {
                class_id: 42,
                class_name: "Ghost".to_string(),
                class_type: TaxClassType::Customer,
            })
            .await;

        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = MemoryTaxClassStore::new();
        assert_eq!(store.delete(-1).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn list_filters_by_type_in_id_order() {
        let store = MemoryTaxClassStore::new();
        store
            .insert(&new_class("B", TaxClassType::Customer))
            .await
            .unwrap();
        store
            .insert(&new_class("A", TaxClassType::Product))
            .await
            .unwrap();
        store
            .insert(&new_class("C", TaxClassType::Customer))
            .await
            .unwrap();

        let customers = store.list(Some(TaxClassType::Customer)).await.unwrap();
        let names: Vec<_> = customers.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);

        assert_eq!(store.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn factory_creates_empty_store() {
        let store = MemoryStoreFactory
            .create(&DbConfig::memory())
            .await
            .unwrap();
        assert!(store.list(None).await.unwrap().is_empty());
    }
}
