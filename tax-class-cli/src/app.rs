use std::fmt;

use tax_class_core::db::{DbConfig, StoreError, StoreRegistry};
use tax_class_core::{TaxClass, TaxClassRepository};
use tax_class_sqlite::SqliteStoreFactory;

/// Registry with the backends this binary ships.
///
/// Each invocation runs one command and exits, so only persistent backends
/// belong here. The in-memory store stays a library and test backend.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// Open the configured backend and wrap it in a repository.
pub async fn open_repository(config: &DbConfig) -> Result<TaxClassRepository, StoreError> {
    let store = build_registry().create(config).await?;
    Ok(TaxClassRepository::new(store))
}

/// Tab-separated listing, one tax class per line.
pub struct TaxClassTable<'a>(pub &'a [TaxClass]);

impl fmt::Display for TaxClassTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tax_class in self.0 {
            writeln!(
                f,
                "{}\t{}\t{}",
                tax_class.class_id, tax_class.class_type, tax_class.class_name
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tax_class_core::{TaxClassInput, TaxClassType};

    use super::*;

    #[test]
    fn registry_ships_sqlite_only() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn open_repository_on_seeded_sqlite() {
        let repo = open_repository(&DbConfig::default()).await.expect("should open");
        let class_id = repo
            .save(TaxClassInput::new("Wholesale", TaxClassType::Customer))
            .await
            .unwrap();

        assert_eq!(repo.get(class_id).await.unwrap().class_name, "Wholesale");
        assert_eq!(repo.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn open_repository_rejects_memory_backend() {
        assert!(matches!(
            open_repository(&DbConfig::memory()).await,
            Err(StoreError::Configuration(msg)) if msg.contains("memory")
        ));
    }

    #[test]
    fn table_lists_one_class_per_line() {
        let classes = vec![
            TaxClass {
                class_id: 1,
                class_name: "Taxable Goods".to_string(),
                class_type: TaxClassType::Product,
            },
            TaxClass {
                class_id: 2,
                class_name: "Retail Customer".to_string(),
                class_type: TaxClassType::Customer,
            },
        ];

        assert_eq!(
            TaxClassTable(&classes).to_string(),
            "1\tPRODUCT\tTaxable Goods\n2\tCUSTOMER\tRetail Customer\n"
        );
    }
}
