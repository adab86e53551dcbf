use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};
use tax_class_core::{NewTaxClass, StoreError, TaxClass, TaxClassStore, TaxClassType};
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT class_id, class_name, class_type FROM tax_class";

pub struct SqliteTaxClassStore {
    pool: SqlitePool,
}

impl SqliteTaxClassStore {
    /// Open a store.
    ///
    /// `connection_string` may be a bare file path (created if missing), a
    /// `sqlite:` URL, or `:memory:`.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let in_memory = is_in_memory(connection_string);
        let parsed = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else {
            SqliteConnectOptions::from_str(connection_string).map(|o| o.create_if_missing(true))
        };
        let options = parsed
            .with_context(|| format!("Invalid database location: {}", connection_string))?;

        // An in-memory database lives only as long as its connections, so
        // keep exactly one open for the lifetime of the pool.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Apply the SQL seed files in `seeds_dir` that this database has not
    /// seen yet, in filename order. Returns how many files were applied.
    ///
    /// Each applied file is recorded in `applied_seed` in the same
    /// transaction as its statements, so a seed runs at most once per
    /// database. Rows it inserted can be renamed or deleted afterwards and
    /// stay that way.
    pub async fn run_seeds(&self, seeds_dir: &Path) -> Result<usize> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        let mut applied = 0;
        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            let seen = sqlx::query("SELECT 1 FROM applied_seed WHERE file_name = ?")
                .bind(&file_name)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read applied seeds")?
                .is_some();
            if seen {
                debug!(file = %file_name, "seed file already applied");
                continue;
            }

            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            debug!(file = %path.display(), "running seed file");
            let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
            sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(&sql))
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            sqlx::query("INSERT INTO applied_seed (file_name) VALUES (?)")
                .bind(&file_name)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to record seed file '{}'", path.display()))?;
            tx.commit()
                .await
                .with_context(|| format!("Failed to commit seed file '{}'", path.display()))?;
            applied += 1;
        }

        Ok(applied)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    matches!(connection_string, ":memory:" | "sqlite::memory:" | "sqlite://:memory:")
}

fn row_to_tax_class(row: &SqliteRow) -> Result<TaxClass, StoreError> {
    let class_type_str: String = row
        .try_get("class_type")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    let class_type = TaxClassType::parse(&class_type_str).ok_or_else(|| {
        StoreError::Database(format!("Invalid class type: {}", class_type_str))
    })?;

    Ok(TaxClass {
        class_id: row
            .try_get("class_id")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        class_name: row
            .try_get("class_name")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        class_type,
    })
}

/// Unique-constraint failures become [`StoreError::Duplicate`] so callers
/// can tell a lost race from a broken database.
fn write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(db.message().to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

#[async_trait]
impl TaxClassStore for SqliteTaxClassStore {
    async fn find_by_id(&self, class_id: i64) -> Result<Option<TaxClass>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE class_id = ?", SELECT_COLUMNS))
            .bind(class_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        row.as_ref().map(row_to_tax_class).transpose()
    }

    async fn find_by_name_and_type(
        &self,
        class_name: &str,
        class_type: TaxClassType,
    ) -> Result<Option<TaxClass>, StoreError> {
        let row = sqlx::query(&format!(
            "{} WHERE class_name = ? AND class_type = ?",
            SELECT_COLUMNS
        ))
        .bind(class_name)
        .bind(class_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.as_ref().map(row_to_tax_class).transpose()
    }

    async fn insert(&self, tax_class: &NewTaxClass) -> Result<i64, StoreError> {
        let result = sqlx::query("INSERT INTO tax_class (class_name, class_type) VALUES (?, ?)")
            .bind(&tax_class.class_name)
            .bind(tax_class.class_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn update(&self, tax_class: &TaxClass) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE tax_class SET class_name = ?, class_type = ? WHERE class_id = ?")
                .bind(&tax_class.class_name)
                .bind(tax_class.class_type.as_str())
                .bind(tax_class.class_id)
                .execute(&self.pool)
                .await
                .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, class_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tax_class WHERE class_id = ?")
            .bind(class_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn list(&self, class_type: Option<TaxClassType>) -> Result<Vec<TaxClass>, StoreError> {
        let rows = match class_type {
            Some(class_type) => {
                sqlx::query(&format!(
                    "{} WHERE class_type = ? ORDER BY class_id",
                    SELECT_COLUMNS
                ))
                .bind(class_type.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{} ORDER BY class_id", SELECT_COLUMNS))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter().map(row_to_tax_class).collect()
    }
}
