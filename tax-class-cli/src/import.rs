use std::io::Read;

use tax_class_core::{StoreError, TaxClassError, TaxClassInput, TaxClassRepository};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort an import as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParse(err.to_string())
    }
}

/// A row the repository refused. `row` is 1-based and excludes the header.
#[derive(Debug)]
pub struct RowFailure {
    pub row: usize,
    pub error: TaxClassError,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: Vec<i64>,
    pub updated: Vec<i64>,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Bulk loader for tax classes from CSV.
///
/// The CSV has a header row and the columns `class_id`, `class_name`,
/// `class_type`. A blank `class_id` creates a class; a filled one renames
/// the existing class. Every row goes through
/// [`TaxClassRepository::save`], so the same validation, uniqueness and
/// immutability rules apply as for a single save.
pub struct TaxClassImporter;

impl TaxClassImporter {
    /// Parse candidate tax classes from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxClassInput>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxClassInput = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Save every record, continuing past rows the repository rejects.
    ///
    /// Rejected rows are collected in [`ImportReport::failures`]. A store
    /// failure (lost connection, broken schema) stops the import.
    pub async fn import(
        repo: &TaxClassRepository,
        records: &[TaxClassInput],
    ) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();

        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            match repo.save(record.clone()).await {
                Ok(class_id) if record.class_id.is_some() => report.updated.push(class_id),
                Ok(class_id) => report.created.push(class_id),
                Err(TaxClassError::Store(err)) => return Err(err.into()),
                Err(error) => {
                    warn!(row, %error, "skipping tax class row");
                    report.failures.push(RowFailure { row, error });
                }
            }
        }

        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            failed = report.failures.len(),
            "tax class import finished"
        );
        Ok(report)
    }
}
