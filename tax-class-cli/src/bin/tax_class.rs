use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tax_class_cli::app::{self, TaxClassTable};
use tax_class_cli::{TaxClassImporter, logging};
use tax_class_core::db::DbConfig;
use tax_class_core::{TaxClassError, TaxClassInput, TaxClassType};
use tracing::debug;

/// Manage product and customer tax classes.
///
/// Every change goes through the same validation, uniqueness and
/// immutability rules: names are unique per class type and a class type can
/// never change once created.
#[derive(Debug, Parser)]
#[command(name = "tax-class")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Storage backend to use. This build ships `sqlite`.
    #[arg(long, default_value = "sqlite", global = true)]
    backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `tax_classes.db`) or `:memory:`.
    #[arg(long, default_value = "tax_classes.db", global = true)]
    db: String,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a tax class and print its id.
    Create {
        #[arg(long)]
        name: String,
        /// PRODUCT or CUSTOMER.
        #[arg(long = "type")]
        class_type: String,
    },
    /// Rename an existing tax class. The type must match the stored one.
    Rename {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        /// PRODUCT or CUSTOMER.
        #[arg(long = "type")]
        class_type: String,
    },
    /// Print one tax class.
    Get {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// Delete a tax class.
    Delete {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// List tax classes, optionally of one type.
    List {
        #[arg(long = "type", value_parser = parse_class_type)]
        class_type: Option<TaxClassType>,
    },
    /// Create or rename tax classes from a CSV file with the columns
    /// `class_id,class_name,class_type` (leave `class_id` blank to create).
    Import { file: PathBuf },
}

fn parse_class_type(s: &str) -> Result<TaxClassType, String> {
    TaxClassType::parse(&s.to_ascii_uppercase())
        .ok_or_else(|| format!("expected PRODUCT or CUSTOMER, got '{s}'"))
}

/// Print each validation message on its own line before failing.
fn report(err: TaxClassError) -> anyhow::Error {
    if let TaxClassError::Validation(errors) = &err {
        for violation in errors.violations() {
            eprintln!("  {}", violation);
        }
    }
    err.into()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_file.as_deref())?;

    let db_config = DbConfig::new(cli.backend, cli.db);

    debug!("connecting to {} backend", db_config.backend);
    let repo = app::open_repository(&db_config)
        .await
        .with_context(|| format!("Failed to open {} store", db_config.backend))?;

    match cli.command {
        Command::Create { name, class_type } => {
            let input = TaxClassInput::default()
                .with_class_name(name)
                .with_raw_class_type(class_type);
            let class_id = repo.save(input).await.map_err(report)?;
            println!("{class_id}");
        }
        Command::Rename {
            id,
            name,
            class_type,
        } => {
            let input = TaxClassInput::default()
                .with_class_id(id)
                .with_class_name(name)
                .with_raw_class_type(class_type);
            let class_id = repo.save(input).await.map_err(report)?;
            println!("{class_id}");
        }
        Command::Get { id } => {
            let tax_class = repo.get(id).await?;
            print!("{}", TaxClassTable(std::slice::from_ref(&tax_class)));
        }
        Command::Delete { id } => {
            repo.delete_by_id(id).await?;
            println!("Deleted tax class {id}.");
        }
        Command::List { class_type } => {
            let classes = repo.list(class_type).await?;
            print!("{}", TaxClassTable(&classes));
        }
        Command::Import { file } => {
            let reader = File::open(&file)
                .with_context(|| format!("Failed to open: {}", file.display()))?;
            let records = TaxClassImporter::parse(reader)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;

            println!("Parsed {} records from CSV", records.len());

            let outcome = TaxClassImporter::import(&repo, &records)
                .await
                .context("Failed to import tax classes")?;

            println!(
                "Created {} and updated {} tax classes.",
                outcome.created.len(),
                outcome.updated.len()
            );
            for failure in &outcome.failures {
                eprintln!("row {}: {}", failure.row, failure.error);
                if let TaxClassError::Validation(errors) = &failure.error {
                    for violation in errors.violations() {
                        eprintln!("  {}", violation);
                    }
                }
            }
            if !outcome.is_clean() {
                bail!("{} of {} rows failed", outcome.failures.len(), records.len());
            }
        }
    }

    Ok(())
}
