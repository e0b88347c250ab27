//! DocVault CLI - manage documents from the command line
//!
//! ```bash
//! docvault upload ./lease.pdf --title "Office Lease" --doc-type Contract \
//!     --meta department=Legal --meta document_date=2026-01-15
//! docvault list --search lease
//! docvault download <document-id> --output ./lease.pdf
//! docvault seed
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use docvault::database::seeder;
use docvault::{
    DatabaseManager, DocumentService, FileUpload, ListDocumentsParams, LocalFileStorage,
    MetadataInput, MetadataService,
};

#[derive(Parser)]
#[command(name = "docvault", about = "Document manager CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file as a new document
    Upload {
        /// Path of the file to upload
        filepath: PathBuf,
        /// Document title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
        /// Document type name
        #[arg(long = "doc-type")]
        doc_type: Option<String>,
        /// Metadata value as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },
    /// List documents
    List {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// Page number (1-indexed)
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Download a document's file (latest version by default)
    Download {
        document_id: Uuid,
        #[arg(long)]
        version_id: Option<Uuid>,
        /// Output path (defaults to the stored file name)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete a document and its stored files
    Delete { document_id: Uuid },
    /// List metadata fields
    Fields,
    /// List document types
    Types,
    /// Populate the database with standard fields, types, and samples
    Seed,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let db = DatabaseManager::with_default_config()
        .await
        .context("failed to connect to the database")?;
    db.run_migrations().await?;

    let storage = Arc::new(LocalFileStorage::from_env()?);
    let documents = DocumentService::new(db.pool().clone(), storage.clone());
    let metadata = MetadataService::new(db.pool().clone());

    match cli.command {
        Commands::Upload {
            filepath,
            title,
            doc_type,
            meta,
        } => {
            let bytes = std::fs::read(&filepath)
                .with_context(|| format!("failed to read {}", filepath.display()))?;
            let file_name = filepath
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let title = title.unwrap_or_else(|| file_name.clone());

            let document_type_id = match doc_type {
                Some(name) => {
                    let types = metadata.list_types().await?;
                    match types.into_iter().find(|t| t.name == name) {
                        Some(doc_type) => Some(doc_type.id),
                        None => bail!("document type '{name}' not found"),
                    }
                }
                None => None,
            };

            let metadata_values: BTreeMap<String, MetadataInput> = meta
                .into_iter()
                .map(|(k, v)| (k, MetadataInput::One(v)))
                .collect();
            let metadata_values = (!metadata_values.is_empty()).then_some(metadata_values);

            let detail = documents
                .create_document(
                    &title,
                    document_type_id,
                    metadata_values,
                    Some(FileUpload { file_name, bytes }),
                )
                .await?;

            println!(
                "{} document {} ('{}')",
                "Uploaded".green(),
                detail.document.id,
                detail.document.title
            );
        }
        Commands::List { search, page } => {
            let result = documents
                .list_documents(ListDocumentsParams {
                    page,
                    search,
                    ..Default::default()
                })
                .await?;

            for doc in &result.items {
                let latest = documents
                    .get_document(doc.id)
                    .await?
                    .latest_version()
                    .map(|v| format!("v{}", v.version_number))
                    .unwrap_or_else(|| "-".to_string());
                println!("{}  {:>4}  {}", doc.id, latest, doc.title);
            }
            println!(
                "page {}/{} ({} total)",
                result.page,
                (result.total.max(1) + result.limit - 1) / result.limit,
                result.total
            );
        }
        Commands::Download {
            document_id,
            version_id,
            output,
        } => {
            let download = documents.download_version(document_id, version_id).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(&download.file_name));
            std::fs::write(&path, &download.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} {} ({} bytes)",
                "Saved".green(),
                path.display(),
                download.bytes.len()
            );
        }
        Commands::Delete { document_id } => {
            let outcome = documents.delete_document(document_id).await?;
            println!(
                "{} document {} ({} version(s))",
                "Deleted".green(),
                outcome.document_id,
                outcome.versions_removed
            );
            for failure in &outcome.storage_failures {
                println!(
                    "{} stored file '{}' could not be removed: {}",
                    "warning:".yellow(),
                    failure.storage_key,
                    failure.reason
                );
            }
        }
        Commands::Fields => {
            for field in metadata.list_fields().await? {
                let multi = if field.is_multi_valued { " [multi]" } else { "" };
                println!(
                    "{}  {:<24} {}{}",
                    field.id, field.name, field.field_type, multi
                );
            }
        }
        Commands::Types => {
            for doc_type in metadata.list_types().await? {
                let detail = metadata.get_type(doc_type.id).await?;
                let fields: Vec<String> = detail
                    .fields
                    .iter()
                    .map(|f| {
                        if f.is_required {
                            format!("{}*", f.field.name)
                        } else {
                            f.field.name.clone()
                        }
                    })
                    .collect();
                println!("{}  {:<20} [{}]", doc_type.id, doc_type.name, fields.join(", "));
            }
        }
        Commands::Seed => {
            let summary = seeder::seed(db.pool(), storage).await?;
            println!(
                "{}: {} field(s), {} type(s), {} document(s) created",
                "Seed complete".green(),
                summary.fields,
                summary.types,
                summary.documents
            );
        }
    }

    Ok(())
}
