use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use dealer_media::app::merge_use_case::MergeUseCase;
use dealer_media::app::migrate_use_case::MigrateUseCase;
use dealer_media::app::ports::{ObjectStore, RecordStore};
use dealer_media::app::presign_use_case::PresignUseCase;
use dealer_media::app::transaction::AssetTransaction;
use dealer_media::app::upload_use_case::UploadUseCase;
use dealer_media::config::Config;
use dealer_media::domain::{FileSpec, IncomingFile};
use dealer_media::infra::supabase_store::SupabaseObjectStore;
use dealer_media::logging;

#[derive(Parser)]
#[command(name = "dealer_media")]
#[command(about = "Media asset lifecycle manager for dealership inventory records")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue presigned upload URLs for client-side uploads
    Presign {
        /// Record identifier; omit for the flat namespace
        #[arg(long)]
        identifier: Option<String>,
        /// File names to sign (comma-separated)
        #[arg(long)]
        files: String,
    },
    /// Upload local files, linking them to records by filename prefix
    Upload {
        /// Paths of the files to upload
        paths: Vec<PathBuf>,
    },
    /// Upload local files into one specific record
    Add {
        identifier: String,
        /// Paths of the files to upload
        paths: Vec<PathBuf>,
    },
    /// Merge keys from completed client-side uploads into a record
    Merge {
        identifier: String,
        /// Object keys returned by the presign step (comma-separated)
        #[arg(long)]
        keys: String,
    },
    /// Remove asset references by position, deleting the stored objects
    Remove {
        identifier: String,
        /// Positions to remove (comma-separated, zero-based)
        #[arg(long)]
        indices: String,
    },
    /// Move a record's assets to the canonical key layout
    Migrate {
        identifier: String,
        /// Execute the plan; default is a dry run
        #[arg(long)]
        apply: bool,
    },
    /// Create or reset a record (seeding helper)
    Seed {
        identifier: String,
        /// Initial reference URLs (comma-separated)
        #[arg(long, default_value = "")]
        references: String,
    },
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn content_type_for(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn read_files(paths: &[PathBuf]) -> Result<Vec<IncomingFile>, Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("not a file path: {}", path.display()))?
            .to_string();
        files.push(IncomingFile {
            content_type: content_type_for(path),
            bytes: std::fs::read(path)?,
            file_name,
        });
    }
    Ok(files)
}

#[cfg(feature = "db")]
async fn build_records() -> Result<Arc<dealer_media::infra::libsql_records::LibsqlRecordStore>, Box<dyn std::error::Error>>
{
    let records = dealer_media::infra::libsql_records::LibsqlRecordStore::new().await?;
    records.run_migrations().await?;
    Ok(Arc::new(records))
}

#[cfg(not(feature = "db"))]
async fn build_records(
) -> Result<Arc<dealer_media::infra::memory_records::MemoryRecordStore>, Box<dyn std::error::Error>>
{
    warn!("built without the `db` feature; records live in memory for this process only");
    Ok(Arc::new(
        dealer_media::infra::memory_records::MemoryRecordStore::new(),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    let objects: Arc<dyn ObjectStore> = Arc::new(SupabaseObjectStore::from_env()?);
    let concrete_records = build_records().await?;
    let records: Arc<dyn RecordStore> = concrete_records.clone();
    let transaction = Arc::new(AssetTransaction::new(records, objects.clone()));

    match cli.command {
        Commands::Presign { identifier, files } => {
            let specs: Vec<FileSpec> = split_list(&files)
                .into_iter()
                .map(|file_name| FileSpec {
                    file_name,
                    content_type: None,
                })
                .collect();
            let use_case = PresignUseCase::new(objects, config.uploads);
            let batch = use_case.issue(identifier.as_deref(), &specs).await?;
            print_json(&batch)?;
            println!("\n⏱  URLs expire in {} seconds", batch.expires_in_secs);
        }
        Commands::Upload { paths } => {
            let files = read_files(&paths)?;
            let use_case = UploadUseCase::new(objects, transaction, config.uploads);
            let outcome = use_case.upload_batch(&files).await?;
            print_json(&outcome)?;
            println!(
                "\n📊 Uploaded {} file(s): {} record(s) linked, {} unmatched",
                files.len(),
                outcome.linked.len(),
                outcome.unmatched.len()
            );
            if !outcome.unmatched.is_empty() {
                warn!(
                    "{} group(s) had no matching record",
                    outcome.unmatched.len()
                );
            }
        }
        Commands::Add { identifier, paths } => {
            let files = read_files(&paths)?;
            let use_case = UploadUseCase::new(objects, transaction, config.uploads);
            let added = use_case.add_to_record(&identifier, &files).await?;
            print_json(&added)?;
        }
        Commands::Merge { identifier, keys } => {
            let use_case = MergeUseCase::new(objects, transaction);
            let merged = use_case
                .merge_keys(&identifier, &split_list(&keys))
                .await?;
            print_json(&merged)?;
        }
        Commands::Remove {
            identifier,
            indices,
        } => {
            let parsed: Vec<usize> = split_list(&indices)
                .iter()
                .map(|raw| raw.parse())
                .collect::<Result<_, _>>()
                .map_err(|e| format!("invalid index list '{indices}': {e}"))?;
            let report = transaction.remove_indices(&identifier, &parsed).await?;
            print_json(&report)?;
            println!(
                "\n📊 Removed {} reference(s); {} object deletion(s) failed",
                report.summary.processed, report.summary.failed
            );
        }
        Commands::Migrate { identifier, apply } => {
            let use_case = MigrateUseCase::new(objects, transaction);
            let report = use_case.run(&identifier, !apply).await?;
            print_json(&report)?;
            if report.dry_run {
                println!(
                    "\n📋 Dry run: {} move(s) planned, {} reference(s) skipped",
                    report.plan.moves.len(),
                    report.plan.skipped.len()
                );
            } else {
                println!(
                    "\n📊 Migration: {} moved, {} failure(s)",
                    report.moved,
                    report.failures.len()
                );
            }
        }
        Commands::Seed {
            identifier,
            references,
        } => {
            let references = split_list(&references);
            seed_record(&concrete_records, &identifier, references).await?;
            info!(identifier = %identifier, "record seeded");
        }
    }

    Ok(())
}

#[cfg(feature = "db")]
async fn seed_record(
    records: &dealer_media::infra::libsql_records::LibsqlRecordStore,
    identifier: &str,
    references: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    records.upsert_record(identifier, &references).await?;
    Ok(())
}

#[cfg(not(feature = "db"))]
async fn seed_record(
    records: &dealer_media::infra::memory_records::MemoryRecordStore,
    identifier: &str,
    references: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    records.insert_record(identifier, references);
    Ok(())
}
