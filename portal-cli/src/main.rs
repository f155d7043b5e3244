//! Portal CLI
//!
//! Command-line access to the portal document library, bulletins, and
//! second-source data.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portal_cache::SharedLoader;
use portal_core::traits::{AuditLogger, Record, RecordStore};
use portal_core::types::{
    BulletinDraft, BulletinItem, CellValue, DataTable, DocumentDraft, DocumentItem,
    SecondSourceItem, UploadFile,
};
use portal_services::{
    BulletinService, CommonPoolService, DeleteOutcome, DocumentService, SecondSourceService,
};
use portal_storage::{
    BestEffortAuditLogger, FileRecordStore, FileResourceStore, JsonListLoader, JsonlAuditSink,
    TableDirectoryLoader,
};

use crate::config::PortalSettings;

/// Portal - documents, bulletins, and second-source data
#[derive(Parser)]
#[command(name = "portal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shared document library
    Documents {
        #[command(subcommand)]
        action: DocumentCommand,
    },

    /// Department bulletins
    Bulletins {
        #[command(subcommand)]
        action: BulletinCommand,
    },

    /// Second-source component list
    SecondSource {
        /// Bypass the cache
        #[arg(long)]
        reload: bool,
        /// JSON file holding the list (defaults to the data directory)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Common-pool table for one component type
    CommonPool {
        /// Component type, e.g. MLCC
        component_type: String,
        /// Bypass the cache
        #[arg(long)]
        reload: bool,
    },
}

#[derive(Subcommand)]
enum DocumentCommand {
    /// List documents, newest first
    List {
        #[arg(long)]
        reload: bool,
    },
    /// Upload a document
    Upload {
        file: PathBuf,
        #[command(flatten)]
        meta: DocumentMeta,
    },
    /// Delete a document and its file
    Delete {
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print where a document is stored and record the access
    Open { id: u64 },
}

#[derive(Args)]
struct DocumentMeta {
    #[arg(long)]
    year: i32,
    #[arg(long)]
    source: String,
    #[arg(long)]
    platform: String,
    #[arg(long)]
    version: String,
}

#[derive(Subcommand)]
enum BulletinCommand {
    /// List bulletins, newest first
    List {
        #[arg(long)]
        reload: bool,
    },
    /// Show one bulletin and record the access
    Show { id: u64 },
    /// Post a bulletin
    Upload {
        file: PathBuf,
        /// Posting department
        #[arg(long)]
        department: String,
    },
    /// Delete a bulletin and its file
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "portal=debug,portal_cache=debug,portal_services=debug,portal_storage=debug,info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = PortalSettings::from_env();

    match cli.command {
        Commands::Documents { action } => cmd_documents(&settings, action).await,
        Commands::Bulletins { action } => cmd_bulletins(&settings, action).await,
        Commands::SecondSource { reload, file } => cmd_second_source(&settings, reload, file).await,
        Commands::CommonPool { component_type, reload } => {
            cmd_common_pool(&settings, &component_type, reload).await
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIRING
// ═══════════════════════════════════════════════════════════════════════════════

async fn audit_logger(settings: &PortalSettings) -> Result<Arc<dyn AuditLogger>> {
    #[cfg(feature = "turso")]
    if let Some(url) = settings.get(config::TURSO_URL) {
        let token = settings.require(config::TURSO_AUTH_TOKEN)?;
        let conn = portal_storage::connect_remote(url, token)
            .await
            .context("Failed to connect to Turso")?;
        let sink = portal_storage::SqlAuditSink::new(conn);
        sink.ensure_schema().await.context("Failed to prepare audit table")?;
        return Ok(Arc::new(BestEffortAuditLogger::new(sink)));
    }

    Ok(Arc::new(BestEffortAuditLogger::new(JsonlAuditSink::new(
        settings.audit_log(),
    ))))
}

async fn record_store<R: Record>(path: PathBuf) -> Result<Arc<dyn RecordStore<R>>> {
    let store = FileRecordStore::<R>::open(&path)
        .await
        .with_context(|| format!("Failed to open record store {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Upload path has no file name")?;
    Ok(UploadFile::new(name, bytes))
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn confirm(prompt: &str, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn print_delete_outcome(kind: &str, id: u64, outcome: DeleteOutcome) {
    match outcome {
        DeleteOutcome::NotFound => {
            println!("{} no {} with id {}", "⚠️ ".yellow(), kind, id);
        }
        DeleteOutcome::AlreadyRemoved => {
            println!("{} {} {} was already removed", "⚠️ ".yellow(), kind, id);
        }
        DeleteOutcome::Deleted { resource_removed } => {
            println!("{} {} {} deleted", "✅".green(), kind, id);
            if !resource_removed {
                println!("   {}", "File was missing or could not be removed.".dimmed());
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

async fn cmd_documents(settings: &PortalSettings, action: DocumentCommand) -> Result<()> {
    let files = FileResourceStore::new(settings.document_files()?);
    let service = DocumentService::documents(
        record_store::<DocumentItem>(settings.data_dir().join("documents.prtl")).await?,
        Arc::new(files.clone()),
        audit_logger(settings).await?,
        settings.actor()?,
        settings.cache_config()?,
    );

    match action {
        DocumentCommand::List { reload } => {
            let documents = service.list(reload).await;
            println!("{} {} document(s)", "📄".cyan(), documents.len());
            for d in documents.iter() {
                println!(
                    "   {:>5}  {}  {:<12} {:<10} {:<8} {}  {}",
                    d.id.to_string().yellow(),
                    d.year,
                    d.source,
                    d.platform,
                    d.version,
                    d.file_name,
                    d.upload_time.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                );
            }
        }
        DocumentCommand::Upload { file, meta } => {
            let upload = read_upload(&file).await?;
            let draft = DocumentDraft {
                year: meta.year,
                source: meta.source,
                platform: meta.platform,
                version: meta.version,
            };
            let pb = spinner(&format!("Uploading {}", upload.name))?;
            let result = service.upload(upload, draft).await;
            pb.finish_and_clear();
            let stored = result.context("Upload failed")?;
            println!("{} document {} stored", "✅".green(), stored.id);
            println!("   {} {}", "Location:".dimmed(), stored.location);
        }
        DocumentCommand::Delete { id, yes } => {
            let Some(document) = service.find(id).await else {
                bail!("no document with id {id}");
            };
            if !confirm(&format!("Delete {} ({})?", document.file_name, document.version), yes)? {
                return Ok(());
            }
            let outcome = service.delete(id).await.context("Delete failed")?;
            print_delete_outcome("document", id, outcome);
        }
        DocumentCommand::Open { id } => {
            let Some(document) = service.find(id).await else {
                bail!("no document with id {id}");
            };
            let path = files.path_of(&document.location)?;
            service.log_open(&document).await;
            println!("{}", path.display());
        }
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        println!("{}", serde_json::to_string(&service.cache_stats())?.dimmed());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// BULLETINS
// ═══════════════════════════════════════════════════════════════════════════════

async fn cmd_bulletins(settings: &PortalSettings, action: BulletinCommand) -> Result<()> {
    let files = FileResourceStore::new(settings.bulletin_files()?);
    let service = BulletinService::bulletins(
        record_store::<BulletinItem>(settings.data_dir().join("bulletins.prtl")).await?,
        Arc::new(files.clone()),
        audit_logger(settings).await?,
        settings.actor()?,
        settings.cache_config()?,
    );

    match action {
        BulletinCommand::List { reload } => {
            let bulletins = service.list(reload).await;
            println!("{} {} bulletin(s)", "📢".cyan(), bulletins.len());
            for b in bulletins.iter() {
                println!(
                    "   {:>5}  {:<8} {}  {}",
                    b.id.to_string().yellow(),
                    b.department,
                    b.document,
                    b.upload_time.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                );
            }
        }
        BulletinCommand::Show { id } => {
            let Some(bulletin) = service.find(id).await else {
                bail!("no bulletin with id {id}");
            };
            service.log_open(&bulletin).await;
            println!("{} {}", "📢".cyan(), bulletin.document.bold());
            println!("   {} {}", "Department:".dimmed(), bulletin.department);
            println!("   {} {}", "Posted:".dimmed(), bulletin.upload_time.to_rfc3339());
            match &bulletin.location {
                Some(location) => println!("   {} {}", "File:".dimmed(), files.path_of(location)?.display()),
                None => println!("   {}", "No file attached.".dimmed()),
            }
        }
        BulletinCommand::Upload { file, department } => {
            let upload = read_upload(&file).await?;
            let pb = spinner(&format!("Posting {}", upload.name))?;
            let result = service.upload(upload, BulletinDraft { department }).await;
            pb.finish_and_clear();
            let stored = result.context("Upload failed")?;
            println!("{} bulletin {} posted for {}", "✅".green(), stored.id, stored.department);
        }
        BulletinCommand::Delete { id, yes } => {
            let Some(bulletin) = service.find(id).await else {
                bail!("no bulletin with id {id}");
            };
            if !confirm(&format!("Delete bulletin {}?", bulletin.document), yes)? {
                return Ok(());
            }
            let outcome = service.delete(id).await.context("Delete failed")?;
            print_delete_outcome("bulletin", id, outcome);
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECOND SOURCE / COMMON POOL
// ═══════════════════════════════════════════════════════════════════════════════

async fn cmd_second_source(settings: &PortalSettings, reload: bool, file: Option<PathBuf>) -> Result<()> {
    let path = file.unwrap_or_else(|| settings.data_dir().join("second_source.json"));
    let loader: SharedLoader<Vec<SecondSourceItem>> =
        Arc::new(JsonListLoader::<SecondSourceItem>::new(path));
    let service = SecondSourceService::new(loader, settings.cache_config()?);

    let items = service.items(reload).await;
    println!("{} {} second-source item(s)", "🔁".cyan(), items.len());
    for item in items.iter() {
        println!(
            "   {:>5}  {}  {:<20} {:<12} {:<12} {}",
            item.id.to_string().yellow(),
            item.date.as_deref().unwrap_or("-"),
            item.candidate_pn,
            item.candidate_vendor,
            item.component_status,
            item.main_source_mpn.dimmed(),
        );
    }
    Ok(())
}

async fn table_loader(settings: &PortalSettings) -> Result<SharedLoader<DataTable>> {
    #[cfg(feature = "turso")]
    if let Some(url) = settings.get(config::TURSO_URL) {
        let token = settings.require(config::TURSO_AUTH_TOKEN)?;
        let conn = portal_storage::connect_remote(url, token)
            .await
            .context("Failed to connect to Turso")?;
        return Ok(Arc::new(portal_storage::SqlTableLoader::new(conn)));
    }

    Ok(Arc::new(TableDirectoryLoader::new(
        settings.data_dir().join("common_pool"),
    )))
}

async fn cmd_common_pool(settings: &PortalSettings, component_type: &str, reload: bool) -> Result<()> {
    let service = CommonPoolService::new(table_loader(settings).await?, settings.cache_config()?);
    let table = service
        .table(component_type, reload)
        .await
        .context("Invalid component type")?;

    println!("{} {} row(s) for {}", "🧩".cyan(), table.len(), component_type.bold());
    println!("   {}", table.columns.join(" | ").dimmed());
    for row in &table.rows {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|c| row.get(c).map(render_cell).unwrap_or_default())
            .collect();
        println!("   {}", cells.join(" | "));
    }
    Ok(())
}

fn render_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Real(r) => r.to_string(),
        CellValue::Text(s) => s.clone(),
        CellValue::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
