//! imgrelay CLI — upload images through the relay from the terminal.
//!
//! Set RELAY_URL to point at a running relay (default http://localhost:4000).
//! Upload history is kept under HISTORY_PATH (default .imgrelay).

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use imgrelay_cli::{content_type_from_path, format_entry, init_tracing};
use imgrelay_client::RelayClient;
use imgrelay_core::links::LinkFormat;
use imgrelay_core::models::{SourceFile, UploadStatus};
use imgrelay_core::Config;
use imgrelay_processing::{FileValidator, ProcessingOptions, TargetFormat};
use imgrelay_store::{FileSlot, HistoryConfig, HistoryStore};
use imgrelay_uploader::{QueueOptions, UploadQueue};

const HISTORY_KEY: &str = "upload_history";

#[derive(Parser)]
#[command(name = "imgrelay", about = "Upload images through the relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more image files
    Upload {
        /// Paths of the images to upload
        files: Vec<std::path::PathBuf>,
        /// Link format for output: direct, markdown, html, bbcode
        #[arg(long, default_value = "direct")]
        format: String,
        /// Upload original bytes without resize/re-encode
        #[arg(long)]
        no_process: bool,
    },
    /// Download an image from a URL and upload it
    UploadUrl {
        /// URL of the image
        url: String,
        /// Link format for output: direct, markdown, html, bbcode
        #[arg(long, default_value = "direct")]
        format: String,
    },
    /// Delete an uploaded image by its delete-hash
    Delete {
        /// Delete-hash returned at upload time
        delete_hash: String,
    },
    /// Upload history
    History {
        #[command(subcommand)]
        sub: HistoryCommands,
    },
    /// Render a link format for an existing image URL
    Link {
        /// Image URL
        url: String,
        /// Link format: direct, markdown, html, bbcode
        #[arg(long, default_value = "markdown")]
        format: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List recorded uploads, newest first
    List {
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Remove one entry by id
    Remove {
        /// Entry id
        id: String,
    },
    /// Remove all entries
    Clear,
    /// Show storage usage against the budget
    Usage,
}

fn build_queue(config: &Config, history: Arc<HistoryStore>, processing: bool) -> anyhow::Result<UploadQueue> {
    let client = RelayClient::new(config.relay_url.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create relay client: {}", e))?;
    let validator = FileValidator::new(
        config.max_file_size_bytes,
        config.accepted_content_types.clone(),
    );

    let processing = if processing && config.enable_processing {
        Some(ProcessingOptions {
            quality: config.process_quality,
            max_width: config.process_max_width,
            max_height: config.process_max_height,
            target_format: TargetFormat::parse(&config.process_format)?,
            enable_compression: true,
        })
    } else {
        None
    };

    Ok(UploadQueue::new(
        Arc::new(client),
        history,
        validator,
        QueueOptions {
            max_queue_files: config.max_queue_files,
            processing,
        },
    ))
}

async fn open_history(config: &Config) -> anyhow::Result<Arc<HistoryStore>> {
    let slot = FileSlot::new(config.history_path.clone(), HISTORY_KEY)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open history storage: {}", e))?;
    Ok(Arc::new(HistoryStore::new(
        Arc::new(slot),
        HistoryConfig {
            max_items: config.history_max_items,
            max_storage_bytes: config.history_max_storage_bytes,
            eviction_chunk: config.history_eviction_chunk,
        },
    )))
}

/// Print the outcome of every item in the queue, links for successes and
/// messages for failures. Returns an error when nothing succeeded.
async fn report_outcome(queue: &UploadQueue, format: LinkFormat) -> anyhow::Result<()> {
    let mut successes = 0;
    let items = queue.items().await;
    for item in &items {
        match (&item.status, &item.result, &item.error) {
            (UploadStatus::Success, Some(result), _) => {
                successes += 1;
                println!("{}", format.render(&result.url));
                if let Some(delete_url) = &result.delete_url {
                    eprintln!("  delete: {}", delete_url);
                }
            }
            (_, _, Some(error)) => {
                eprintln!("{}: {}", item.source.filename, error);
            }
            _ => {}
        }
    }

    if items.len() > 1 {
        eprintln!("Uploaded {}/{}", successes, items.len());
    }
    if successes == 0 {
        anyhow::bail!("No uploads succeeded");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            files,
            format,
            no_process,
        } => {
            if files.is_empty() {
                anyhow::bail!("No files given");
            }
            let format = LinkFormat::parse(&format)?;
            let history = open_history(&config).await?;
            let queue = build_queue(&config, history, !no_process)?;

            for path in &files {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let filename = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("image.jpg")
                    .to_string();
                let source = SourceFile::new(
                    filename,
                    content_type_from_path(path),
                    bytes::Bytes::from(bytes),
                );
                queue
                    .enqueue(source)
                    .await
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
            }

            queue.upload_all().await;
            report_outcome(&queue, format).await?;
        }
        Commands::UploadUrl { url, format } => {
            let format = LinkFormat::parse(&format)?;
            let history = open_history(&config).await?;
            let queue = build_queue(&config, history, true)?;

            queue
                .enqueue_from_url(&url)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            queue.upload_all().await;
            report_outcome(&queue, format).await?;
        }
        Commands::Delete { delete_hash } => {
            let client = RelayClient::new(config.relay_url.clone())
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            client
                .delete(&delete_hash)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete: {}", e))?;
            println!("Deleted");
        }
        Commands::History { sub } => {
            let history = open_history(&config).await?;
            match sub {
                HistoryCommands::List { limit } => {
                    let entries = history.list().await;
                    if entries.is_empty() {
                        eprintln!("No uploads recorded");
                    }
                    for entry in entries.iter().take(limit) {
                        println!("{}", format_entry(entry));
                    }
                }
                HistoryCommands::Remove { id } => {
                    history.remove(&id).await;
                }
                HistoryCommands::Clear => {
                    history.clear().await;
                }
                HistoryCommands::Usage => {
                    let usage = history.usage().await;
                    println!(
                        "{} entries, {} of {} bytes used",
                        usage.entries, usage.serialized_bytes, usage.budget_bytes
                    );
                }
            }
        }
        Commands::Link { url, format } => {
            let format = LinkFormat::parse(&format)?;
            println!("{}", format.render(&url));
        }
    }

    Ok(())
}
