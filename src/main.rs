use anyhow::Context;
use clap::{Parser, Subcommand};
use content_index::config::{Config, CounterUpdateMode};
use content_index::{ContentIndex, RawMetadata};
use serde::Serialize;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "content-index")]
#[command(about = "Multi-tenant content index and discovery", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $CONTENT_INDEX_CONFIG or config/content-index.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Tenant partition; omit for the global partition
    #[arg(short, long, global = true, env = "CONTENT_INDEX_TENANT")]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index file metadata given as a JSON object (read from stdin when omitted)
    Ingest {
        #[arg(value_name = "JSON")]
        metadata: Option<String>,
    },

    /// Remove a record
    Remove {
        #[arg(value_name = "RECORD_ID")]
        id: String,
    },

    /// Show a single record
    Get {
        #[arg(value_name = "RECORD_ID")]
        id: String,
    },

    /// Keyword search
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Random eligible records, biased towards quality
    Random {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Most recently indexed eligible records
    Recent {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Most downloaded / viewed / shared eligible records
    Popular {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Partition statistics
    Stats {
        /// Include quality, source and activity breakdowns
        #[arg(short, long)]
        detailed: bool,
    },

    /// Count a download of a record
    Download {
        #[arg(value_name = "RECORD_ID")]
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config);

    // The process exits right after the command, so spawned counter batches would be lost
    config.search.counter_update_mode = CounterUpdateMode::Inline;

    tracing::debug!(backend = ?config.state.backend, "Opening content index");
    let index = ContentIndex::from_config(&config)
        .await
        .context("Failed to open content index")?;

    let tenant = cli.tenant.as_deref();

    match cli.command {
        Commands::Ingest { metadata } => {
            let text = match metadata {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            let raw: RawMetadata =
                serde_json::from_str(&text).context("Metadata is not a JSON object")?;

            let record_id = index.ingest(tenant, &raw).await?;
            print_json(&json!({ "record_id": record_id }))?;
        }

        Commands::Remove { id } => {
            let removed = index.remove(tenant, &id).await?;
            print_json(&json!({ "record_id": id, "removed": removed }))?;
        }

        Commands::Get { id } => match index.get(tenant, &id).await? {
            Some(record) => print_json(&record)?,
            None => anyhow::bail!("Record '{}' not found", id),
        },

        Commands::Search { query, limit } => {
            print_json(&index.search(tenant, &query, limit).await)?;
        }

        Commands::Random { limit } => {
            print_json(&index.random(tenant, limit).await)?;
        }

        Commands::Recent { limit } => {
            print_json(&index.recent(tenant, limit).await)?;
        }

        Commands::Popular { limit } => {
            print_json(&index.popular(tenant, limit).await)?;
        }

        Commands::Stats { detailed } => {
            if detailed {
                let stats = index
                    .detailed_stats(tenant)
                    .await
                    .context("Detailed statistics are unavailable")?;
                print_json(&stats)?;
            } else {
                print_json(&index.stats(tenant).await)?;
            }
        }

        Commands::Download { id } => {
            let counted = index.record_download(tenant, &id).await?;
            print_json(&json!({ "record_id": id, "counted": counted }))?;
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("content_index={}", config.observability.log_level)));

    // Logs go to stderr; stdout carries the JSON result
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
