//! gsm-crawler - Polite GSMArena device specification scraper
//!
//! Searches devices and prints normalized specification sheets.

use anyhow::Result;
use clap::{Parser, Subcommand};
use gsm_crawler::commands::{CacheCommand, DeviceCommand, SearchCommand};
use gsm_crawler::config::{Config, OutputFormat, TransportKind};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gsm-crawler",
    version,
    about = "Polite GSMArena device specification scraper",
    long_about = "Searches GSMArena, fetches device pages at a polite pace and normalizes their specification sheets."
)]
struct Cli {
    /// Output format (table, json, markdown, csv)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Page fetching strategy (http, browser)
    #[arg(short, long, global = true, env = "GSM_TRANSPORT")]
    transport: Option<TransportKind>,

    /// Minimum delay between requests in milliseconds
    #[arg(long, global = true, env = "GSM_DELAY")]
    delay: Option<u64>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "GSM_PROXY")]
    proxy: Option<String>,

    /// Bypass the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Cache directory
    #[arg(long, global = true, env = "GSM_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search devices by name (no query lists popular devices)
    #[command(alias = "s")]
    Search {
        /// Search query
        query: Vec<String>,

        /// Device category (informational; the site has no category filter)
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of results (1-5)
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Look up devices by page id (e.g. apple_iphone_15-12559)
    #[command(alias = "d")]
    Device {
        /// Device id(s) to look up
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List popular devices from the home page
    Popular,

    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove all cached responses
    Clear,
    /// Print the cache directory
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(transport) = cli.transport {
        config.transport = transport;
    }
    if let Some(delay) = cli.delay {
        config.min_interval_ms = delay;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = Some(dir);
    }
    config.no_cache |= cli.no_cache;

    match cli.command {
        Commands::Search { query, category, max } => {
            if let Some(max) = max {
                config.max_results = max;
            }

            let cmd = SearchCommand::new(config);
            let output = cmd.execute(&query.join(" "), category.as_deref()).await?;
            println!("{}", output);
        }

        Commands::Device { ids } => {
            let cmd = DeviceCommand::new(config);

            let output = if ids.len() == 1 {
                cmd.execute(&ids[0]).await?
            } else {
                cmd.execute_batch(&ids).await?
            };

            println!("{}", output);
        }

        Commands::Popular => {
            let cmd = SearchCommand::new(config);
            let output = cmd.execute("", None).await?;
            println!("{}", output);
        }

        Commands::Cache { action } => {
            let cmd = CacheCommand::new(config);
            match action {
                CacheAction::Clear => println!("{}", cmd.clear().await?),
                CacheAction::Path => println!("{}", cmd.path()),
            }
        }
    }

    Ok(())
}
