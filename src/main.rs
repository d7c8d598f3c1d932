//! review-grabber - Amazon product review extraction CLI
//!
//! A Rust implementation with TLS fingerprint emulation for reliable scraping.

use anyhow::Result;
use clap::{Parser, Subcommand};
use review_grabber::commands::{BatchCommand, BatchMode, GrabCommand, ShellSession};
use review_grabber::config::{Config, SparsePagePolicy};
use review_grabber::reviews::ReviewAccumulator;
use review_grabber::store::ReviewStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "review-grabber",
    version,
    about = "Amazon product review extraction CLI",
    long_about = "Extracts the full review history of Amazon products by walking their paginated review listings, with SQLite persistence and CSV export."
)]
struct Cli {
    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "RG_PROXY")]
    proxy: Option<String>,

    /// Delay between page requests in milliseconds
    #[arg(long, default_value = "2000", global = true, env = "RG_DELAY")]
    delay: u64,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long, global = true, env = "RG_DB")]
    db: Option<PathBuf>,

    /// How to treat a page that yields fewer than 50 reviews
    #[arg(long, global = true)]
    sparse_page: Option<SparsePagePolicy>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract reviews for one product review address
    #[command(alias = "g")]
    Get {
        /// Product review listing address
        url: String,

        /// Save recovered rows to this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Extract reviews for every address in a file, one per line
    #[command(alias = "b")]
    Batch {
        /// auto saves when the batch finishes, manual only prints reports
        mode: BatchMode,

        /// Newline-delimited file of review listing addresses
        file: PathBuf,

        /// Table for auto mode
        #[arg(short, long, default_value = "default")]
        table: String,
    },

    /// List saved tables and their row counts
    Tables,

    /// Export a saved table to a timestamped CSV file
    Csv {
        /// Table to export
        table: String,

        /// Directory to write the file into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Start an interactive session
    Shell,
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

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.delay_ms = cli.delay;

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(policy) = cli.sparse_page {
        config.sparse_page = policy;
    }

    // First Ctrl-C asks running work to stop at the next page boundary.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[!] Stopping after the current page...");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    match cli.command {
        Commands::Get { url, table } => {
            let cmd = GrabCommand::new(config.clone());
            let mut acc = ReviewAccumulator::new();
            let report = cmd.execute(&url, &mut acc, &cancel).await?;
            println!("{report}");

            if let Some(table) = table {
                if acc.is_empty() {
                    println!("[!] Nothing to save");
                } else {
                    let mut store = ReviewStore::open(&config.db_path)?;
                    let rows = acc.take();
                    let saved = store.append(&table, &rows)?;
                    println!("[+] Saved {saved} rows to table '{table}'");
                }
            }
        }

        Commands::Batch { mode, file, table } => {
            let cmd = BatchCommand::new(config, mode, table);
            let mut acc = ReviewAccumulator::new();
            let reports = cmd.execute(&file, &mut acc, &cancel).await?;
            for report in reports {
                println!("{report}");
            }
            if mode == BatchMode::Manual && !acc.is_empty() {
                println!(
                    "[i] {} rows recovered but not saved (use 'get --table' or the shell to persist)",
                    acc.len()
                );
            }
        }

        Commands::Tables => {
            let store = ReviewStore::open(&config.db_path)?;
            let tables = store.tables()?;
            if tables.is_empty() {
                println!("No tables yet");
            } else {
                println!("{:<30} {:<10}", "Table", "Rows");
                println!("{:-<30} {:-<10}", "", "");
                for (name, rows) in tables {
                    println!("{:<30} {:<10}", name, rows);
                }
            }
        }

        Commands::Csv { table, out } => {
            let store = ReviewStore::open(&config.db_path)?;
            let path = store.export_csv(&table, &out)?;
            println!("[+] Wrote {}", path.display());
        }

        Commands::Shell => {
            let mut session = ShellSession::new(config, cancel);
            session.run().await?;
        }
    }

    Ok(())
}
