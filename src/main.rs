//! docqa CLI entry point

use clap::{Parser, Subcommand};
use docqa::{
    commands::{cmd_ask, cmd_crawl, print_ask_report, print_crawl_report, AskOptions, CrawlOptions},
    config::Config,
    error::Result,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(version, about = "Ask questions about a documentation site", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a documentation site and export the corpus as CSV
    Crawl {
        /// Root URL to crawl from
        url: String,

        /// Output CSV path
        #[arg(short, long, default_value = "corpus.csv")]
        out: PathBuf,

        /// Restrict crawling to this URL prefix (defaults to the root URL)
        #[arg(long)]
        scope: Option<String>,

        /// Maximum pages to fetch
        #[arg(long)]
        max_pages: Option<u32>,

        /// Number of concurrent fetch workers
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Answer a question against a crawled corpus
    Ask {
        /// The question to answer
        question: String,

        /// Crawl this URL to build the corpus
        #[arg(short, long)]
        url: Option<String>,

        /// Load a previously exported corpus CSV instead of crawling
        #[arg(long, conflicts_with = "url")]
        corpus: Option<PathBuf>,

        /// Number of passages to retrieve
        #[arg(short, long)]
        k: Option<usize>,

        /// Also export the crawled corpus to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Crawl {
            url,
            out,
            scope,
            max_pages,
            concurrency,
        } => {
            let options = CrawlOptions {
                scope,
                max_pages,
                concurrency,
            };

            let report = cmd_crawl(&config, &url, &out, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_crawl_report(&report);
            }
        }

        Commands::Ask {
            question,
            url,
            corpus,
            k,
            export,
        } => {
            let options = AskOptions {
                url,
                corpus,
                k,
                export,
            };

            let report = cmd_ask(&config, &question, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_ask_report(&report);
            }
        }
    }

    Ok(())
}
