mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wreck::config;

#[derive(Parser)]
#[command(name = "wreck", version, about = "Semantic search and streamed answers over a blog-post corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the passages most relevant to a query
    Search {
        query: String,
        /// Number of passages (clamped to 1-10)
        #[arg(short, long, allow_negative_numbers = true)]
        matches: Option<i64>,
    },
    /// Answer a question from the most relevant passages
    Ask {
        query: String,
        /// Number of passages fed to the model (clamped to 1-10)
        #[arg(short, long, allow_negative_numbers = true)]
        matches: Option<i64>,
    },
    /// Show corpus statistics
    Stats,
    /// Request a Lightning invoice to tip the bot
    Tip {
        /// Amount in millisatoshis
        #[arg(long)]
        amount_msat: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let mut config = config::WreckConfig::load()?;

    // Log to stderr so stdout stays clean for answers and invoices.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            wreck::server::serve(config).await?;
        }
        Command::Search { query, matches } => cli::search::search(&config, &query, matches).await?,
        Command::Ask { query, matches } => cli::ask::ask(&config, &query, matches).await?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Tip { amount_msat } => cli::tip::tip(&config, amount_msat).await?,
    }

    Ok(())
}
