use anyhow::Result;
use clap::{Parser, Subcommand};
use geochat::config::Config;
use geochat::session::SessionClient;
use geochat::transport::{cli, http};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "geochat")]
#[command(author, version, about = "Chat front-end for geospatial territory analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file (default: GEOCHAT_CONFIG or the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web chat server
    Serve {
        /// Port to listen on (default: from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default: from config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Interactive chat in the terminal
    Chat,

    /// Connect to the MCP servers and list their tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    let filter = if cli.verbose || config.profile.verbose_logging() {
        "geochat=debug"
    } else {
        "geochat=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(
        "geochat {} ({} profile)",
        geochat::version(),
        config.profile.as_str()
    );

    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let session = Arc::new(SessionClient::new(config));
            tracing::info!("Starting web chat for session {}", session.id());

            let result =
                http::run_http_server(&host, port, session.clone(), http::shutdown_signal()).await;
            session.close().await;
            result?;
        }
        Commands::Chat => {
            let session = Arc::new(SessionClient::new(config));
            cli::run_interactive(session).await?;
        }
        Commands::Tools => {
            let session = Arc::new(SessionClient::new(config));
            cli::list_tools(session).await?;
        }
    }

    Ok(())
}
