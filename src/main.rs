//! exchange-router
//!
//! Loads a broker topology from TOML and either validates it, routes a
//! single message through it, or serves a JSON-lines command shell.
//!
//! ```text
//!                ┌──────────────────────────────────────────────┐
//!  topology.toml │  config ──▶ broker::topology ──▶ registry     │
//!  ─────────────▶│                                   ▲          │
//!                │                                   │ snapshot │
//!  stdin (JSON)  │  serve ──▶ session::Channel ──▶ routing      │ stdout (JSON)
//!  ─────────────▶│                                   │          │──────────────▶
//!                │                              Destinations    │
//!                └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use exchange_router::broker::{apply_topology, Broker};
use exchange_router::config::{load_config, watcher::ConfigWatcher, BrokerConfig};
use exchange_router::lifecycle::{signals::shutdown_signal, Shutdown};
use exchange_router::observability::{logging::init_logging, metrics::init_metrics};
use exchange_router::routing::{Envelope, HeaderTable, HeaderValue};
use exchange_router::serve::StdioServer;

#[derive(Parser)]
#[command(name = "exchange-router")]
#[command(about = "Route messages through exchanges and bindings", long_about = None)]
struct Cli {
    /// Topology file
    #[arg(short, long, default_value = "topology.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the topology and print what it declares
    Check,
    /// Route one message and print its destinations
    Route {
        #[arg(short, long)]
        exchange: String,

        #[arg(short = 'k', long, default_value = "")]
        routing_key: String,

        /// Message header as name=value; value is read as JSON, else as a string
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, HeaderValue)>,
    },
    /// Serve JSON-lines commands on stdin/stdout
    Serve {
        /// Reload the topology when the file changes
        #[arg(long)]
        watch: bool,
    },
}

fn parse_header(raw: &str) -> Result<(String, HeaderValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| HeaderValue::from(value));
    Ok((name.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config.observability.log_level);

    tracing::info!(
        path = ?cli.config,
        exchanges = config.exchanges.len(),
        queues = config.queues.len(),
        bindings = config.bindings.len(),
        "Topology loaded"
    );

    let broker = Arc::new(Broker::from_settings(&config.broker));
    let report = apply_topology(&broker, &config, None)?;

    match cli.command {
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Route {
            exchange,
            routing_key,
            headers,
        } => {
            let mut envelope = Envelope::new(routing_key);
            if !headers.is_empty() {
                envelope = envelope.with_headers(headers.into_iter().collect::<HeaderTable>());
            }
            let destinations = broker.publish(&exchange, &envelope)?;
            println!("{}", serde_json::to_string(&destinations)?);
        }
        Commands::Serve { watch } => serve(broker, config, cli.config, watch).await?,
    }

    Ok(())
}

async fn serve(
    broker: Arc<Broker>,
    config: BrokerConfig,
    path: PathBuf,
    watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let (watcher, updates) = ConfigWatcher::new(&path);
    // Dropping the handle stops the watch
    let _watch_handle = if watch { Some(watcher.run()?) } else { None };

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn({
        let shutdown = Arc::clone(&shutdown);
        async move {
            shutdown_signal().await;
            shutdown.trigger();
        }
    });

    let summary = StdioServer::new(&broker, Some(config))
        .run(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            updates,
            shutdown.subscribe(),
        )
        .await?;

    tracing::info!(commands = summary.commands, "Shutdown complete");
    Ok(())
}
