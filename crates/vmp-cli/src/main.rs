//! Command-line interface for the VMP device query service.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vmp_core::ServerConfig;

/// VMP device query service - synchronous queries over asynchronous device signaling.
#[derive(Parser, Debug)]
#[command(name = "vmp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./config.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web server.
    Serve {
        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to.
        #[arg(short, long)]
        port: Option<u16>,
        /// JSON file with devices and channels to preload.
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Print the resolved configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    init_logging(config.log_json, args.verbose);
    tracing::info!(
        category = "config",
        path = ?args.config,
        bind = %config.bind,
        "Configuration loaded"
    );

    match args.command {
        Command::Serve { host, port, seed } => {
            config.bind = override_bind(config.bind, host.as_deref(), port)?;
            tracing::info!(
                category = "server",
                bind = %config.bind,
                seed = ?seed,
                "Starting device query service"
            );
            vmp_api::run(config, seed.as_deref()).await
        }
        Command::CheckConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_logging(json_logging: bool, verbose: bool) {
    let default_directive = if verbose { "vmp=debug" } else { "vmp=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    if json_logging {
        // JSON format for production/container environments
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

/// Apply `--host`/`--port` on top of the configured bind address.
fn override_bind(bind: SocketAddr, host: Option<&str>, port: Option<u16>) -> Result<SocketAddr> {
    let ip = match host {
        Some(host) => host
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("Invalid host: {}", host))?,
        None => bind.ip(),
    };
    Ok(SocketAddr::new(ip, port.unwrap_or(bind.port())))
}
