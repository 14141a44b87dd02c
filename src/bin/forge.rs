//! # ProxyForge Daemon
//!
//! The service entry point: loads configuration from the environment (and
//! an optional `.env`), wires the pool, forwarder, and gateway together,
//! and serves until interrupted.

use clap::Parser;
use log::{error, info};
use proxyforge::{
    Fetcher, Forwarder, ProxyPool, Requestor, Settings, Validator,
    config::loader,
    gateway::{self, AppState},
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "forge",
    about = "Self-replenishing free-proxy pool with a forwarding HTTP gateway",
    version
)]
struct Cli {
    /// Interface to bind (overrides HOST)
    #[arg(long, value_name = "ADDR")]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Log filter (overrides LOG_LEVEL)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn init_logging(settings: &Settings) -> std::io::Result<()> {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    let filter = if settings.debug && settings.log_level.eq_ignore_ascii_case("info") {
        "debug"
    } else {
        settings.log_level.as_str()
    };
    builder.parse_filters(filter);

    if let Some(path) = &settings.log_file {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        builder.target(pretty_env_logger::env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

async fn run(settings: Settings) -> std::io::Result<()> {
    let fetcher = Fetcher::with_defaults();
    let validator = Validator::from_settings(&settings);
    let requestor = Requestor::with_timeout(settings.request_timeout);

    let pool = Arc::new(ProxyPool::new(&settings, fetcher.clone(), validator));
    let forwarder = Arc::new(Forwarder::new(Arc::new(requestor), &settings));

    Arc::clone(&pool).start().await;
    info!("ProxyForge started");

    let state = AppState {
        pool: Arc::clone(&pool),
        forwarder,
        fetcher,
    };

    let served = gateway::serve(&settings, state).await;

    info!("ProxyForge shutting down");
    pool.stop().await;
    served
}

#[tokio::main]
async fn main() -> ExitCode {
    // Seed the environment from .env before reading configuration.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut settings = match loader::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }

    if let Err(e) = init_logging(&settings) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
