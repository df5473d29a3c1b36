//! # Restproxy CLI Entry Point
//!
//! The main executable for the Restproxy tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs logging.
//! 2. **Loading**: Reads the service contract and the session configuration.
//! 3. **Execution**: Verifies the contract and dispatches the operation through `restproxy_core`.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use formatter::{FormattedString, GenericError};
use restproxy_core::contract::verify::verify;
use restproxy_core::{Arguments, RestProxyManager, ServiceContract, SessionConfig, TlsTrust};
use std::path::Path;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Cli::parse();

    let contract = match load_contract(&args.contract) {
        Ok(contract) => contract,
        Err(err) => exit_with(GenericError("Failed to load contract", format!("{err:#}"))),
    };

    match &args.command {
        Commands::Describe => describe(contract),
        Commands::Call {
            operation,
            args: values,
        } => {
            let config = match session_config(&args) {
                Ok(config) => config,
                Err(err) => exit_with(GenericError("Invalid session", format!("{err:#}"))),
            };
            run_call(config, contract, operation, values.clone()).await;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with(message: impl Into<FormattedString>) -> ! {
    eprintln!("{}", message.into());
    process::exit(1);
}

fn describe(contract: ServiceContract) {
    if let Err(err) = verify(&contract) {
        exit_with(err);
    }

    println!("{}", FormattedString::from(&contract));
}

async fn run_call(
    config: SessionConfig,
    contract: ServiceContract,
    operation: &str,
    args: Vec<serde_json::Value>,
) {
    let manager = match RestProxyManager::new(config) {
        Ok(manager) => manager,
        Err(err) => exit_with(err),
    };

    let proxy = match manager.proxy(contract, true) {
        Ok(proxy) => proxy,
        Err(err) => exit_with(err),
    };

    match proxy
        .invoke::<serde_json::Value>(operation, Arguments::from(args))
        .await
    {
        Ok(result) => println!("{}", FormattedString::from(result)),
        Err(err) => exit_with(err),
    }
}

fn load_contract(path: &Path) -> anyhow::Result<ServiceContract> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading contract file {}", path.display()))?;

    serde_json::from_str(&raw).with_context(|| format!("parsing contract file {}", path.display()))
}

/// Builds the session configuration: the `--config` file if given, then the flags on top.
fn session_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => {
            let base_url = cli
                .base_url
                .clone()
                .context("either --base-url or --config must be given")?;
            SessionConfig::new(base_url)
        }
    };

    if let Some(base_url) = &cli.base_url {
        config.base_uri = base_url.clone();
    }

    if let Some(timeout) = cli.timeout {
        config.timeout = Duration::from_secs(timeout);
    }

    if cli.insecure {
        config.tls = TlsTrust::AcceptAnyCertificate;
    }

    Ok(config)
}
