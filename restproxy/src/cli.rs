//! # CLI
//!
//! This module defines the command-line interface of `restproxy` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring each
//! operation argument is a JSON value).
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "restproxy", version, about = "Contract-driven REST CLI")]
pub struct Cli {
    /// Path to the JSON service contract
    #[arg(long, short = 'c')]
    pub contract: PathBuf,

    /// Path to a JSON session configuration ({"base_uri": ..., "timeout_secs": ..., "tls": ...})
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the service (e.g. http://localhost:8080/). Overrides the configuration file
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept any TLS certificate. Only meant for development servers
    #[arg(long)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Invoke an operation of the contract
    ///
    /// Arguments are positional, one per declared parameter. Each one is parsed as JSON;
    /// anything that is not valid JSON is sent as a string.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// restproxy --contract users.json --base-url http://localhost:8080/ call GetUser 42
    /// restproxy --contract users.json --base-url http://localhost:8080/ call Create '{"name": "Ada"}'
    /// ```
    Call {
        /// Name of the operation (e.g. GetUser)
        operation: String,

        /// Positional arguments, as JSON values. Use `null` to omit one
        #[arg(value_parser = parse_argument)]
        args: Vec<serde_json::Value>,
    },

    /// Verify the contract and list its operations with their routes
    Describe,
}

fn parse_argument(value: &str) -> Result<serde_json::Value, String> {
    Ok(serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_arguments_are_parsed() {
        assert_eq!(parse_argument("42"), Ok(json!(42)));
        assert_eq!(parse_argument("null"), Ok(json!(null)));
        assert_eq!(parse_argument(r#"{"a":1}"#), Ok(json!({ "a": 1 })));
    }

    #[test]
    fn bare_words_are_strings() {
        assert_eq!(parse_argument("ada"), Ok(json!("ada")));
    }

    #[test]
    fn call_command_collects_arguments() {
        let cli = Cli::parse_from([
            "restproxy",
            "--contract",
            "users.json",
            "--base-url",
            "http://localhost/",
            "call",
            "Search",
            "ada",
            "2",
        ]);

        match cli.command {
            Commands::Call { operation, args } => {
                assert_eq!(operation, "Search");
                assert_eq!(args, vec![json!("ada"), json!(2)]);
            }
            Commands::Describe => panic!("expected a call command"),
        }
    }
}
