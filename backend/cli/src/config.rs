//! Configuration management for the operator CLI.
//!
//! Settings come from environment variables; command-line flags override
//! them in `main`.

use wakaf_protocol::Address;

use crate::errors::{CliError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ledger service (e.g. http://127.0.0.1:8080)
    pub node_url: String,

    /// Account the write commands are submitted as
    pub caller: Option<Address>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional variables (with defaults):
    /// - `NODE_URL`: ledger service, defaults to `http://127.0.0.1:8080`
    /// - `CALLER_ADDRESS`: account for write commands, no default
    /// - `TIMEOUT_SECS`: request timeout, defaults to 30
    pub fn from_env() -> Result<Self> {
        let caller = env_var("CALLER_ADDRESS")
            .ok()
            .map(|raw| parse_caller(&raw))
            .transpose()?;

        Ok(Config {
            node_url: env_var("NODE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),

            caller,

            timeout_secs: env_var("TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| CliError::Config("Invalid TIMEOUT_SECS".to_string()))?,
        })
    }

    /// Validate that the configuration is well-formed.
    pub fn validate(&self) -> Result<()> {
        if !self.node_url.starts_with("http") {
            return Err(CliError::Config(
                "NODE_URL must be a valid HTTP(S) URL".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(CliError::Config(
                "TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured caller, required by every write command.
    pub fn require_caller(&self) -> Result<Address> {
        self.caller.ok_or_else(|| {
            CliError::Config("No caller set; pass --caller or set CALLER_ADDRESS".to_string())
        })
    }
}

pub fn parse_caller(raw: &str) -> Result<Address> {
    raw.trim()
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid caller address: {e}")))
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| CliError::Config(format!("Missing environment variable: {key}")))
}
