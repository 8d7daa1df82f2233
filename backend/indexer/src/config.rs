//! Configuration management for the indexer service.
//!
//! Loads all settings from environment variables. Unset genesis roles fall
//! back to the deployer, and the escrow owner falls back to the nazir.

use std::net::SocketAddr;

use wakaf_protocol::{Address, GenesisConfig};

use crate::errors::{IndexerError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite URL for the event index (e.g. `sqlite:wakaf.db`)
    pub database_url: String,

    /// Address the REST API listens on
    pub bind_addr: SocketAddr,

    /// Contracts deployed at startup
    pub genesis: GenesisConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `DEPLOYER_ADDRESS`: account deploying both contracts
    ///
    /// Optional variables (with defaults):
    /// - `DATABASE_URL`: defaults to `sqlite:wakaf.db`
    /// - `BIND_ADDR`: defaults to `0.0.0.0:8080`
    /// - `IDR_OWNER_ADDRESS`: MockIDR owner, defaults to the deployer
    /// - `NAZIR_ADDRESS`: initial nazir, defaults to the deployer
    /// - `WAKAF_OWNER_ADDRESS`: escrow owner, defaults to the nazir
    /// - `INITIAL_HOLDERS`: comma-separated genesis holders, defaults to none
    /// - `TOKEN_NAME` / `TOKEN_SYMBOL`: default `Mock IDR` / `MIDR`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let deployer = parse_address(
            "DEPLOYER_ADDRESS",
            &var("DEPLOYER_ADDRESS").ok_or_else(|| {
                IndexerError::Config(
                    "Missing required environment variable: DEPLOYER_ADDRESS".to_string(),
                )
            })?,
        )?;

        let optional_address = |key: &str| -> Result<Option<Address>> {
            var(key).map(|raw| parse_address(key, &raw)).transpose()
        };

        let token_owner = optional_address("IDR_OWNER_ADDRESS")?.unwrap_or(deployer);
        let initial_nazir = optional_address("NAZIR_ADDRESS")?.unwrap_or(deployer);
        let wakaf_owner = optional_address("WAKAF_OWNER_ADDRESS")?.unwrap_or(initial_nazir);

        let initial_holders = match var("INITIAL_HOLDERS") {
            Some(raw) => parse_holders(&raw)?,
            None => Vec::new(),
        };

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| IndexerError::Config("Invalid BIND_ADDR".to_string()))?;

        Ok(Config {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite:wakaf.db".to_string()),
            bind_addr,
            genesis: GenesisConfig {
                deployer,
                token_name: var("TOKEN_NAME").unwrap_or_else(|| "Mock IDR".to_string()),
                token_symbol: var("TOKEN_SYMBOL").unwrap_or_else(|| "MIDR".to_string()),
                token_owner,
                initial_holders,
                wakaf_owner,
                initial_nazir,
            },
        })
    }

    /// Validate that the configuration is well-formed.
    pub fn validate(&self) -> Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(IndexerError::Config(
                "DATABASE_URL must be a sqlite: URL".to_string(),
            ));
        }

        if self.genesis.token_symbol.trim().is_empty() {
            return Err(IndexerError::Config(
                "TOKEN_SYMBOL must not be empty".to_string(),
            ));
        }

        for (key, address) in [
            ("DEPLOYER_ADDRESS", self.genesis.deployer),
            ("IDR_OWNER_ADDRESS", self.genesis.token_owner),
            ("WAKAF_OWNER_ADDRESS", self.genesis.wakaf_owner),
        ] {
            if address.is_zero() {
                return Err(IndexerError::Config(format!(
                    "{key} must not be the zero address"
                )));
            }
        }

        if self.genesis.initial_holders.iter().any(Address::is_zero) {
            return Err(IndexerError::Config(
                "INITIAL_HOLDERS must not contain the zero address".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    raw.parse()
        .map_err(|e| IndexerError::Config(format!("Invalid {key}: {e}")))
}

fn parse_holders(raw: &str) -> Result<Vec<Address>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_address("INITIAL_HOLDERS", s))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const DEPLOYER: &str = "0x1111111111111111111111111111111111111111";
    const NAZIR: &str = "0x2222222222222222222222222222222222222222";
    const HOLDER: &str = "0x3333333333333333333333333333333333333333";

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_fall_back_to_deployer() {
        let config = load(&[("DEPLOYER_ADDRESS", DEPLOYER)]).unwrap();
        let deployer: Address = DEPLOYER.parse().unwrap();

        assert_eq!(config.genesis.token_owner, deployer);
        assert_eq!(config.genesis.initial_nazir, deployer);
        assert_eq!(config.genesis.wakaf_owner, deployer);
        assert!(config.genesis.initial_holders.is_empty());
        assert_eq!(config.database_url, "sqlite:wakaf.db");
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wakaf_owner_defaults_to_nazir() {
        let config = load(&[("DEPLOYER_ADDRESS", DEPLOYER), ("NAZIR_ADDRESS", NAZIR)]).unwrap();
        let nazir: Address = NAZIR.parse().unwrap();

        assert_eq!(config.genesis.initial_nazir, nazir);
        assert_eq!(config.genesis.wakaf_owner, nazir);
        assert_eq!(config.genesis.token_owner, DEPLOYER.parse::<Address>().unwrap());
    }

    #[test]
    fn test_initial_holders_parsing() {
        let holders = format!(" {HOLDER} ,,{NAZIR},");
        let config = load(&[
            ("DEPLOYER_ADDRESS", DEPLOYER),
            ("INITIAL_HOLDERS", holders.as_str()),
        ])
        .unwrap();

        assert_eq!(
            config.genesis.initial_holders,
            vec![HOLDER.parse::<Address>().unwrap(), NAZIR.parse::<Address>().unwrap()]
        );
    }

    #[test]
    fn test_missing_deployer() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DEPLOYER_ADDRESS"));
    }

    #[test]
    fn test_invalid_address() {
        assert!(load(&[("DEPLOYER_ADDRESS", "0x1234")]).is_err());
        assert!(load(&[("DEPLOYER_ADDRESS", DEPLOYER), ("INITIAL_HOLDERS", "nope")]).is_err());
    }

    #[test]
    fn test_validate_database_url() {
        let mut config = load(&[("DEPLOYER_ADDRESS", DEPLOYER)]).unwrap();
        config.database_url = "postgres://localhost/wakaf".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_holder() {
        let mut config = load(&[("DEPLOYER_ADDRESS", DEPLOYER)]).unwrap();
        config.genesis.initial_holders.push(Address::ZERO);
        assert!(config.validate().is_err());
    }
}
