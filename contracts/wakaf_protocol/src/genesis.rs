//! One-shot deployment of the MockIDR token and the Wakaf escrow.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::Chain;
use crate::types::Address;
use crate::Result;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub deployer: Address,
    pub token_name: String,
    pub token_symbol: String,
    pub token_owner: Address,
    pub initial_holders: Vec<Address>,
    pub wakaf_owner: Address,
    pub initial_nazir: Address,
}

impl GenesisConfig {
    /// Everything owned by and delegated to `deployer`, no extra holders.
    pub fn single_operator(deployer: Address) -> Self {
        Self {
            deployer,
            token_name: "Mock IDR".to_string(),
            token_symbol: "MIDR".to_string(),
            token_owner: deployer,
            initial_holders: Vec::new(),
            wakaf_owner: deployer,
            initial_nazir: deployer,
        }
    }
}

/// Addresses of the freshly deployed contracts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub token: Address,
    pub wakaf: Address,
}

/// Deploy the token first, then the escrow, from `config.deployer`.
pub fn deploy(chain: &Chain, config: &GenesisConfig) -> Result<Deployment> {
    info!(
        deployer = %config.deployer,
        token_owner = %config.token_owner,
        wakaf_owner = %config.wakaf_owner,
        nazir = %config.initial_nazir,
        "running genesis deployment"
    );

    let (token, _) = chain.deploy_token(
        config.deployer,
        &config.token_name,
        &config.token_symbol,
        config.token_owner,
        &config.initial_holders,
    )?;
    let (wakaf, _) = chain.deploy_wakaf(config.deployer, config.wakaf_owner, config.initial_nazir)?;

    Ok(Deployment { token, wakaf })
}
