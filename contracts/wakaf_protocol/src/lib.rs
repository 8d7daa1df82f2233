//! # Wakaf Protocol Core
//!
//! This is the root crate of the **Wakaf** endowment ledger. It models the two
//! contracts of the platform as plain Rust state machines hosted by a single
//! serializing [`Chain`]:
//!
//! | Contract | Entry Point(s)                                                    |
//! |----------|-------------------------------------------------------------------|
//! | Bootstrap | [`Chain::deploy_token`], [`Chain::deploy_wakaf`], [`genesis::deploy`] |
//! | MockIDR  | `mint`, `burn`, `transfer`, `approve`, `transfer_from`            |
//! | Ownership | `transfer_ownership` (both contracts)                            |
//! | Registry | `add_nazir`, `remove_nazir`, `get_nazir`                          |
//! | Escrow   | `money_out`, `get_money_out`, `money_out_records`                 |
//! | Queries  | `balance_of`, `allowance`, `total_supply`, `token_info`, `owner_of` |
//!
//! ## Architecture
//!
//! Contract logic lives in [`token`] and [`escrow`]; owner gating in
//! [`ownable`]; the distributor set in [`registry`]. The [`chain`] module is
//! the only place that takes the lock, seals blocks and hands events to the
//! configured [`EventSink`]. A rejected call never mutates state and never
//! emits events.

use thiserror::Error;

pub mod chain;
pub mod escrow;
pub mod events;
pub mod genesis;
mod ownable;
pub mod registry;
pub mod token;
pub mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_token;
#[cfg(test)]
mod test_utils;

pub use chain::{Chain, Receipt};
pub use escrow::Wakaf;
pub use events::{ChannelSink, EventEnvelope, EventSink, MemorySink, NullSink, WakafEvent};
pub use genesis::{Deployment, GenesisConfig};
pub use registry::NazirRegistry;
pub use token::{TokenLedger, DECIMALS, GENESIS_ALLOCATION};
pub use types::{Address, Amount, MoneyOutRecord, TokenInfo, MAX_REASON_LEN};

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a call against the ledger can be rejected.
///
/// Codes are stable and are what the HTTP surface reports to clients.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    #[error("{caller} is not the {required}")]
    Unauthorized {
        caller: Address,
        required: &'static str,
    },

    #[error("insufficient balance: {account} holds {balance}, needs {needed}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        needed: Amount,
    },

    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}, needs {needed}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: Amount,
        needed: Amount,
    },

    #[error("insufficient funds: escrow holds {available}, requested {requested}")]
    InsufficientFunds { available: Amount, requested: Amount },

    #[error("index {index} out of range for {count} record(s)")]
    OutOfRange { index: u64, count: u64 },

    #[error("zero address is not a valid {0}")]
    InvalidAddress(&'static str),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("no contract deployed at {0}")]
    ContractNotFound(Address),
}

impl Error {
    pub fn code(&self) -> u32 {
        match self {
            Error::Unauthorized { .. } => 1,
            Error::InsufficientBalance { .. } => 2,
            Error::InsufficientAllowance { .. } => 3,
            Error::InsufficientFunds { .. } => 4,
            Error::OutOfRange { .. } => 5,
            Error::InvalidAddress(_) => 6,
            Error::Overflow => 7,
            Error::ContractNotFound(_) => 8,
        }
    }
}
