//! Single-writer host for the deployed contracts.
//!
//! Every mutating entry point runs as one transaction under the chain lock:
//! the contract call either succeeds completely, is sealed into its own
//! block and has its events published, or fails and leaves no trace. Reads
//! take the same lock and therefore never see a half-applied write.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::escrow::Wakaf;
use crate::events::{EventEnvelope, EventLog, EventSink, NullSink};
use crate::token::TokenLedger;
use crate::types::{Address, Amount, MoneyOutRecord, TokenInfo};
use crate::{Error, Result};

/// Outcome of a committed transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub block_number: u64,
    pub block_timestamp: i64,
    pub logs: Vec<EventEnvelope>,
}

#[derive(Default)]
struct ChainState {
    block_number: u64,
    nonces: HashMap<Address, u64>,
    tokens: HashMap<Address, TokenLedger>,
    escrows: HashMap<Address, Wakaf>,
}

impl ChainState {
    fn token(&self, address: &Address) -> Result<&TokenLedger> {
        self.tokens
            .get(address)
            .ok_or(Error::ContractNotFound(*address))
    }

    fn token_mut(&mut self, address: &Address) -> Result<&mut TokenLedger> {
        self.tokens
            .get_mut(address)
            .ok_or(Error::ContractNotFound(*address))
    }

    fn escrow(&self, address: &Address) -> Result<&Wakaf> {
        self.escrows
            .get(address)
            .ok_or(Error::ContractNotFound(*address))
    }

    fn escrow_mut(&mut self, address: &Address) -> Result<&mut Wakaf> {
        self.escrows
            .get_mut(address)
            .ok_or(Error::ContractNotFound(*address))
    }

    /// Address the deployer's next contract will live at. The nonce is only
    /// consumed by [`ChainState::consume_nonce`] once the deployment succeeds.
    fn next_contract_address(&self, deployer: &Address) -> Address {
        let nonce = self.nonces.get(deployer).copied().unwrap_or(0);
        contract_address(deployer, nonce)
    }

    fn consume_nonce(&mut self, deployer: Address) {
        *self.nonces.entry(deployer).or_insert(0) += 1;
    }
}

/// `sha256(deployer ‖ nonce_be)`, last 20 bytes.
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(nonce.to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

pub struct Chain {
    state: Mutex<ChainState>,
    sink: Arc<dyn EventSink>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl Chain {
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
            sink: Arc::new(sink),
        }
    }

    /// Number of the last sealed block; `0` before the first transaction.
    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }

    // ─────────────────────────────────────────────────────────
    // Deployment
    // ─────────────────────────────────────────────────────────

    pub fn deploy_token(
        &self,
        deployer: Address,
        name: &str,
        symbol: &str,
        owner: Address,
        initial_holders: &[Address],
    ) -> Result<(Address, Receipt)> {
        let (address, receipt) = self.transact("deploy_token", |state, logs| {
            let address = state.next_contract_address(&deployer);
            let token = TokenLedger::new(address, name, symbol, owner, initial_holders, logs)?;
            state.consume_nonce(deployer);
            state.tokens.insert(address, token);
            Ok(address)
        })?;
        info!(%address, %owner, holders = initial_holders.len(), "token deployed");
        Ok((address, receipt))
    }

    pub fn deploy_wakaf(
        &self,
        deployer: Address,
        owner: Address,
        initial_nazir: Address,
    ) -> Result<(Address, Receipt)> {
        let (address, receipt) = self.transact("deploy_wakaf", |state, logs| {
            let address = state.next_contract_address(&deployer);
            let wakaf = Wakaf::new(address, owner, initial_nazir, logs)?;
            state.consume_nonce(deployer);
            state.escrows.insert(address, wakaf);
            Ok(address)
        })?;
        info!(%address, %owner, nazir = %initial_nazir, "wakaf deployed");
        Ok((address, receipt))
    }

    // ─────────────────────────────────────────────────────────
    // Token calls
    // ─────────────────────────────────────────────────────────

    pub fn mint(&self, token: Address, caller: Address, to: Address, amount: Amount) -> Result<Receipt> {
        self.transact("mint", |state, logs| {
            state.token_mut(&token)?.mint(caller, to, amount, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn burn(&self, token: Address, caller: Address, from: Address, amount: Amount) -> Result<Receipt> {
        self.transact("burn", |state, logs| {
            state.token_mut(&token)?.burn(caller, from, amount, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn transfer(&self, token: Address, caller: Address, to: Address, amount: Amount) -> Result<Receipt> {
        self.transact("transfer", |state, logs| {
            state.token_mut(&token)?.transfer(caller, to, amount, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn approve(
        &self,
        token: Address,
        caller: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Receipt> {
        self.transact("approve", |state, logs| {
            state.token_mut(&token)?.approve(caller, spender, amount, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn transfer_from(
        &self,
        token: Address,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Receipt> {
        self.transact("transfer_from", |state, logs| {
            state
                .token_mut(&token)?
                .transfer_from(caller, from, to, amount, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    /// Hand ownership of either a token or an escrow to `new_owner`.
    pub fn transfer_ownership(
        &self,
        contract: Address,
        caller: Address,
        new_owner: Address,
    ) -> Result<Receipt> {
        self.transact("transfer_ownership", |state, logs| {
            if let Some(token) = state.tokens.get_mut(&contract) {
                return token.transfer_ownership(caller, new_owner, logs);
            }
            state
                .escrow_mut(&contract)?
                .transfer_ownership(caller, new_owner, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    // ─────────────────────────────────────────────────────────
    // Escrow calls
    // ─────────────────────────────────────────────────────────

    pub fn add_nazir(&self, wakaf: Address, caller: Address, nazir: Address) -> Result<Receipt> {
        self.transact("add_nazir", |state, logs| {
            state.escrow_mut(&wakaf)?.add_nazir(caller, nazir, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn remove_nazir(&self, wakaf: Address, caller: Address, nazir: Address) -> Result<Receipt> {
        self.transact("remove_nazir", |state, logs| {
            state.escrow_mut(&wakaf)?.remove_nazir(caller, nazir, logs)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn money_out(
        &self,
        wakaf: Address,
        caller: Address,
        token: Address,
        amount: Amount,
        recipient: Address,
        reason: impl Into<String>,
    ) -> Result<(MoneyOutRecord, Receipt)> {
        let reason = reason.into();
        self.transact("money_out", |state, logs| {
            let ChainState {
                tokens, escrows, ..
            } = state;
            let escrow = escrows
                .get_mut(&wakaf)
                .ok_or(Error::ContractNotFound(wakaf))?;
            let ledger = tokens
                .get_mut(&token)
                .ok_or(Error::ContractNotFound(token))?;
            escrow.money_out(caller, ledger, amount, recipient, reason, logs)
        })
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn token_info(&self, token: Address) -> Result<TokenInfo> {
        self.read(|state| Ok(state.token(&token)?.info()))
    }

    pub fn balance_of(&self, token: Address, account: Address) -> Result<Amount> {
        self.read(|state| Ok(state.token(&token)?.balance_of(&account)))
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<Amount> {
        self.read(|state| Ok(state.token(&token)?.allowance(&owner, &spender)))
    }

    pub fn total_supply(&self, token: Address) -> Result<Amount> {
        self.read(|state| Ok(state.token(&token)?.total_supply()))
    }

    pub fn owner_of(&self, contract: Address) -> Result<Address> {
        self.read(|state| match state.tokens.get(&contract) {
            Some(token) => Ok(token.owner()),
            None => Ok(state.escrow(&contract)?.owner()),
        })
    }

    pub fn get_nazir(&self, wakaf: Address, address: Address) -> Result<bool> {
        self.read(|state| Ok(state.escrow(&wakaf)?.get_nazir(&address)))
    }

    pub fn get_money_out(&self, wakaf: Address, nazir: Address, index: u64) -> Result<MoneyOutRecord> {
        self.read(|state| state.escrow(&wakaf)?.get_money_out(&nazir, index).cloned())
    }

    pub fn money_out_count(&self, wakaf: Address, nazir: Address) -> Result<u64> {
        self.read(|state| Ok(state.escrow(&wakaf)?.money_out_count(&nazir)))
    }

    pub fn money_out_records(&self, wakaf: Address, nazir: Address) -> Result<Vec<MoneyOutRecord>> {
        self.read(|state| Ok(state.escrow(&wakaf)?.money_out_records(&nazir).to_vec()))
    }

    // ─────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────

    fn transact<T>(
        &self,
        call: &'static str,
        op: impl FnOnce(&mut ChainState, &mut EventLog) -> Result<T>,
    ) -> Result<(T, Receipt)> {
        let mut state = self.state.lock();
        let mut logs = EventLog::default();

        let value = match op(&mut *state, &mut logs) {
            Ok(value) => value,
            Err(e) => {
                debug!(call, error = %e, code = e.code(), "transaction rejected");
                return Err(e);
            }
        };

        state.block_number += 1;
        let block_timestamp = Utc::now().timestamp();
        let logs = logs.seal(state.block_number, block_timestamp);
        for event in &logs {
            self.sink.publish(event);
        }

        debug!(
            call,
            block = state.block_number,
            events = logs.len(),
            "transaction committed"
        );
        Ok((
            value,
            Receipt {
                block_number: state.block_number,
                block_timestamp,
                logs,
            },
        ))
    }

    fn read<T>(&self, op: impl FnOnce(&ChainState) -> Result<T>) -> Result<T> {
        let state = self.state.lock();
        op(&*state)
    }
}
