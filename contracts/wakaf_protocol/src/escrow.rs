//! The Wakaf escrow: holds pooled donations in the token ledger under its own
//! address and releases them only through [`Wakaf::money_out`].
//!
//! Owner and nazirs are separate capabilities. The owner may change the nazir
//! set; nazirs may move money out. Neither implies the other.

use std::collections::HashMap;

use tracing::debug;

use crate::events::{emit_money_out, emit_nazir_added, emit_nazir_removed, EventLog};
use crate::ownable::Ownable;
use crate::registry::NazirRegistry;
use crate::token::TokenLedger;
use crate::types::{Address, Amount, MoneyOutRecord};
use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct Wakaf {
    address: Address,
    ownable: Ownable,
    nazirs: NazirRegistry,
    records: HashMap<Address, Vec<MoneyOutRecord>>,
}

impl Wakaf {
    pub fn new(
        address: Address,
        owner: Address,
        initial_nazir: Address,
        logs: &mut EventLog,
    ) -> Result<Self> {
        let ownable = Ownable::new(address, owner, logs)?;
        emit_nazir_added(logs, address, initial_nazir);
        Ok(Self {
            address,
            ownable,
            nazirs: NazirRegistry::with_initial(initial_nazir),
            records: HashMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
        logs: &mut EventLog,
    ) -> Result<()> {
        self.ownable.transfer_ownership(caller, new_owner, logs)
    }

    // ─────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────

    pub fn add_nazir(&mut self, caller: Address, nazir: Address, logs: &mut EventLog) -> Result<()> {
        self.ownable.require_owner(caller)?;
        self.nazirs.add(nazir);
        emit_nazir_added(logs, self.address, nazir);
        Ok(())
    }

    pub fn remove_nazir(
        &mut self,
        caller: Address,
        nazir: Address,
        logs: &mut EventLog,
    ) -> Result<()> {
        self.ownable.require_owner(caller)?;
        self.nazirs.remove(nazir);
        emit_nazir_removed(logs, self.address, nazir);
        Ok(())
    }

    pub fn get_nazir(&self, address: &Address) -> bool {
        self.nazirs.contains(address)
    }

    // ─────────────────────────────────────────────────────────
    // Distribution ledger
    // ─────────────────────────────────────────────────────────

    /// Send `amount` of `token` from the escrow to `recipient` and append a
    /// record to the caller's list.
    ///
    /// `reason` is stored verbatim; its length is not bounded here.
    pub fn money_out(
        &mut self,
        caller: Address,
        token: &mut TokenLedger,
        amount: Amount,
        recipient: Address,
        reason: String,
        logs: &mut EventLog,
    ) -> Result<MoneyOutRecord> {
        if !self.nazirs.contains(&caller) {
            return Err(Error::Unauthorized {
                caller,
                required: "nazir",
            });
        }

        let available = token.balance_of(&self.address);
        if available < amount {
            return Err(Error::InsufficientFunds {
                available,
                requested: amount,
            });
        }

        token.transfer(self.address, recipient, amount, logs)?;

        let records = self.records.entry(caller).or_default();
        let record = MoneyOutRecord {
            index: records.len() as u64,
            amount,
            recipient,
            token_address: token.address(),
            reason,
        };
        records.push(record.clone());

        debug!(
            nazir = %caller,
            index = record.index,
            amount = %amount,
            "money out recorded"
        );
        emit_money_out(
            logs,
            self.address,
            caller,
            recipient,
            amount,
            record.token_address,
            record.reason.clone(),
        );
        Ok(record)
    }

    pub fn get_money_out(&self, nazir: &Address, index: u64) -> Result<&MoneyOutRecord> {
        let records = self.money_out_records(nazir);
        usize::try_from(index)
            .ok()
            .and_then(|i| records.get(i))
            .ok_or(Error::OutOfRange {
                index,
                count: records.len() as u64,
            })
    }

    pub fn money_out_count(&self, nazir: &Address) -> u64 {
        self.money_out_records(nazir).len() as u64
    }

    pub fn money_out_records(&self, nazir: &Address) -> &[MoneyOutRecord] {
        self.records.get(nazir).map(Vec::as_slice).unwrap_or(&[])
    }
}
