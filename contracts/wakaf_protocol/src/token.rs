//! MockIDR: an owner-mintable, owner-burnable fungible token with 6 decimals.
//!
//! Every mutator validates all of its preconditions before writing, so a
//! returned error always means "nothing changed".

use std::collections::HashMap;

use crate::events::{emit_approval, emit_transfer, EventLog};
use crate::ownable::Ownable;
use crate::types::{Address, Amount, TokenInfo};
use crate::{Error, Result};

pub const DECIMALS: u8 = 6;

/// Minted to the owner and to each initial holder at construction.
pub const GENESIS_ALLOCATION: Amount = 1_000_000_000 * 10u128.pow(DECIMALS as u32);

#[derive(Clone, Debug)]
pub struct TokenLedger {
    address: Address,
    name: String,
    symbol: String,
    ownable: Ownable,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenLedger {
    /// Construct the token and run the one-time genesis distribution:
    /// [`GENESIS_ALLOCATION`] to `owner`, then to each of `initial_holders`
    /// in order.
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        owner: Address,
        initial_holders: &[Address],
        logs: &mut EventLog,
    ) -> Result<Self> {
        let ownable = Ownable::new(address, owner, logs)?;
        let mut token = Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            ownable,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        };

        for holder in std::iter::once(&owner).chain(initial_holders) {
            token.issue(*holder, GENESIS_ALLOCATION, logs)?;
        }
        Ok(token)
    }

    // ─────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        DECIMALS
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            address: self.address,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: DECIMALS,
            total_supply: self.total_supply,
            owner: self.owner(),
        }
    }

    /// Sum of every balance. Equal to [`total_supply`](Self::total_supply)
    /// at all times.
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    // ─────────────────────────────────────────────────────────
    // Supply control (owner only)
    // ─────────────────────────────────────────────────────────

    /// Create `amount` new tokens for `to`. A zero amount succeeds and
    /// changes nothing but the event log.
    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        logs: &mut EventLog,
    ) -> Result<()> {
        self.ownable.require_owner(caller)?;
        self.issue(to, amount, logs)
    }

    /// Destroy `amount` tokens held by `from`.
    pub fn burn(
        &mut self,
        caller: Address,
        from: Address,
        amount: Amount,
        logs: &mut EventLog,
    ) -> Result<()> {
        self.ownable.require_owner(caller)?;
        if from.is_zero() {
            return Err(Error::InvalidAddress("sender"));
        }
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                account: from,
                balance,
                needed: amount,
            });
        }

        self.balances.insert(from, balance - amount);
        self.total_supply -= amount;
        emit_transfer(logs, self.address, from, Address::ZERO, amount);
        Ok(())
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
    // Standard ledger operations
    // ─────────────────────────────────────────────────────────

    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        logs: &mut EventLog,
    ) -> Result<()> {
        self.move_balance(caller, to, amount, logs)
    }

    /// Overwrite the allowance `caller` grants to `spender`.
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Amount,
        logs: &mut EventLog,
    ) -> Result<()> {
        if caller.is_zero() {
            return Err(Error::InvalidAddress("approver"));
        }
        if spender.is_zero() {
            return Err(Error::InvalidAddress("spender"));
        }
        self.allowances.insert((caller, spender), amount);
        emit_approval(logs, self.address, caller, spender, amount);
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `caller`.
    ///
    /// The allowance is checked before the balance. An allowance of
    /// `Amount::MAX` is never decremented.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
        logs: &mut EventLog,
    ) -> Result<()> {
        let allowance = self.allowance(&from, &caller);
        if allowance < amount {
            return Err(Error::InsufficientAllowance {
                owner: from,
                spender: caller,
                allowance,
                needed: amount,
            });
        }

        self.move_balance(from, to, amount, logs)?;

        if allowance != Amount::MAX {
            self.allowances.insert((from, caller), allowance - amount);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────

    fn issue(&mut self, to: Address, amount: Amount, logs: &mut EventLog) -> Result<()> {
        if to.is_zero() {
            return Err(Error::InvalidAddress("receiver"));
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        // A balance never exceeds the supply, so it cannot overflow here.
        *self.balances.entry(to).or_insert(0) += amount;
        self.total_supply = supply;
        emit_transfer(logs, self.address, Address::ZERO, to, amount);
        Ok(())
    }

    fn move_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        logs: &mut EventLog,
    ) -> Result<()> {
        if from.is_zero() {
            return Err(Error::InvalidAddress("sender"));
        }
        if to.is_zero() {
            return Err(Error::InvalidAddress("receiver"));
        }
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                account: from,
                balance,
                needed: amount,
            });
        }

        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        emit_transfer(logs, self.address, from, to, amount);
        Ok(())
    }
}
