use crate::events::{emit_ownership_transferred, EventLog};
use crate::types::Address;
use crate::{Error, Result};

/// Single-owner gate shared by both contracts.
///
/// There is always exactly one owner: no renounce, no transfer to the zero
/// address.
#[derive(Clone, Debug)]
pub(crate) struct Ownable {
    contract: Address,
    owner: Address,
}

impl Ownable {
    pub(crate) fn new(contract: Address, owner: Address, logs: &mut EventLog) -> Result<Self> {
        if owner.is_zero() {
            return Err(Error::InvalidAddress("owner"));
        }
        emit_ownership_transferred(logs, contract, Address::ZERO, owner);
        Ok(Self { contract, owner })
    }

    pub(crate) fn owner(&self) -> Address {
        self.owner
    }

    pub(crate) fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(Error::Unauthorized {
                caller,
                required: "owner",
            });
        }
        Ok(())
    }

    pub(crate) fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
        logs: &mut EventLog,
    ) -> Result<()> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(Error::InvalidAddress("owner"));
        }
        let previous = self.owner;
        self.owner = new_owner;
        emit_ownership_transferred(logs, self.contract, previous, new_owner);
        Ok(())
    }
}
