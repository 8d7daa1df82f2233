//! Authorized-distributor ("nazir") set.
//!
//! The registry itself is ungated; [`Wakaf`](crate::Wakaf) checks the owner
//! capability before touching it.

use std::collections::HashSet;

use crate::types::Address;

#[derive(Clone, Debug, Default)]
pub struct NazirRegistry {
    nazirs: HashSet<Address>,
}

impl NazirRegistry {
    pub fn with_initial(nazir: Address) -> Self {
        let mut registry = Self::default();
        registry.add(nazir);
        registry
    }

    /// Set the flag. Adding an existing nazir is allowed.
    pub fn add(&mut self, nazir: Address) {
        self.nazirs.insert(nazir);
    }

    /// Clear the flag. Removing an absent address is allowed.
    pub fn remove(&mut self, nazir: Address) {
        self.nazirs.remove(&nazir);
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.nazirs.contains(address)
    }
}
