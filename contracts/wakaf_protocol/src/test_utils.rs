use std::sync::atomic::{AtomicU8, Ordering};

use crate::genesis::{self, Deployment, GenesisConfig};
use crate::types::{Address, Amount};
use crate::{Chain, MemorySink};

pub struct TestContext {
    pub chain: Chain,
    pub sink: MemorySink,
    pub deployer: Address,
    pub owner: Address,
    pub nazir: Address,
    pub token: Address,
    pub wakaf: Address,
    next: AtomicU8,
}

impl TestContext {
    /// Token owned by `owner`, escrow owned by `owner` with `nazir` as its
    /// initial distributor. Owner and nazir are deliberately distinct.
    pub fn new() -> Self {
        Self::with_holders(&[])
    }

    pub fn with_holders(initial_holders: &[Address]) -> Self {
        let sink = MemorySink::new();
        let chain = Chain::new(sink.clone());

        let deployer = Address::from_bytes([0xd0; 20]);
        let owner = Address::from_bytes([0x0a; 20]);
        let nazir = Address::from_bytes([0x0b; 20]);

        let config = GenesisConfig {
            deployer,
            token_name: "Mock IDR".to_string(),
            token_symbol: "MIDR".to_string(),
            token_owner: owner,
            initial_holders: initial_holders.to_vec(),
            wakaf_owner: owner,
            initial_nazir: nazir,
        };
        let Deployment { token, wakaf } = genesis::deploy(&chain, &config).unwrap();

        Self {
            chain,
            sink,
            deployer,
            owner,
            nazir,
            token,
            wakaf,
            next: AtomicU8::new(0x10),
        }
    }

    /// A fresh address that has never appeared on the chain.
    pub fn generate_address(&self) -> Address {
        let b = self.next.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0x77u8; 20];
        bytes[19] = b;
        Address::from_bytes(bytes)
    }

    /// Mint straight into the escrow, standing in for donor transfers.
    pub fn fund_escrow(&self, amount: Amount) {
        self.chain
            .mint(self.token, self.owner, self.wakaf, amount)
            .unwrap();
    }

    /// Mint to `donor`, then have the donor transfer into the escrow.
    pub fn donate(&self, donor: Address, amount: Amount) {
        self.chain.mint(self.token, self.owner, donor, amount).unwrap();
        self.chain
            .transfer(self.token, donor, self.wakaf, amount)
            .unwrap();
    }

    pub fn balance(&self, account: Address) -> Amount {
        self.chain.balance_of(self.token, account).unwrap()
    }

    pub fn escrow_balance(&self) -> Amount {
        self.balance(self.wakaf)
    }
}
