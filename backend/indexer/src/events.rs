//! Row shapes for indexed ledger events.
//!
//! Every committed [`EventEnvelope`] maps to exactly one row in the table for
//! its event kind, keyed by the envelope's `"block-log"` id.

use serde::Serialize;
use wakaf_protocol::{EventEnvelope, WakafEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TransferRow {
    pub id: String,
    pub contract: String,
    pub from_address: String,
    pub to_address: String,
    pub value: String,
    pub block_number: i64,
    pub log_index: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ApprovalRow {
    pub id: String,
    pub contract: String,
    pub owner: String,
    pub spender: String,
    pub value: String,
    pub block_number: i64,
    pub log_index: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OwnershipRow {
    pub id: String,
    pub contract: String,
    pub previous_owner: String,
    pub new_owner: String,
    pub block_number: i64,
    pub log_index: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct NazirEventRow {
    pub id: String,
    pub contract: String,
    pub nazir: String,
    /// `added` or `removed`
    pub kind: String,
    pub block_number: i64,
    pub log_index: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MoneyOutRow {
    pub id: String,
    pub contract: String,
    pub nazir: String,
    pub send_to: String,
    pub amount: String,
    pub token_address: String,
    pub reason: String,
    pub block_number: i64,
    pub log_index: i64,
    pub block_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexedEvent {
    Transfer(TransferRow),
    Approval(ApprovalRow),
    Ownership(OwnershipRow),
    Nazir(NazirEventRow),
    MoneyOut(MoneyOutRow),
}

impl IndexedEvent {
    pub fn table(&self) -> &'static str {
        match self {
            IndexedEvent::Transfer(_) => "token_transfers",
            IndexedEvent::Approval(_) => "token_approvals",
            IndexedEvent::Ownership(_) => "ownership_transfers",
            IndexedEvent::Nazir(_) => "nazir_events",
            IndexedEvent::MoneyOut(_) => "money_out_events",
        }
    }
}

impl From<&EventEnvelope> for IndexedEvent {
    fn from(env: &EventEnvelope) -> Self {
        let id = env.id();
        let contract = env.contract.to_string();
        let block_number = env.block_number as i64;
        let log_index = env.log_index as i64;
        let block_timestamp = env.block_timestamp;

        match &env.event {
            WakafEvent::Transfer { from, to, value } => IndexedEvent::Transfer(TransferRow {
                id,
                contract,
                from_address: from.to_string(),
                to_address: to.to_string(),
                value: value.to_string(),
                block_number,
                log_index,
                block_timestamp,
            }),
            WakafEvent::Approval {
                owner,
                spender,
                value,
            } => IndexedEvent::Approval(ApprovalRow {
                id,
                contract,
                owner: owner.to_string(),
                spender: spender.to_string(),
                value: value.to_string(),
                block_number,
                log_index,
                block_timestamp,
            }),
            WakafEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => IndexedEvent::Ownership(OwnershipRow {
                id,
                contract,
                previous_owner: previous_owner.to_string(),
                new_owner: new_owner.to_string(),
                block_number,
                log_index,
                block_timestamp,
            }),
            WakafEvent::NazirAdded { nazir } | WakafEvent::NazirRemoved { nazir } => {
                let kind = if matches!(env.event, WakafEvent::NazirAdded { .. }) {
                    "added"
                } else {
                    "removed"
                };
                IndexedEvent::Nazir(NazirEventRow {
                    id,
                    contract,
                    nazir: nazir.to_string(),
                    kind: kind.to_string(),
                    block_number,
                    log_index,
                    block_timestamp,
                })
            }
            WakafEvent::MoneyOut {
                nazir,
                send_to,
                amount,
                token_address,
                reason,
            } => IndexedEvent::MoneyOut(MoneyOutRow {
                id,
                contract,
                nazir: nazir.to_string(),
                send_to: send_to.to_string(),
                amount: amount.to_string(),
                token_address: token_address.to_string(),
                reason: reason.clone(),
                block_number,
                log_index,
                block_timestamp,
            }),
        }
    }
}
