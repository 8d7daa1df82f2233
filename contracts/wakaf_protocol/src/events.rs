//! Outbound event stream.
//!
//! Contracts append [`WakafEvent`]s to the per-transaction [`EventLog`]; the
//! [`Chain`](crate::Chain) seals them into [`EventEnvelope`]s once the
//! transaction commits and hands each one to its [`EventSink`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::types::{amount_serde, Address, Amount};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WakafEvent {
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_serde")]
        value: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "amount_serde")]
        value: Amount,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    NazirAdded {
        nazir: Address,
    },
    NazirRemoved {
        nazir: Address,
    },
    MoneyOut {
        nazir: Address,
        send_to: Address,
        #[serde(with = "amount_serde")]
        amount: Amount,
        token_address: Address,
        reason: String,
    },
}

impl WakafEvent {
    /// The event's name as an external indexer knows it.
    pub fn name(&self) -> &'static str {
        match self {
            WakafEvent::Transfer { .. } => "Transfer",
            WakafEvent::Approval { .. } => "Approval",
            WakafEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            WakafEvent::NazirAdded { .. } => "NazirAdded",
            WakafEvent::NazirRemoved { .. } => "NazirRemoved",
            WakafEvent::MoneyOut { .. } => "MoneyOutEvent",
        }
    }
}

/// A committed event, positioned by block and log index.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub block_number: u64,
    pub block_timestamp: i64,
    pub log_index: u32,
    pub contract: Address,
    pub event: WakafEvent,
}

impl EventEnvelope {
    /// Composite key `"{block_number}-{log_index}"`, unique per event.
    pub fn id(&self) -> String {
        format!("{}-{}", self.block_number, self.log_index)
    }
}

/// Events emitted by a single in-flight transaction.
///
/// Dropped without being sealed when the transaction is rejected.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<(Address, WakafEvent)>,
}

impl EventLog {
    pub(crate) fn push(&mut self, contract: Address, event: WakafEvent) {
        self.entries.push((contract, event));
    }

    pub(crate) fn seal(self, block_number: u64, block_timestamp: i64) -> Vec<EventEnvelope> {
        self.entries
            .into_iter()
            .enumerate()
            .map(|(i, (contract, event))| EventEnvelope {
                block_number,
                block_timestamp,
                log_index: i as u32,
                contract,
                event,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn emit_transfer(
    logs: &mut EventLog,
    token: Address,
    from: Address,
    to: Address,
    value: Amount,
) {
    logs.push(token, WakafEvent::Transfer { from, to, value });
}

pub(crate) fn emit_approval(
    logs: &mut EventLog,
    token: Address,
    owner: Address,
    spender: Address,
    value: Amount,
) {
    logs.push(
        token,
        WakafEvent::Approval {
            owner,
            spender,
            value,
        },
    );
}

pub(crate) fn emit_ownership_transferred(
    logs: &mut EventLog,
    contract: Address,
    previous_owner: Address,
    new_owner: Address,
) {
    logs.push(
        contract,
        WakafEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        },
    );
}

pub(crate) fn emit_nazir_added(logs: &mut EventLog, wakaf: Address, nazir: Address) {
    logs.push(wakaf, WakafEvent::NazirAdded { nazir });
}

pub(crate) fn emit_nazir_removed(logs: &mut EventLog, wakaf: Address, nazir: Address) {
    logs.push(wakaf, WakafEvent::NazirRemoved { nazir });
}

pub(crate) fn emit_money_out(
    logs: &mut EventLog,
    wakaf: Address,
    nazir: Address,
    send_to: Address,
    amount: Amount,
    token_address: Address,
    reason: String,
) {
    logs.push(
        wakaf,
        WakafEvent::MoneyOut {
            nazir,
            send_to,
            amount,
            token_address,
            reason,
        },
    );
}

// ─────────────────────────────────────────────────────────
// Sinks
// ─────────────────────────────────────────────────────────

/// Subscriber for committed events.
///
/// Called while the chain lock is held, so delivery order is commit order.
/// Implementations must not call back into the chain.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &EventEnvelope);
}

impl<F> EventSink for F
where
    F: Fn(&EventEnvelope) + Send + Sync,
{
    fn publish(&self, event: &EventEnvelope) {
        self(event)
    }
}

/// Forwards events into a tokio channel, e.g. towards an indexer task.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: UnboundedSender<EventEnvelope>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<EventEnvelope>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: &EventEnvelope) {
        if self.tx.send(event.clone()).is_err() {
            warn!(id = %event.id(), "event receiver dropped; event not delivered");
        }
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &EventEnvelope) {}
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<EventEnvelope>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<EventEnvelope> {
        self.events.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &EventEnvelope) {
        self.events.lock().push(event.clone());
    }
}
