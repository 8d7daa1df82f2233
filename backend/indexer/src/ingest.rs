//! Background task that writes ledger events into the index.
//!
//! The ledger publishes every committed event onto an unbounded channel;
//! this task drains it in order. Events at or below the persisted cursor
//! are skipped so a replayed stream never double-counts.

use sqlx::SqlitePool;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use wakaf_protocol::EventEnvelope;

use crate::db;
use crate::errors::Result;

/// Run until the sender side is dropped or `shutdown` fires.
///
/// On shutdown the channel is closed and whatever is already queued is
/// still written. Returns the number of rows inserted.
///
/// A failed write stops the task with the error and leaves the cursor on
/// the last stored event, so no later event is indexed past the gap.
pub async fn run(
    pool: SqlitePool,
    mut rx: UnboundedReceiver<EventEnvelope>,
    shutdown: CancellationToken,
) -> Result<u64> {
    let mut cursor = db::get_cursor(&pool).await?;
    let mut indexed = 0u64;

    info!(
        last_block = cursor.0,
        last_log_index = cursor.1,
        "Event ingestion started"
    );

    loop {
        tokio::select! {
            biased;

            received = rx.recv() => match received {
                Some(envelope) => {
                    if ingest_one(&pool, &mut cursor, &envelope).await? {
                        indexed += 1;
                    }
                }
                None => break,
            },

            _ = shutdown.cancelled() => {
                rx.close();
                while let Some(envelope) = rx.recv().await {
                    if ingest_one(&pool, &mut cursor, &envelope).await? {
                        indexed += 1;
                    }
                }
                break;
            }
        }
    }

    info!(indexed, "Event ingestion stopped");
    Ok(indexed)
}

async fn ingest_one(
    pool: &SqlitePool,
    cursor: &mut (i64, i64),
    envelope: &EventEnvelope,
) -> Result<bool> {
    let position = (envelope.block_number as i64, envelope.log_index as i64);
    if position <= *cursor {
        debug!(id = %envelope.id(), "skipping already indexed event");
        return Ok(false);
    }

    let inserted = db::insert_event(pool, envelope).await.map_err(|e| {
        error!(id = %envelope.id(), error = %e, "Failed to index event");
        e
    })?;
    *cursor = position;
    Ok(inserted)
}
