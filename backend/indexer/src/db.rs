//! Database layer: migrations, event writes, queries, and cursor management.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};
use wakaf_protocol::EventEnvelope;

use crate::errors::Result;
use crate::events::{
    ApprovalRow, IndexedEvent, MoneyOutRow, NazirEventRow, OwnershipRow, TransferRow,
};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Position of the last indexed event as `(block_number, log_index)`.
/// Returns `(0, 0)` on a fresh index; the first real block is 1.
pub async fn get_cursor(pool: &SqlitePool) -> Result<(i64, i64)> {
    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT last_block, last_log_index FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.unwrap_or((0, 0)))
}

/// Drop every indexed event and rewind the cursor.
///
/// The ledger lives in memory and restarts from block 0, so rows from a
/// previous run would collide with the new run's ids.
pub async fn clear_index(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    for table in [
        "token_transfers",
        "token_approvals",
        "ownership_transfers",
        "nazir_events",
        "money_out_events",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("UPDATE indexer_cursor SET last_block = 0, last_log_index = 0 WHERE id = 1")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Event index cleared");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist one event and advance the cursor in a single transaction.
///
/// Rows are keyed by `"block-log"`, so replaying an event is a no-op.
/// Returns `true` when a new row was written.
pub async fn insert_event(pool: &SqlitePool, envelope: &EventEnvelope) -> Result<bool> {
    let indexed = IndexedEvent::from(envelope);
    let mut tx = pool.begin().await?;

    let result = match &indexed {
        IndexedEvent::Transfer(row) => {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO token_transfers
                    (id, contract, from_address, to_address, value, block_number, log_index, block_timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&row.id)
            .bind(&row.contract)
            .bind(&row.from_address)
            .bind(&row.to_address)
            .bind(&row.value)
            .bind(row.block_number)
            .bind(row.log_index)
            .bind(row.block_timestamp)
            .execute(&mut *tx)
            .await?
        }
        IndexedEvent::Approval(row) => {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO token_approvals
                    (id, contract, owner, spender, value, block_number, log_index, block_timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&row.id)
            .bind(&row.contract)
            .bind(&row.owner)
            .bind(&row.spender)
            .bind(&row.value)
            .bind(row.block_number)
            .bind(row.log_index)
            .bind(row.block_timestamp)
            .execute(&mut *tx)
            .await?
        }
        IndexedEvent::Ownership(row) => {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO ownership_transfers
                    (id, contract, previous_owner, new_owner, block_number, log_index, block_timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&row.id)
            .bind(&row.contract)
            .bind(&row.previous_owner)
            .bind(&row.new_owner)
            .bind(row.block_number)
            .bind(row.log_index)
            .bind(row.block_timestamp)
            .execute(&mut *tx)
            .await?
        }
        IndexedEvent::Nazir(row) => {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO nazir_events
                    (id, contract, nazir, kind, block_number, log_index, block_timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&row.id)
            .bind(&row.contract)
            .bind(&row.nazir)
            .bind(&row.kind)
            .bind(row.block_number)
            .bind(row.log_index)
            .bind(row.block_timestamp)
            .execute(&mut *tx)
            .await?
        }
        IndexedEvent::MoneyOut(row) => {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO money_out_events
                    (id, contract, nazir, send_to, amount, token_address, reason,
                     block_number, log_index, block_timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&row.id)
            .bind(&row.contract)
            .bind(&row.nazir)
            .bind(&row.send_to)
            .bind(&row.amount)
            .bind(&row.token_address)
            .bind(&row.reason)
            .bind(row.block_number)
            .bind(row.log_index)
            .bind(row.block_timestamp)
            .execute(&mut *tx)
            .await?
        }
    };

    sqlx::query("UPDATE indexer_cursor SET last_block = ?1, last_log_index = ?2 WHERE id = 1")
        .bind(envelope.block_number as i64)
        .bind(envelope.log_index as i64)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let inserted = result.rows_affected() > 0;
    debug!(
        id = %envelope.id(),
        table = indexed.table(),
        inserted,
        "indexed event"
    );
    Ok(inserted)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Transfers touching `address` as sender or receiver, or all transfers.
pub async fn list_transfers(pool: &SqlitePool, address: Option<&str>) -> Result<Vec<TransferRow>> {
    let rows = sqlx::query_as::<_, TransferRow>(
        r#"
        SELECT id, contract, from_address, to_address, value,
               block_number, log_index, block_timestamp
        FROM   token_transfers
        WHERE  ?1 IS NULL OR from_address = ?1 OR to_address = ?1
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .bind(address)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_approvals(pool: &SqlitePool) -> Result<Vec<ApprovalRow>> {
    let rows = sqlx::query_as::<_, ApprovalRow>(
        r#"
        SELECT id, contract, owner, spender, value,
               block_number, log_index, block_timestamp
        FROM   token_approvals
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_ownership_transfers(pool: &SqlitePool) -> Result<Vec<OwnershipRow>> {
    let rows = sqlx::query_as::<_, OwnershipRow>(
        r#"
        SELECT id, contract, previous_owner, new_owner,
               block_number, log_index, block_timestamp
        FROM   ownership_transfers
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_nazir_events(pool: &SqlitePool) -> Result<Vec<NazirEventRow>> {
    let rows = sqlx::query_as::<_, NazirEventRow>(
        r#"
        SELECT id, contract, nazir, kind,
               block_number, log_index, block_timestamp
        FROM   nazir_events
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// MoneyOut events, optionally filtered to one nazir.
pub async fn list_money_out(pool: &SqlitePool, nazir: Option<&str>) -> Result<Vec<MoneyOutRow>> {
    let rows = sqlx::query_as::<_, MoneyOutRow>(
        r#"
        SELECT id, contract, nazir, send_to, amount, token_address, reason,
               block_number, log_index, block_timestamp
        FROM   money_out_events
        WHERE  ?1 IS NULL OR nazir = ?1
        ORDER  BY block_number ASC, log_index ASC
        "#,
    )
    .bind(nazir)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
