//! # Inventory Log Repository
//!
//! Append-only audit trail of stock movements. Rows are only ever written
//! through [`insert_log`] inside the transaction that changes the stock.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use tillpoint_core::{InventoryLog, InventoryReason};

/// Writes one log row on `conn`, which is expected to be inside the
/// caller's transaction.
pub(crate) async fn insert_log(
    conn: &mut SqliteConnection,
    product_id: &str,
    user_id: &str,
    change_qty: i64,
    reason: InventoryReason,
    notes: &str,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_logs (id, product_id, user_id, change_qty, reason, notes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(user_id)
    .bind(change_qty)
    .bind(reason)
    .bind(notes)
    .bind(at)
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct InventoryLogRepository {
    pool: SqlitePool,
}

impl InventoryLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLogRepository { pool }
    }

    /// Most recent movements of a product, newest first.
    pub async fn for_product(&self, product_id: &str, limit: u32) -> DbResult<Vec<InventoryLog>> {
        let logs = sqlx::query_as::<_, InventoryLog>(
            r#"
            SELECT id, product_id, user_id, change_qty, reason, notes, created_at
            FROM inventory_logs
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// Net logged movement of a product. Equals its current stock when
    /// every change went through a logged path.
    pub async fn net_change(&self, product_id: &str) -> DbResult<i64> {
        let net: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(change_qty), 0) FROM inventory_logs WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }
}
