//! # Batch Repository
//!
//! Read-side database operations for stock batches.
//!
//! ## FIFO Ordering Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Allocation and price sync both walk a product's batches in the        │
//! │  same order:                                                            │
//! │                                                                         │
//! │    1. created_at ascending        (oldest intake first)                │
//! │    2. dated expiry before NULL,                                        │
//! │       soonest expiry first        (tie-break within one timestamp)     │
//! │    3. rowid ascending             (insertion sequence - makes ties     │
//! │                                    deterministic and reproducible)     │
//! │                                                                         │
//! │  The ORDER BY lives in this module's constants so every reader of      │
//! │  the queue - allocator, price sync, admin listing - agrees on it.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations (insert, decrement, status flip) happen only inside the
//! ledger's transactions, never through this repository.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use botika_core::{Batch, CurrentBatchPrice};

/// The shared FIFO `ORDER BY` clause (see module docs).
pub(crate) const FIFO_ORDER: &str = r#"
    ORDER BY
        created_at ASC,
        CASE WHEN expiry_date IS NULL THEN 1 ELSE 0 END ASC,
        expiry_date ASC,
        rowid ASC
"#;

/// Predicate for batches that can still satisfy an allocation.
pub(crate) const SELLABLE: &str = "status = 'active' AND remaining_quantity > 0";

/// Predicate for batches that may define the product's display price:
/// sellable AND not expired (spec: expiry null or in the future).
pub(crate) const PRICEABLE: &str =
    "status = 'active' AND remaining_quantity > 0 \
     AND (expiry_date IS NULL OR expiry_date > date('now'))";

/// Repository for batch read operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Gets a batch by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            SELECT
                id, product_id, batch_number,
                original_quantity, remaining_quantity, expiry_date,
                purchase_price_cents, selling_price_cents, markup_bps,
                status, supplier_name, notes, created_at
            FROM batches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists every batch of a product in FIFO order, depleted included.
    ///
    /// This is the admin/debug view behind the batch management screen:
    /// the full intake history in the exact order allocation would
    /// consume it.
    pub async fn list_fifo(&self, product_id: &str) -> DbResult<Vec<Batch>> {
        debug!(product_id = %product_id, "Listing batches in FIFO order");

        let sql = format!(
            r#"
            SELECT
                id, product_id, batch_number,
                original_quantity, remaining_quantity, expiry_date,
                purchase_price_cents, selling_price_cents, markup_bps,
                status, supplier_name, notes, created_at
            FROM batches
            WHERE product_id = ?1
            {FIFO_ORDER}
            "#
        );

        let batches = sqlx::query_as::<_, Batch>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(batches)
    }

    /// Returns "what would sell next": the head of the FIFO queue among
    /// priceable batches (active, stocked, unexpired).
    ///
    /// ## Returns
    /// * `Ok(Some(...))` - the batch whose selling price the product
    ///   currently displays
    /// * `Ok(None)` - nothing qualifies (all depleted or expired); the
    ///   product's cached price is stale by design
    pub async fn current_batch_price(&self, product_id: &str) -> DbResult<Option<CurrentBatchPrice>> {
        let sql = format!(
            r#"
            SELECT
                id AS batch_id,
                batch_number,
                selling_price_cents,
                purchase_price_cents,
                remaining_quantity AS available_quantity,
                expiry_date
            FROM batches
            WHERE product_id = ?1 AND {PRICEABLE}
            {FIFO_ORDER}
            LIMIT 1
            "#
        );

        let price = sqlx::query_as::<_, CurrentBatchPrice>(&sql)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(price)
    }

    /// Counts all batch rows for a product (any status).
    ///
    /// This count is what makes batch number sequences positional.
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM batches WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Sums remaining quantity over a product's active batches.
    ///
    /// Must always equal the product's cached `total_stock`; diagnostics
    /// and tests use this to verify the invariant.
    pub async fn sum_active_remaining(&self, product_id: &str) -> DbResult<i64> {
        let sql = format!(
            "SELECT COALESCE(SUM(remaining_quantity), 0) FROM batches \
             WHERE product_id = ?1 AND {SELLABLE}"
        );

        let sum: i64 = sqlx::query_scalar(&sql)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(sum)
    }
}
