//! # Price Synchronization
//!
//! Keeps `Product.current_price_cents` equal to the selling price of the
//! FIFO-oldest active, unexpired batch with remaining stock.
//!
//! ## Single Writer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current_price_cents is a materialized field with ONE writer:          │
//! │  this module. It runs                                                   │
//! │                                                                         │
//! │    • after every batch insertion (restock / import / backfill)         │
//! │    • after every batch depletion during a sale                         │
//! │    • on demand via the bulk resync sweep (manual recovery)             │
//! │                                                                         │
//! │  When NO batch qualifies (everything depleted or expired) the cached   │
//! │  price is deliberately left at its last value - the shelf label keeps  │
//! │  showing the last known price while the product is out of stock.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Synchronization is idempotent: with no intervening batch mutation, a
//! second run finds the same head batch and writes nothing.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::batch::{FIFO_ORDER, PRICEABLE, SELLABLE};

/// Outcome of one product's price sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSyncOutcome {
    /// Selling price of the batch FIFO order designates as active.
    pub price_cents: i64,
    /// True when the cached price actually moved.
    pub changed: bool,
}

/// Re-derives one product's cached price from its batch queue.
///
/// Runs on the caller's connection so it can participate in the restock
/// and checkout transactions.
///
/// ## Returns
/// * `Ok(Some(outcome))` - a batch qualified; cache now matches it
/// * `Ok(None)` - no qualifying batch; cache left untouched (stale by
///   design, see module docs)
pub(crate) async fn sync_product_price(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Option<PriceSyncOutcome>> {
    let head_sql = format!(
        "SELECT selling_price_cents FROM batches \
         WHERE product_id = ?1 AND {PRICEABLE} \
         {FIFO_ORDER} \
         LIMIT 1"
    );

    let head_price: Option<i64> = sqlx::query_scalar(&head_sql)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(price_cents) = head_price else {
        debug!(product_id = %product_id, "No priceable batch; keeping last known price");
        return Ok(None);
    };

    // Write only on change so the sweep can report how many products
    // actually moved
    let result = sqlx::query(
        r#"
        UPDATE products SET
            current_price_cents = ?2,
            updated_at = ?3
        WHERE id = ?1 AND current_price_cents <> ?2
        "#,
    )
    .bind(product_id)
    .bind(price_cents)
    .bind(chrono::Utc::now())
    .execute(&mut *conn)
    .await?;

    let changed = result.rows_affected() > 0;
    if changed {
        debug!(product_id = %product_id, price_cents, "Synchronized product price");
    }

    Ok(Some(PriceSyncOutcome {
        price_cents,
        changed,
    }))
}

/// Bulk resync: re-derives the price of every product that still has
/// sellable batches. Manual recovery entry point for drift.
///
/// ## Returns
/// The number of products whose cached price changed.
pub(crate) async fn refresh_all(pool: &SqlitePool) -> DbResult<u64> {
    info!("Refreshing cached prices for all products with active batches");

    let mut tx = pool.begin().await?;

    let ids_sql = format!(
        "SELECT DISTINCT product_id FROM batches WHERE {SELLABLE} ORDER BY product_id"
    );

    let product_ids: Vec<String> = sqlx::query_scalar(&ids_sql).fetch_all(&mut *tx).await?;

    let mut updated = 0u64;
    for product_id in &product_ids {
        if let Some(outcome) = sync_product_price(&mut *tx, product_id).await? {
            if outcome.changed {
                updated += 1;
            }
        }
    }

    tx.commit().await?;

    info!(
        candidates = product_ids.len(),
        updated, "Price refresh sweep complete"
    );

    Ok(updated)
}
