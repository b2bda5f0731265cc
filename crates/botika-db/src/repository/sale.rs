//! # Sale Repository
//!
//! Read-side database operations for sales, their line items, and their
//! batch allocations.
//!
//! Sales are created only by the ledger's checkout transaction; once
//! committed, every row this repository reads is immutable. The profit
//! aggregates on the sale are write-once, which is what keeps the
//! reports here stable when batch prices change later.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use botika_core::{AllocationDetail, Sale, SaleBatchAllocation, SaleItem};

/// Repository for sale read operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, cashier_id,
                total_revenue_cents, total_cogs_cents,
                gross_profit_cents, profit_margin_bps,
                notes, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all line items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id, sale_id, product_id, name_snapshot,
                quantity, line_revenue_cents, line_cogs_cents,
                line_profit_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all batch allocations for a sale, in allocation order.
    pub async fn get_allocations(&self, sale_id: &str) -> DbResult<Vec<SaleBatchAllocation>> {
        let allocations = sqlx::query_as::<_, SaleBatchAllocation>(
            r#"
            SELECT
                id, sale_id, sale_item_id, batch_id, product_id,
                quantity_sold, purchase_price_cents, selling_price_cents,
                item_cogs_cents, item_revenue_cents, item_profit_cents,
                created_at
            FROM sale_batch_allocations
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(allocations)
    }

    /// Per-allocation profit breakdown for reporting/export, joined with
    /// the human-readable batch number and product name.
    ///
    /// ## Example row
    /// "Paracetamol 500mg drew 10 units from BT-061026-093015-001 at
    /// ₱80.00 cost / ₱100.00 selling: COGS ₱800.00, profit ₱200.00"
    pub async fn profit_details(&self, sale_id: &str) -> DbResult<Vec<AllocationDetail>> {
        debug!(sale_id = %sale_id, "Loading sale profit details");

        let details = sqlx::query_as::<_, AllocationDetail>(
            r#"
            SELECT
                a.product_id,
                p.name AS product_name,
                a.batch_id,
                b.batch_number,
                a.quantity_sold,
                a.purchase_price_cents,
                a.selling_price_cents,
                a.item_cogs_cents,
                a.item_revenue_cents,
                a.item_profit_cents
            FROM sale_batch_allocations a
            INNER JOIN batches b ON b.id = a.batch_id
            INNER JOIN products p ON p.id = a.product_id
            WHERE a.sale_id = ?1
            ORDER BY a.rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Counts recorded sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
