//! # The Transactional Ledger
//!
//! The write side of the batch inventory & pricing ledger. Every
//! mutation - restock, checkout, price resync - runs here, inside one
//! database transaction per operation.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale_with_items = ONE transaction                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    insert sale (zero totals)                                           │
//! │    for each line item:                                                 │
//! │      snapshot sellable batches in FIFO order                           │
//! │      plan allocation (pure, botika-core)  ──► InsufficientStock?       │
//! │      insert sale_item                          │                        │
//! │      for each take:                            │ ROLLBACK:             │
//! │        guarded batch decrement                 │ no sale row,          │
//! │        insert allocation (price snapshot)      │ no allocations,       │
//! │      decrement product total_stock             │ no decrements         │
//! │      re-sync price if a batch depleted         │ survive               │
//! │    write sale aggregates (COGS/profit/margin)  ▼                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Two concurrent checkouts serialize on SQLite's write lock; the        │
//! │  guarded decrement (WHERE remaining_quantity >= take) is the           │
//! │  backstop that turns any lost update into a conflict error             │
//! │  instead of negative stock.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The restock path (`add_batch`) is the same shape: validate, then one
//! transaction covering legacy backfill, numbering, batch insert, stock
//! increment, and price sync.

use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::pricing;
use crate::repository::batch::{BatchRepository, FIFO_ORDER, SELLABLE};
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use botika_core::fifo::{plan_allocation, BatchLot};
use botika_core::numbering::{
    format_batch_number, next_sequence, perturb_timestamp, LEGACY_BACKFILL_SEQUENCE,
    NUMBER_RETRY_BUDGET,
};
use botika_core::validation::{
    validate_batch_quantity, validate_free_text, validate_line_quantity,
    validate_purchase_price_cents, validate_sale_lines, validate_selling_price_cents,
    validate_uuid,
};
use botika_core::{
    AllocationDetail, Batch, BatchStatus, CoreError, CurrentBatchPrice, Money, Product,
    ValidationError,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by ledger operations.
///
/// This is the structured failure the POS service layer renders: an
/// insufficient-stock error names the product and quantities instead of
/// leaking a generic transaction error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Bad input, rejected before any write.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown product id.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Unknown sale id.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// The product's active batches cannot cover the requested quantity.
    /// Fatal to the enclosing sale transaction; recoverable at the POS
    /// (reduce the quantity or restock first).
    #[error(
        "Insufficient stock for {product_name}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Batch number generation kept colliding past the retry budget.
    /// Recoverable at the caller (retry the import row).
    #[error("Duplicate batch number for product {product_id}: last tried '{batch_number}'")]
    DuplicateBatchNumber {
        product_id: String,
        batch_number: String,
    },

    /// The store reported lock contention or a guarded update lost its
    /// row. Retry with backoff - see [`retry_on_conflict`].
    #[error("Concurrent write conflict; retry the operation")]
    ConcurrencyConflict,

    /// Business rule violation from the pure core.
    #[error(transparent)]
    Core(CoreError),

    /// Any other storage failure.
    #[error(transparent)]
    Db(DbError),
}

impl LedgerError {
    /// True for errors a caller may retry after backing off.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::ConcurrencyConflict => true,
            LedgerError::Db(db) => db.is_retryable(),
            _ => false,
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            // SQLITE_BUSY is the store's serialization-failure signal
            DbError::Busy => LedgerError::ConcurrencyConflict,
            other => LedgerError::Db(other),
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => LedgerError::Validation(v),
            other => LedgerError::Core(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::from(DbError::from(err))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Requests & Responses
// =============================================================================

/// Input to [`Ledger::add_batch`]. One restock row - from the manual
/// restock form or one line of a bulk CSV import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBatchRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_price_cents: Option<i64>,
    #[serde(default)]
    pub selling_price_cents: Option<i64>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Result of a restock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAdded {
    pub batch_id: String,
    pub batch_number: String,
    /// The product's total stock after the intake.
    pub new_stock_level: i64,
}

/// Sale header supplied by the POS checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    /// Audit identity of the cashier (from the auth layer).
    pub cashier_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One line of a sale: a product and how many units to sell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Result of a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale_id: String,
    pub total_revenue_cents: i64,
    pub total_cogs_cents: i64,
    pub gross_profit_cents: i64,
    pub profit_margin_bps: i64,
}

// =============================================================================
// Retry Helper
// =============================================================================

/// Bounded retries for conflict-class errors.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// Initial backoff delay; doubles per retry.
const CONFLICT_BACKOFF: Duration = Duration::from_millis(25);

/// Runs a ledger operation, retrying on [`LedgerError::ConcurrencyConflict`]
/// (and other retryable store errors) with exponential backoff.
///
/// ## Example
/// ```rust,ignore
/// let receipt = retry_on_conflict(|| ledger.create_sale_with_items(
///     sale.clone(), lines.clone(),
/// ))
/// .await?;
/// ```
pub async fn retry_on_conflict<T, F, Fut>(mut op: F) -> LedgerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LedgerResult<T>>,
{
    let mut delay = CONFLICT_BACKOFF;
    let mut attempt = 0u32;

    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < MAX_CONFLICT_RETRIES => {
                attempt += 1;
                warn!(attempt, delay_ms = delay.as_millis() as u64, "Write conflict; backing off");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            other => return other,
        }
    }
}

// =============================================================================
// Ledger Service
// =============================================================================

/// The transactional ledger service.
///
/// Cheap to construct (clones the pool handle); get one from
/// [`crate::Database::ledger`].
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Creates a new Ledger over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Ledger { pool }
    }

    // -------------------------------------------------------------------------
    // Restock
    // -------------------------------------------------------------------------

    /// Records a stock intake as a new batch.
    ///
    /// ## What This Does (one transaction)
    /// 1. Validates the request (no writes happen on bad input)
    /// 2. Synthesizes the legacy "batch 001" if this product carries
    ///    pre-batch stock/price and has no batch rows yet
    /// 3. Generates the positional batch number, retrying with a
    ///    perturbed time component on a numbering collision
    /// 4. Inserts the batch and increments the product's total stock
    /// 5. Re-synchronizes the product's cached price
    ///
    /// ## Errors
    /// * [`LedgerError::Validation`] - quantity <= 0, selling price <= 0
    /// * [`LedgerError::ProductNotFound`] - unknown product id
    /// * [`LedgerError::DuplicateBatchNumber`] - retry budget exhausted
    pub async fn add_batch(&self, req: AddBatchRequest) -> LedgerResult<BatchAdded> {
        validate_uuid("product_id", &req.product_id)?;
        validate_batch_quantity(req.quantity)?;
        validate_purchase_price_cents(req.purchase_price_cents)?;
        validate_selling_price_cents(req.selling_price_cents)?;
        validate_free_text("supplier_name", &req.supplier_name, 200)?;
        validate_free_text("notes", &req.notes, 1000)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = fetch_product(&mut *tx, &req.product_id)
            .await?
            .ok_or_else(|| LedgerError::ProductNotFound(req.product_id.clone()))?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM batches WHERE product_id = ?1")
                .bind(&product.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;

        // Legacy backfill: a product that predates batch tracking gets
        // its on-row stock attributed as batch 001 before this intake,
        // so FIFO allocation can only ever see batch-attributed units.
        let mut batch_count = existing;
        if existing == 0 && product.has_legacy_stock() {
            backfill_legacy_batch(&mut *tx, &product).await?;
            batch_count = 1;
        }

        // Markup only when both prices were supplied and cost is real
        let markup_bps = match (req.purchase_price_cents, req.selling_price_cents) {
            (Some(purchase), Some(selling)) if purchase > 0 => {
                Money::markup_bps(Money::from_cents(purchase), Money::from_cents(selling))
            }
            _ => 0,
        };

        // A batch intake without a selling price sells at the current
        // shelf price
        let selling_price_cents = req
            .selling_price_cents
            .unwrap_or(product.current_price_cents);
        let purchase_price_cents = req.purchase_price_cents.unwrap_or(0);

        let batch_id = Uuid::new_v4().to_string();
        let seq = next_sequence(batch_count);
        let now = Utc::now();

        // Numbering collisions are near-impossible (timestamp + positional
        // count) but the UNIQUE constraint is the final word; retry with a
        // perturbed time component, then give up loudly.
        let mut batch_number: Option<String> = None;
        let mut last_candidate = String::new();
        for attempt in 0..=NUMBER_RETRY_BUDGET {
            let stamp = perturb_timestamp(now, attempt);
            let candidate = format_batch_number(stamp, seq);
            last_candidate = candidate.clone();

            let inserted = sqlx::query(
                r#"
                INSERT INTO batches (
                    id, product_id, batch_number,
                    original_quantity, remaining_quantity, expiry_date,
                    purchase_price_cents, selling_price_cents, markup_bps,
                    status, supplier_name, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(&batch_id)
            .bind(&product.id)
            .bind(&candidate)
            .bind(req.quantity)
            .bind(req.quantity)
            .bind(req.expiry_date)
            .bind(purchase_price_cents)
            .bind(selling_price_cents)
            .bind(markup_bps)
            .bind(BatchStatus::Active)
            .bind(&req.supplier_name)
            .bind(&req.notes)
            .bind(stamp)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {
                    batch_number = Some(candidate);
                    break;
                }
                Err(err) => match DbError::from(err) {
                    DbError::UniqueViolation { .. } => {
                        debug!(
                            product_id = %product.id,
                            candidate = %last_candidate,
                            attempt,
                            "Batch number collision; perturbing time component"
                        );
                        continue;
                    }
                    other => return Err(other.into()),
                },
            }
        }

        let Some(batch_number) = batch_number else {
            return Err(LedgerError::DuplicateBatchNumber {
                product_id: product.id.clone(),
                batch_number: last_candidate,
            });
        };

        sqlx::query(
            r#"
            UPDATE products SET
                total_stock = total_stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(req.quantity)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let new_stock_level: i64 =
            sqlx::query_scalar("SELECT total_stock FROM products WHERE id = ?1")
                .bind(&product.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;

        pricing::sync_product_price(&mut *tx, &product.id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id = %product.id,
            batch_id = %batch_id,
            batch_number = %batch_number,
            quantity = req.quantity,
            new_stock_level,
            "Batch added"
        );

        Ok(BatchAdded {
            batch_id,
            batch_number,
            new_stock_level,
        })
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Creates a sale with its line items, FIFO allocations, and profit
    /// aggregates in one transaction.
    ///
    /// Any line's shortfall aborts the entire sale: no sale row, no
    /// allocations, and no batch decrements survive the rollback.
    ///
    /// ## Errors
    /// * [`LedgerError::Validation`] - empty cart, non-positive quantity
    /// * [`LedgerError::ProductNotFound`] - unknown product id on a line
    /// * [`LedgerError::InsufficientStock`] - some line cannot be covered
    /// * [`LedgerError::ConcurrencyConflict`] - lost a guarded decrement
    pub async fn create_sale_with_items(
        &self,
        sale: NewSale,
        lines: Vec<NewSaleLine>,
    ) -> LedgerResult<SaleReceipt> {
        validate_sale_lines(lines.len())?;
        if sale.cashier_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "cashier_id".to_string(),
            }
            .into());
        }
        for line in &lines {
            validate_uuid("product_id", &line.product_id)?;
            validate_line_quantity(line.quantity)?;
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        // Aggregates are written once allocation is done; the row exists
        // first so item/allocation FKs have a parent
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, cashier_id,
                total_revenue_cents, total_cogs_cents,
                gross_profit_cents, profit_margin_bps,
                notes, created_at
            ) VALUES (?1, ?2, 0, 0, 0, 0, ?3, ?4)
            "#,
        )
        .bind(&sale_id)
        .bind(&sale.cashier_id)
        .bind(&sale.notes)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let mut total_cogs = Money::zero();
        let mut total_revenue = Money::zero();

        for line in &lines {
            let (line_cogs, line_revenue) =
                allocate_line(&mut *tx, &sale_id, &line.product_id, line.quantity).await?;
            total_cogs += line_cogs;
            total_revenue += line_revenue;
        }

        let gross_profit = total_revenue - total_cogs;
        let profit_margin_bps = Money::margin_bps(gross_profit, total_revenue);

        sqlx::query(
            r#"
            UPDATE sales SET
                total_revenue_cents = ?2,
                total_cogs_cents = ?3,
                gross_profit_cents = ?4,
                profit_margin_bps = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&sale_id)
        .bind(total_revenue.cents())
        .bind(total_cogs.cents())
        .bind(gross_profit.cents())
        .bind(profit_margin_bps)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale_id,
            lines = lines.len(),
            total_revenue = %total_revenue,
            gross_profit = %gross_profit,
            "Sale recorded"
        );

        Ok(SaleReceipt {
            sale_id,
            total_revenue_cents: total_revenue.cents(),
            total_cogs_cents: total_cogs.cents(),
            gross_profit_cents: gross_profit.cents(),
            profit_margin_bps,
        })
    }

    // -------------------------------------------------------------------------
    // Reads & Recovery
    // -------------------------------------------------------------------------

    /// "What would sell next" for a product - the head of its FIFO queue.
    ///
    /// ## Errors
    /// * [`LedgerError::ProductNotFound`] - unknown product id
    pub async fn current_batch_price(
        &self,
        product_id: &str,
    ) -> LedgerResult<Option<CurrentBatchPrice>> {
        self.require_product(product_id).await?;

        let price = BatchRepository::new(self.pool.clone())
            .current_batch_price(product_id)
            .await?;

        Ok(price)
    }

    /// Every batch of a product in FIFO order (admin/debug view).
    ///
    /// ## Errors
    /// * [`LedgerError::ProductNotFound`] - unknown product id
    pub async fn product_batches_fifo(&self, product_id: &str) -> LedgerResult<Vec<Batch>> {
        self.require_product(product_id).await?;

        let batches = BatchRepository::new(self.pool.clone())
            .list_fifo(product_id)
            .await?;

        Ok(batches)
    }

    /// Per-allocation profit breakdown of a recorded sale.
    ///
    /// ## Errors
    /// * [`LedgerError::SaleNotFound`] - unknown sale id
    pub async fn sale_profit_details(&self, sale_id: &str) -> LedgerResult<Vec<AllocationDetail>> {
        let sales = SaleRepository::new(self.pool.clone());

        if sales.get_by_id(sale_id).await?.is_none() {
            return Err(LedgerError::SaleNotFound(sale_id.to_string()));
        }

        Ok(sales.profit_details(sale_id).await?)
    }

    /// Manual recovery: re-derives the cached price of every product
    /// that still has sellable batches.
    ///
    /// ## Returns
    /// The number of products whose cached price changed.
    pub async fn refresh_all_product_prices(&self) -> LedgerResult<u64> {
        Ok(pricing::refresh_all(&self.pool).await?)
    }

    async fn require_product(&self, product_id: &str) -> LedgerResult<Product> {
        ProductRepository::new(self.pool.clone())
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.to_string()))
    }
}

// =============================================================================
// Transaction Internals
// =============================================================================

async fn fetch_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> LedgerResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT
            id, name, generic_name,
            current_price_cents, cost_price_cents, total_stock,
            is_active, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(product)
}

/// Synthesizes the one-time "batch 001" for a product that recorded
/// stock/price before batch tracking existed.
///
/// The batch is stamped with the *product's* creation time (not now), so
/// it sits at the head of the FIFO queue ahead of every real intake, and
/// its quantity does NOT touch `total_stock` - those units are already
/// counted there.
async fn backfill_legacy_batch(
    conn: &mut SqliteConnection,
    product: &Product,
) -> LedgerResult<()> {
    let quantity = product.total_stock.max(0);
    // Zero-quantity backfill happens for price-only legacy rows; the
    // batch exists purely to attribute the price history
    let status = if quantity > 0 {
        BatchStatus::Active
    } else {
        BatchStatus::Depleted
    };

    let purchase_price_cents = product.cost_price_cents.unwrap_or(0);
    let selling_price_cents = product.current_price_cents;
    let markup_bps = if purchase_price_cents > 0 {
        Money::markup_bps(
            Money::from_cents(purchase_price_cents),
            Money::from_cents(selling_price_cents),
        )
    } else {
        0
    };

    let batch_number = format_batch_number(product.created_at, LEGACY_BACKFILL_SEQUENCE);
    let batch_id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO batches (
            id, product_id, batch_number,
            original_quantity, remaining_quantity, expiry_date,
            purchase_price_cents, selling_price_cents, markup_bps,
            status, supplier_name, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?8, ?9, NULL, ?10, ?11)
        "#,
    )
    .bind(&batch_id)
    .bind(&product.id)
    .bind(&batch_number)
    .bind(quantity)
    .bind(quantity)
    .bind(purchase_price_cents)
    .bind(selling_price_cents)
    .bind(markup_bps)
    .bind(status)
    .bind("Backfilled from pre-batch stock records")
    .bind(product.created_at)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    info!(
        product_id = %product.id,
        batch_number = %batch_number,
        quantity,
        "Synthesized legacy backfill batch"
    );

    Ok(())
}

/// Allocates one sale line: FIFO plan, sale item insert, guarded batch
/// decrements, allocation snapshots, stock decrement, and a price
/// re-sync when a batch depletes.
///
/// Returns the line's (COGS, revenue).
async fn allocate_line(
    conn: &mut SqliteConnection,
    sale_id: &str,
    product_id: &str,
    quantity: i64,
) -> LedgerResult<(Money, Money)> {
    let product = fetch_product(conn, product_id)
        .await?
        .ok_or_else(|| LedgerError::ProductNotFound(product_id.to_string()))?;

    let lots_sql = format!(
        r#"
        SELECT
            id AS batch_id,
            remaining_quantity,
            purchase_price_cents,
            selling_price_cents
        FROM batches
        WHERE product_id = ?1 AND {SELLABLE}
        {FIFO_ORDER}
        "#
    );

    let lots: Vec<BatchLot> = sqlx::query_as(&lots_sql)
        .bind(&product.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DbError::from)?;

    let plan = plan_allocation(&lots, quantity).map_err(|err| match err {
        CoreError::InsufficientStock {
            available,
            requested,
        } => LedgerError::InsufficientStock {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            available,
            requested,
        },
        other => LedgerError::from(other),
    })?;

    let now = Utc::now();
    let item_id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot,
            quantity, line_revenue_cents, line_cogs_cents,
            line_profit_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item_id)
    .bind(sale_id)
    .bind(&product.id)
    .bind(&product.name)
    .bind(quantity)
    .bind(plan.revenue_cents)
    .bind(plan.cogs_cents)
    .bind(plan.profit_cents)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    for take in &plan.takes {
        // Guarded decrement: SET expressions see the pre-update row, and
        // the WHERE re-checks availability so a lost update surfaces as
        // zero rows affected instead of negative stock
        let result = sqlx::query(
            r#"
            UPDATE batches SET
                remaining_quantity = remaining_quantity - ?1,
                status = CASE
                    WHEN remaining_quantity - ?1 <= 0 THEN 'depleted'
                    ELSE status
                END
            WHERE id = ?2 AND status = 'active' AND remaining_quantity >= ?1
            "#,
        )
        .bind(take.quantity)
        .bind(&take.batch_id)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            warn!(
                batch_id = %take.batch_id,
                take = take.quantity,
                "Guarded batch decrement lost its row; aborting sale"
            );
            return Err(LedgerError::ConcurrencyConflict);
        }

        sqlx::query(
            r#"
            INSERT INTO sale_batch_allocations (
                id, sale_id, sale_item_id, batch_id, product_id,
                quantity_sold, purchase_price_cents, selling_price_cents,
                item_cogs_cents, item_revenue_cents, item_profit_cents,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(sale_id)
        .bind(&item_id)
        .bind(&take.batch_id)
        .bind(&product.id)
        .bind(take.quantity)
        .bind(take.purchase_price_cents)
        .bind(take.selling_price_cents)
        .bind(take.item_cogs_cents)
        .bind(take.item_revenue_cents)
        .bind(take.item_profit_cents)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;
    }

    sqlx::query(
        r#"
        UPDATE products SET
            total_stock = total_stock - ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(&product.id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    // A depleted batch may have been the price-defining head of the
    // queue; re-derive
    if plan.depletes_any_batch() {
        pricing::sync_product_price(&mut *conn, &product.id).await?;
    }

    debug!(
        sale_id = %sale_id,
        product_id = %product.id,
        quantity,
        batches_touched = plan.takes.len(),
        "Line allocated"
    );

    Ok((
        Money::from_cents(plan.cogs_cents),
        Money::from_cents(plan.revenue_cents),
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use chrono::Duration as ChronoDuration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn insert_product(db: &Database, name: &str) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            generic_name: None,
            current_price_cents: 0,
            cost_price_cents: None,
            total_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap()
    }

    fn restock(product_id: &str, qty: i64, purchase: i64, selling: i64) -> AddBatchRequest {
        AddBatchRequest {
            product_id: product_id.to_string(),
            quantity: qty,
            expiry_date: None,
            purchase_price_cents: Some(purchase),
            selling_price_cents: Some(selling),
            supplier_name: None,
            notes: None,
        }
    }

    fn sale_of(product_id: &str, quantity: i64) -> (NewSale, Vec<NewSaleLine>) {
        (
            NewSale {
                cashier_id: "cashier-01".to_string(),
                notes: None,
            },
            vec![NewSaleLine {
                product_id: product_id.to_string(),
                quantity,
            }],
        )
    }

    fn seq_suffix(batch_number: &str) -> &str {
        batch_number.rsplit('-').next().unwrap()
    }

    async fn count_rows(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // Restock
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_batch_creates_batch_and_syncs_price() {
        let db = test_db().await;
        let product = insert_product(&db, "Biogesic 500mg").await;

        let added = db
            .ledger()
            .add_batch(restock(&product.id, 10, 8000, 10000))
            .await
            .unwrap();

        assert_eq!(seq_suffix(&added.batch_number), "001");
        assert_eq!(added.new_stock_level, 10);

        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_stock, 10);
        assert_eq!(reloaded.current_price_cents, 10000);

        let batches = db.batches().list_fifo(&product.id).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].status, BatchStatus::Active);
        assert_eq!(batches[0].original_quantity, 10);
        assert_eq!(batches[0].remaining_quantity, 10);
        assert_eq!(batches[0].markup_bps, 2500); // ₱80 → ₱100 is +25% over cost
    }

    #[tokio::test]
    async fn test_add_batch_validation_and_not_found() {
        let db = test_db().await;
        let product = insert_product(&db, "Neozep Forte").await;

        let err = db
            .ledger()
            .add_batch(restock(&product.id, 0, 8000, 10000))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let mut zero_price = restock(&product.id, 5, 8000, 10000);
        zero_price.selling_price_cents = Some(0);
        let err = db.ledger().add_batch(zero_price).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = db
            .ledger()
            .add_batch(restock(&generate_product_id(), 5, 8000, 10000))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProductNotFound(_)));

        // Nothing was written by any of the failed attempts
        assert_eq!(count_rows(&db, "batches").await, 0);
    }

    #[tokio::test]
    async fn test_numbering_sequence_is_positional_across_days() {
        let db = test_db().await;
        let product = insert_product(&db, "Amoxil 500mg").await;
        let ledger = db.ledger();

        let b1 = ledger
            .add_batch(restock(&product.id, 5, 800, 1200))
            .await
            .unwrap();
        // Pretend the first intake happened two days ago; the sequence
        // counts the whole history, not "today's" batches
        sqlx::query("UPDATE batches SET created_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - ChronoDuration::days(2))
            .bind(&b1.batch_id)
            .execute(db.pool())
            .await
            .unwrap();

        let b2 = ledger
            .add_batch(restock(&product.id, 5, 800, 1200))
            .await
            .unwrap();
        sqlx::query("UPDATE batches SET created_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - ChronoDuration::days(1))
            .bind(&b2.batch_id)
            .execute(db.pool())
            .await
            .unwrap();

        let b3 = ledger
            .add_batch(restock(&product.id, 5, 800, 1200))
            .await
            .unwrap();

        assert_eq!(seq_suffix(&b1.batch_number), "001");
        assert_eq!(seq_suffix(&b2.batch_number), "002");
        assert_eq!(seq_suffix(&b3.batch_number), "003");
    }

    #[tokio::test]
    async fn test_legacy_backfill_attributes_prebatch_stock() {
        let db = test_db().await;

        // A product created with stock and price directly on its row,
        // before batch tracking existed
        let created = Utc::now() - ChronoDuration::days(30);
        let product = Product {
            id: generate_product_id(),
            name: "Solmux 500mg".to_string(),
            generic_name: Some("Carbocisteine".to_string()),
            current_price_cents: 1200,
            cost_price_cents: Some(800),
            total_stock: 50,
            is_active: true,
            created_at: created,
            updated_at: created,
        };
        db.products().insert(&product).await.unwrap();

        let added = db
            .ledger()
            .add_batch(restock(&product.id, 20, 900, 1300))
            .await
            .unwrap();

        // The real intake lands as 002; the backfill took 001
        assert_eq!(seq_suffix(&added.batch_number), "002");
        assert_eq!(added.new_stock_level, 70);

        let batches = db.batches().list_fifo(&product.id).await.unwrap();
        assert_eq!(batches.len(), 2);

        let backfill = &batches[0];
        assert_eq!(seq_suffix(&backfill.batch_number), "001");
        assert_eq!(backfill.original_quantity, 50);
        assert_eq!(backfill.remaining_quantity, 50);
        assert_eq!(backfill.purchase_price_cents, 800);
        assert_eq!(backfill.selling_price_cents, 1200);
        // Stamped at the product's creation time, not "now"
        assert_eq!(backfill.created_at.timestamp(), created.timestamp());

        assert_eq!(seq_suffix(&batches[1].batch_number), "002");
        assert_eq!(batches[1].original_quantity, 20);

        // The backfill heads the FIFO queue, so the display price is its
        // (legacy) selling price
        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_stock, 70);
        assert_eq!(reloaded.current_price_cents, 1200);
    }

    // -------------------------------------------------------------------------
    // Checkout / FIFO
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_fifo_sale_spills_into_second_batch() {
        let db = test_db().await;
        let product = insert_product(&db, "Alaxan FR").await;
        let ledger = db.ledger();

        ledger
            .add_batch(restock(&product.id, 5, 8000, 10000))
            .await
            .unwrap();
        ledger
            .add_batch(restock(&product.id, 5, 8500, 10500))
            .await
            .unwrap();

        let (sale, lines) = sale_of(&product.id, 7);
        let receipt = ledger.create_sale_with_items(sale, lines).await.unwrap();

        let allocations = db.sales().get_allocations(&receipt.sale_id).await.unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].quantity_sold, 5);
        assert_eq!(allocations[1].quantity_sold, 2);

        let batches = db.batches().list_fifo(&product.id).await.unwrap();
        assert_eq!(batches[0].remaining_quantity, 0);
        assert_eq!(batches[0].status, BatchStatus::Depleted);
        assert_eq!(batches[1].remaining_quantity, 3);
        assert_eq!(batches[1].status, BatchStatus::Active);
    }

    /// The reference scenario: B1 10 @ ₱80/₱100 (day 1), B2 10 @ ₱85/₱105
    /// (day 2), sell 15 units.
    #[tokio::test]
    async fn test_two_batch_sale_profit_scenario() {
        let db = test_db().await;
        let product = insert_product(&db, "Kremil-S").await;
        let ledger = db.ledger();

        ledger
            .add_batch(restock(&product.id, 10, 8000, 10000))
            .await
            .unwrap();
        ledger
            .add_batch(restock(&product.id, 10, 8500, 10500))
            .await
            .unwrap();

        let (sale, lines) = sale_of(&product.id, 15);
        let receipt = ledger.create_sale_with_items(sale, lines).await.unwrap();

        assert_eq!(receipt.total_cogs_cents, 122500); // ₱1,225
        assert_eq!(receipt.total_revenue_cents, 152500); // ₱1,525
        assert_eq!(receipt.gross_profit_cents, 30000); // ₱300
        assert_eq!(receipt.profit_margin_bps, 1967); // ≈19.67%

        let allocations = db.sales().get_allocations(&receipt.sale_id).await.unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].quantity_sold, 10);
        assert_eq!(allocations[0].item_cogs_cents, 80000);
        assert_eq!(allocations[0].item_revenue_cents, 100000);
        assert_eq!(allocations[0].item_profit_cents, 20000);
        assert_eq!(allocations[1].quantity_sold, 5);
        assert_eq!(allocations[1].item_cogs_cents, 42500);
        assert_eq!(allocations[1].item_revenue_cents, 52500);
        assert_eq!(allocations[1].item_profit_cents, 10000);

        // B1 depleted, B2 at 5; the price re-synced to B2's selling price
        let batches = db.batches().list_fifo(&product.id).await.unwrap();
        assert_eq!(batches[0].status, BatchStatus::Depleted);
        assert_eq!(batches[1].remaining_quantity, 5);

        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_stock, 5);
        assert_eq!(reloaded.current_price_cents, 10500);

        let sale_row = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale_row.total_cogs_cents, 122500);
        assert_eq!(sale_row.gross_profit_cents, 30000);
        assert_eq!(sale_row.profit_margin_bps, 1967);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_entire_sale() {
        let db = test_db().await;
        let product = insert_product(&db, "Diatabs").await;
        let ledger = db.ledger();

        ledger
            .add_batch(restock(&product.id, 10, 8000, 10000))
            .await
            .unwrap();

        let (sale, lines) = sale_of(&product.id, 100);
        let err = ledger.create_sale_with_items(sale, lines).await.unwrap_err();

        match err {
            LedgerError::InsufficientStock {
                product_name,
                available,
                requested,
                ..
            } => {
                assert_eq!(product_name, "Diatabs");
                assert_eq!(available, 10);
                assert_eq!(requested, 100);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Full rollback: no sale, no allocations, no decrements
        assert_eq!(count_rows(&db, "sales").await, 0);
        assert_eq!(count_rows(&db, "sale_items").await, 0);
        assert_eq!(count_rows(&db, "sale_batch_allocations").await, 0);

        let batches = db.batches().list_fifo(&product.id).await.unwrap();
        assert_eq!(batches[0].remaining_quantity, 10);
        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_stock, 10);
    }

    #[tokio::test]
    async fn test_multi_line_shortfall_rolls_back_allocated_lines() {
        let db = test_db().await;
        let p1 = insert_product(&db, "Bioflu").await;
        let p2 = insert_product(&db, "Cetirizine 10mg").await;
        let ledger = db.ledger();

        ledger.add_batch(restock(&p1.id, 10, 500, 800)).await.unwrap();
        ledger.add_batch(restock(&p2.id, 2, 300, 500)).await.unwrap();

        // First line would succeed; the second line's shortfall must undo it
        let sale = NewSale {
            cashier_id: "cashier-01".to_string(),
            notes: None,
        };
        let lines = vec![
            NewSaleLine {
                product_id: p1.id.clone(),
                quantity: 5,
            },
            NewSaleLine {
                product_id: p2.id.clone(),
                quantity: 5,
            },
        ];
        let err = ledger.create_sale_with_items(sale, lines).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));

        assert_eq!(count_rows(&db, "sales").await, 0);
        assert_eq!(count_rows(&db, "sale_batch_allocations").await, 0);

        let p1_batches = db.batches().list_fifo(&p1.id).await.unwrap();
        assert_eq!(p1_batches[0].remaining_quantity, 10);
        let p1_reloaded = db.products().get_by_id(&p1.id).await.unwrap().unwrap();
        assert_eq!(p1_reloaded.total_stock, 10);
    }

    #[tokio::test]
    async fn test_stock_invariant_after_mixed_operations() {
        let db = test_db().await;
        let product = insert_product(&db, "Losartan 50mg").await;
        let ledger = db.ledger();

        ledger.add_batch(restock(&product.id, 7, 600, 950)).await.unwrap();
        ledger.add_batch(restock(&product.id, 5, 620, 950)).await.unwrap();
        ledger.add_batch(restock(&product.id, 9, 650, 980)).await.unwrap();

        let (sale, lines) = sale_of(&product.id, 8);
        ledger.create_sale_with_items(sale, lines).await.unwrap();
        let (sale, lines) = sale_of(&product.id, 4);
        ledger.create_sale_with_items(sale, lines).await.unwrap();

        let cached = db
            .products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .unwrap()
            .total_stock;
        let summed = db.batches().sum_active_remaining(&product.id).await.unwrap();
        assert_eq!(cached, summed);
        assert_eq!(cached, 9); // 21 in, 12 out

        ledger.add_batch(restock(&product.id, 10, 650, 980)).await.unwrap();
        let cached = db
            .products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .unwrap()
            .total_stock;
        let summed = db.batches().sum_active_remaining(&product.id).await.unwrap();
        assert_eq!(cached, summed);
        assert_eq!(cached, 19);
    }

    // -------------------------------------------------------------------------
    // Price Synchronization
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_price_refresh_repairs_drift_and_is_idempotent() {
        let db = test_db().await;
        let product = insert_product(&db, "Metformin 500mg").await;
        let ledger = db.ledger();

        ledger.add_batch(restock(&product.id, 10, 300, 520)).await.unwrap();

        // Simulate drift from a rogue writer
        sqlx::query("UPDATE products SET current_price_cents = 1 WHERE id = ?1")
            .bind(&product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let updated = ledger.refresh_all_product_prices().await.unwrap();
        assert_eq!(updated, 1);
        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.current_price_cents, 520);

        // Second sweep with no intervening mutation changes nothing
        let updated = ledger.refresh_all_product_prices().await.unwrap();
        assert_eq!(updated, 0);
        let again = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(again.current_price_cents, 520);
    }

    #[tokio::test]
    async fn test_depleted_product_keeps_last_known_price() {
        let db = test_db().await;
        let product = insert_product(&db, "Amlodipine 5mg").await;
        let ledger = db.ledger();

        ledger.add_batch(restock(&product.id, 5, 280, 500)).await.unwrap();

        let (sale, lines) = sale_of(&product.id, 5);
        ledger.create_sale_with_items(sale, lines).await.unwrap();

        // Everything is depleted; the shelf keeps the last known price
        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.total_stock, 0);
        assert_eq!(reloaded.current_price_cents, 500);

        let head = ledger.current_batch_price(&product.id).await.unwrap();
        assert!(head.is_none());
    }

    #[tokio::test]
    async fn test_expired_batches_do_not_define_price_but_still_allocate() {
        let db = test_db().await;
        let product = insert_product(&db, "Mefenamic Acid 500mg").await;
        let ledger = db.ledger();

        let mut expired = restock(&product.id, 5, 320, 550);
        expired.expiry_date = Some((Utc::now() - ChronoDuration::days(1)).date_naive());
        ledger.add_batch(expired).await.unwrap();

        // The expired batch cannot define the display price
        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.current_price_cents, 0);

        let mut fresh = restock(&product.id, 5, 340, 600);
        fresh.expiry_date = Some((Utc::now() + ChronoDuration::days(365)).date_naive());
        ledger.add_batch(fresh).await.unwrap();

        let reloaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.current_price_cents, 600);

        let head = ledger.current_batch_price(&product.id).await.unwrap().unwrap();
        assert_eq!(head.selling_price_cents, 600);

        // Allocation still drains the expired batch first (FIFO ignores
        // expiry; only pricing filters it)
        let (sale, lines) = sale_of(&product.id, 3);
        let receipt = ledger.create_sale_with_items(sale, lines).await.unwrap();
        let allocations = db.sales().get_allocations(&receipt.sale_id).await.unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].selling_price_cents, 550);
    }

    // -------------------------------------------------------------------------
    // Profit Stability & Reporting
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_sale_profit_is_stable_under_later_price_edits() {
        let db = test_db().await;
        let product = insert_product(&db, "Omeprazole 20mg").await;
        let ledger = db.ledger();

        ledger.add_batch(restock(&product.id, 10, 700, 1100)).await.unwrap();

        let (sale, lines) = sale_of(&product.id, 4);
        let receipt = ledger.create_sale_with_items(sale, lines).await.unwrap();
        assert_eq!(receipt.total_cogs_cents, 2800);
        assert_eq!(receipt.gross_profit_cents, 1600);

        // An administrative price correction after the fact...
        sqlx::query(
            "UPDATE batches SET selling_price_cents = 99999, purchase_price_cents = 1 \
             WHERE product_id = ?1",
        )
        .bind(&product.id)
        .execute(db.pool())
        .await
        .unwrap();

        // ...does not rewrite history
        let sale_row = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale_row.total_cogs_cents, 2800);
        assert_eq!(sale_row.gross_profit_cents, 1600);

        let details = ledger.sale_profit_details(&receipt.sale_id).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].purchase_price_cents, 700);
        assert_eq!(details[0].selling_price_cents, 1100);
        assert_eq!(details[0].item_cogs_cents, 2800);
    }

    #[tokio::test]
    async fn test_profit_details_join_batch_and_product_names() {
        let db = test_db().await;
        let product = insert_product(&db, "Simvastatin 20mg").await;
        let ledger = db.ledger();

        let added = ledger.add_batch(restock(&product.id, 10, 650, 1000)).await.unwrap();

        let (sale, lines) = sale_of(&product.id, 2);
        let receipt = ledger.create_sale_with_items(sale, lines).await.unwrap();

        let details = ledger.sale_profit_details(&receipt.sale_id).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].product_name, "Simvastatin 20mg");
        assert_eq!(details[0].batch_number, added.batch_number);
        assert_eq!(details[0].quantity_sold, 2);
    }

    #[tokio::test]
    async fn test_read_operations_reject_unknown_ids() {
        let db = test_db().await;
        let ledger = db.ledger();

        let err = ledger
            .current_batch_price(&generate_product_id())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProductNotFound(_)));

        let err = ledger
            .product_batches_fifo(&generate_product_id())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProductNotFound(_)));

        let err = ledger.sale_profit_details("no-such-sale").await.unwrap_err();
        assert!(matches!(err, LedgerError::SaleNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_sale_is_rejected_before_any_write() {
        let db = test_db().await;
        let ledger = db.ledger();

        let sale = NewSale {
            cashier_id: "cashier-01".to_string(),
            notes: None,
        };
        let err = ledger.create_sale_with_items(sale, vec![]).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(count_rows(&db, "sales").await, 0);
    }

    // -------------------------------------------------------------------------
    // Wire Shape
    // -------------------------------------------------------------------------

    #[test]
    fn test_responses_serialize_camel_case() {
        let added = BatchAdded {
            batch_id: "b".to_string(),
            batch_number: "BT-061026-093015-002".to_string(),
            new_stock_level: 70,
        };
        let value = serde_json::to_value(&added).unwrap();
        assert_eq!(value["batchId"], "b");
        assert_eq!(value["batchNumber"], "BT-061026-093015-002");
        assert_eq!(value["newStockLevel"], 70);

        let receipt = SaleReceipt {
            sale_id: "s".to_string(),
            total_revenue_cents: 152500,
            total_cogs_cents: 122500,
            gross_profit_cents: 30000,
            profit_margin_bps: 1967,
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["saleId"], "s");
        assert_eq!(value["totalRevenueCents"], 152500);
        assert_eq!(value["profitMarginBps"], 1967);
    }

    #[tokio::test]
    async fn test_retry_on_conflict_gives_up_after_budget() {
        let attempts = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = attempts.clone();

        let result: LedgerResult<()> = retry_on_conflict(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Err(LedgerError::ConcurrencyConflict)
            }
        })
        .await;

        assert!(matches!(result, Err(LedgerError::ConcurrencyConflict)));
        // Initial attempt + MAX_CONFLICT_RETRIES retries
        assert_eq!(
            attempts.load(std::sync::atomic::Ordering::SeqCst),
            1 + MAX_CONFLICT_RETRIES
        );
    }

    #[tokio::test]
    async fn test_retry_on_conflict_passes_through_success() {
        let result = retry_on_conflict(|| async { Ok::<_, LedgerError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
