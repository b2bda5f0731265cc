//! # Domain Types
//!
//! Core domain types used throughout the Botika ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐      ┌─────────────────┐      ┌────────────────┐  │
//! │  │    Product      │ 1..n │      Batch      │      │      Sale      │  │
//! │  │  ─────────────  │◄─────│  ─────────────  │      │  ────────────  │  │
//! │  │  current_price  │      │  batch_number   │      │  total_cogs    │  │
//! │  │  total_stock    │      │  remaining_qty  │      │  gross_profit  │  │
//! │  │  (both derived) │      │  prices, expiry │      │  margin_bps    │  │
//! │  └─────────────────┘      └────────┬────────┘      └───────┬────────┘  │
//! │                                    │                       │           │
//! │                                    │  ┌────────────────────┴────────┐  │
//! │                                    └──│    SaleBatchAllocation      │  │
//! │                                       │  quantity + price snapshot  │  │
//! │                                       │  (immutable audit trail)    │  │
//! │                                       └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (batch_number) - human-readable, unique
//!   per product

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Batch Status
// =============================================================================

/// The lifecycle status of a stock batch.
///
/// A batch is `Active` while it still has units to sell and flips to
/// `Depleted` the moment `remaining_quantity` reaches 0. Depleted batches
/// are never deleted - they are the COGS audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Batch has remaining stock and participates in FIFO allocation.
    Active,
    /// Batch is exhausted; retained for historical reporting.
    Depleted,
}

impl Default for BatchStatus {
    fn default() -> Self {
        BatchStatus::Active
    }
}

// =============================================================================
// Product
// =============================================================================

/// A sellable pharmacy item.
///
/// `current_price_cents` and `total_stock` are **derived** fields: the
/// price mirrors the FIFO-oldest active batch and the stock mirrors the
/// sum of active batches' remaining quantities. Only the ledger writes
/// them. They also double as the legacy pre-batch stock/price columns
/// that the one-time "batch 001" backfill consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Brand name shown on the POS and on receipts.
    pub name: String,

    /// Generic/chemical name, if distinct from the brand name.
    pub generic_name: Option<String>,

    /// Cached display price in centavos. Derived by Price Synchronization
    /// from the FIFO-oldest active batch; stale when no batch qualifies.
    pub current_price_cents: i64,

    /// Legacy per-unit cost recorded before batch tracking existed.
    /// Consumed by the backfill; new cost data lives on batches.
    pub cost_price_cents: Option<i64>,

    /// Cached sum of active batches' remaining quantities.
    pub total_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the cached display price as a Money type.
    #[inline]
    pub fn current_price(&self) -> Money {
        Money::from_cents(self.current_price_cents)
    }

    /// True if the product predates batch tracking: it carries stock or a
    /// price on the product row itself. Such products get a synthesized
    /// "batch 001" on their first restock.
    pub fn has_legacy_stock(&self) -> bool {
        self.total_stock > 0 || self.current_price_cents > 0
    }
}

// =============================================================================
// Batch
// =============================================================================

/// One receipt of stock for a product.
///
/// `remaining_quantity` only ever decreases after creation (sales draw it
/// down); more stock means a **new** batch, never a top-up of an old one.
/// That rule is what makes per-batch COGS meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Batch {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning product.
    pub product_id: String,

    /// Human-readable number, unique per product: `BT-{MMDDYY}-{HHMMSS}-{seq}`.
    pub batch_number: String,

    /// Units received at intake. Never changes.
    pub original_quantity: i64,

    /// Units still available. Invariant: `0 <= remaining <= original`.
    pub remaining_quantity: i64,

    /// Expiry date from the supplier label, if known.
    pub expiry_date: Option<NaiveDate>,

    /// Per-unit purchase price in centavos at intake (COGS basis).
    pub purchase_price_cents: i64,

    /// Per-unit selling price in centavos set at intake.
    pub selling_price_cents: i64,

    /// Derived: `(selling - purchase) / purchase`, in basis points.
    pub markup_bps: i64,

    /// Active while `remaining_quantity > 0`, then Depleted.
    pub status: BatchStatus,

    /// Supplier reference, free text.
    pub supplier_name: Option<String>,

    /// Free-text intake note.
    pub notes: Option<String>,

    /// Intake timestamp. Primary FIFO sort key.
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// Returns the purchase price as Money.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// True once every unit has been sold.
    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.status == BatchStatus::Depleted || self.remaining_quantity == 0
    }

    /// True if the batch is expired as of `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry <= today)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed POS transaction with its profit aggregates.
///
/// The profit fields are write-once: they are computed from the
/// allocation snapshots inside the sale transaction and never recomputed,
/// so historical reports stay stable even when batch prices change later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Audit identity of the cashier, supplied by the auth layer.
    pub cashier_id: String,
    /// Sum of allocation revenue across all line items.
    pub total_revenue_cents: i64,
    /// Sum of allocation COGS across all line items.
    pub total_cogs_cents: i64,
    /// `total_revenue - total_cogs`.
    pub gross_profit_cents: i64,
    /// `gross_profit / total_revenue` in basis points; 0 when revenue is 0.
    pub profit_margin_bps: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the gross profit as Money.
    #[inline]
    pub fn gross_profit(&self) -> Money {
        Money::from_cents(self.gross_profit_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze the product name at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold across all batches this line drew from.
    pub quantity: i64,
    /// Line revenue summed over this line's allocations.
    pub line_revenue_cents: i64,
    /// Line COGS summed over this line's allocations.
    pub line_cogs_cents: i64,
    /// `line_revenue - line_cogs`.
    pub line_profit_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Batch Allocation
// =============================================================================

/// A record that a sale item drew N units from a specific batch.
///
/// Created exactly once per (sale_item, batch) pair touched during FIFO
/// allocation and immutable afterwards. The purchase/selling prices are
/// snapshots taken *at allocation time*; this is the audit trail that
/// keeps historical profit stable under later price edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleBatchAllocation {
    pub id: String,
    pub sale_id: String,
    pub sale_item_id: String,
    pub batch_id: String,
    pub product_id: String,
    /// Units taken from this batch.
    pub quantity_sold: i64,
    /// Batch purchase price at allocation time (snapshot).
    pub purchase_price_cents: i64,
    /// Batch selling price at allocation time (snapshot).
    pub selling_price_cents: i64,
    /// `quantity_sold * purchase_price`.
    pub item_cogs_cents: i64,
    /// `quantity_sold * selling_price`.
    pub item_revenue_cents: i64,
    /// `item_revenue - item_cogs`.
    pub item_profit_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Read Model Types
// =============================================================================

/// "What would sell next" - the head of the FIFO queue for a product.
///
/// Returned by the current-batch-price lookup the POS uses to display
/// price and availability before checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CurrentBatchPrice {
    pub batch_id: String,
    pub batch_number: String,
    pub selling_price_cents: i64,
    pub purchase_price_cents: i64,
    pub available_quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

/// One allocation row of a sale's profit breakdown, joined with the
/// human-readable batch number and product name for reporting/export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AllocationDetail {
    pub product_id: String,
    pub product_name: String,
    pub batch_id: String,
    pub batch_number: String,
    pub quantity_sold: i64,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub item_cogs_cents: i64,
    pub item_revenue_cents: i64,
    pub item_profit_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
