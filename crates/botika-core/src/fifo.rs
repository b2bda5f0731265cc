//! # FIFO Allocation Planner
//!
//! The pure core of the Sale Allocator: given a snapshot of a product's
//! batches in FIFO order and a requested quantity, decide exactly how many
//! units come out of each batch and what they cost.
//!
//! ## Why FIFO?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     FIFO Allocation Walkthrough                         │
//! │                                                                         │
//! │  Product: Amoxicillin 500mg, sale of 7 units                           │
//! │                                                                         │
//! │  Batch queue (oldest first):                                           │
//! │  ┌──────────────────────┐  ┌──────────────────────┐                    │
//! │  │ B1  remaining: 5     │  │ B2  remaining: 5     │                    │
//! │  │     purchase: ₱8.00  │  │     purchase: ₱8.50  │                    │
//! │  │     selling: ₱10.00  │  │     selling: ₱10.50  │                    │
//! │  └──────────┬───────────┘  └──────────┬───────────┘                    │
//! │             │ take 5                  │ take 2                          │
//! │             ▼                         ▼                                 │
//! │  allocation(B1, 5, cogs ₱40)  allocation(B2, 2, cogs ₱17)              │
//! │                                                                         │
//! │  Result: B1 depleted, B2 has 3 left, item COGS = ₱57                   │
//! │                                                                         │
//! │  Oldest stock leaves the shelf first, so expiry risk drains in          │
//! │  intake order and each sale's cost basis is the price actually          │
//! │  paid for the units it consumed.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity Contract
//! This module never touches the database. The storage layer reads the
//! candidate batches (already FIFO-ordered and locked inside the sale
//! transaction), hands them here as [`BatchLot`] snapshots, and applies
//! the returned [`AllocationPlan`] with guarded decrements. Same lots +
//! same quantity = same plan, every time.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Input Snapshot
// =============================================================================

/// A snapshot of one batch's sellable state at allocation time.
///
/// The order of the `&[BatchLot]` slice **is** the FIFO order; the
/// planner walks it front to back and never reorders. The storage layer
/// owns the ordering rule (creation time, then soonest expiry, then
/// insertion sequence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BatchLot {
    pub batch_id: String,
    pub remaining_quantity: i64,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
}

// =============================================================================
// Output Plan
// =============================================================================

/// One batch's share of an allocation: take `quantity` units at the
/// snapshotted prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Take {
    pub batch_id: String,
    /// Units to draw from this batch (always > 0).
    pub quantity: i64,
    /// Purchase price per unit at allocation time (snapshot).
    pub purchase_price_cents: i64,
    /// Selling price per unit at allocation time (snapshot).
    pub selling_price_cents: i64,
    /// `quantity * purchase_price`.
    pub item_cogs_cents: i64,
    /// `quantity * selling_price`.
    pub item_revenue_cents: i64,
    /// `item_revenue - item_cogs`.
    pub item_profit_cents: i64,
    /// True when this take empties the batch (status flips to depleted,
    /// which in turn triggers a price re-sync for the product).
    pub depletes_batch: bool,
}

/// The full FIFO plan for one sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Per-batch takes in FIFO order. Only batches with a non-zero take
    /// appear.
    pub takes: Vec<Take>,
    /// Sum of take COGS.
    pub cogs_cents: i64,
    /// Sum of take revenue.
    pub revenue_cents: i64,
    /// `revenue - cogs`.
    pub profit_cents: i64,
}

impl AllocationPlan {
    /// True when any take in the plan empties its batch.
    pub fn depletes_any_batch(&self) -> bool {
        self.takes.iter().any(|t| t.depletes_batch)
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Plans a FIFO allocation of `requested` units across `lots`.
///
/// Walks the lots front to back, taking
/// `min(remaining_needed, lot.remaining_quantity)` from each until the
/// request is satisfied. Each non-zero take snapshots that lot's prices
/// and carries its own COGS/revenue/profit split; the plan accumulates
/// the line-level totals.
///
/// ## Errors
/// - [`CoreError::InsufficientStock`] if the lots are exhausted before
///   the request is filled. The error carries the total available
///   quantity so the caller can surface the shortfall; the caller must
///   then abort the enclosing sale transaction.
/// - [`CoreError::Validation`] if `requested` is not positive.
/// - [`CoreError::QuantityOutOfRange`] if a lot carries a negative
///   remaining quantity (corrupted snapshot).
///
/// ## Example
/// ```rust
/// use botika_core::fifo::{plan_allocation, BatchLot};
///
/// let lots = vec![
///     BatchLot { batch_id: "b1".into(), remaining_quantity: 10,
///                purchase_price_cents: 8000, selling_price_cents: 10000 },
///     BatchLot { batch_id: "b2".into(), remaining_quantity: 10,
///                purchase_price_cents: 8500, selling_price_cents: 10500 },
/// ];
/// let plan = plan_allocation(&lots, 15).unwrap();
/// assert_eq!(plan.cogs_cents, 122500);   // ₱800 + ₱425
/// assert_eq!(plan.revenue_cents, 152500); // ₱1,000 + ₱525
/// assert_eq!(plan.profit_cents, 30000);  // ₱300
/// ```
pub fn plan_allocation(lots: &[BatchLot], requested: i64) -> CoreResult<AllocationPlan> {
    if requested <= 0 {
        return Err(CoreError::Validation(
            crate::error::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            },
        ));
    }

    let mut remaining_needed = requested;
    let mut takes = Vec::new();
    let mut cogs = Money::zero();
    let mut revenue = Money::zero();

    for lot in lots {
        if remaining_needed == 0 {
            break;
        }
        if lot.remaining_quantity < 0 {
            return Err(CoreError::QuantityOutOfRange {
                batch_id: lot.batch_id.clone(),
                remaining: lot.remaining_quantity,
                original: lot.remaining_quantity,
            });
        }
        if lot.remaining_quantity == 0 {
            // Defensive: depleted lots shouldn't be in the snapshot
            continue;
        }

        let take_qty = remaining_needed.min(lot.remaining_quantity);
        let take_cogs = Money::from_cents(lot.purchase_price_cents).multiply_quantity(take_qty);
        let take_revenue = Money::from_cents(lot.selling_price_cents).multiply_quantity(take_qty);

        takes.push(Take {
            batch_id: lot.batch_id.clone(),
            quantity: take_qty,
            purchase_price_cents: lot.purchase_price_cents,
            selling_price_cents: lot.selling_price_cents,
            item_cogs_cents: take_cogs.cents(),
            item_revenue_cents: take_revenue.cents(),
            item_profit_cents: (take_revenue - take_cogs).cents(),
            depletes_batch: take_qty == lot.remaining_quantity,
        });

        cogs += take_cogs;
        revenue += take_revenue;
        remaining_needed -= take_qty;
    }

    if remaining_needed > 0 {
        return Err(CoreError::InsufficientStock {
            available: requested - remaining_needed,
            requested,
        });
    }

    Ok(AllocationPlan {
        takes,
        cogs_cents: cogs.cents(),
        revenue_cents: revenue.cents(),
        profit_cents: (revenue - cogs).cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(id: &str, remaining: i64, purchase: i64, selling: i64) -> BatchLot {
        BatchLot {
            batch_id: id.to_string(),
            remaining_quantity: remaining,
            purchase_price_cents: purchase,
            selling_price_cents: selling,
        }
    }

    #[test]
    fn test_single_batch_partial_take() {
        let lots = vec![lot("b1", 10, 8000, 10000)];
        let plan = plan_allocation(&lots, 4).unwrap();

        assert_eq!(plan.takes.len(), 1);
        assert_eq!(plan.takes[0].quantity, 4);
        assert!(!plan.takes[0].depletes_batch);
        assert_eq!(plan.cogs_cents, 32000);
        assert_eq!(plan.revenue_cents, 40000);
        assert_eq!(plan.profit_cents, 8000);
    }

    #[test]
    fn test_fifo_spills_into_second_batch() {
        // B1 (qty 5) created first, B2 (qty 5) second: a sale of 7 takes
        // 5 from B1 and 2 from B2, leaving B2 with 3.
        let lots = vec![lot("b1", 5, 8000, 10000), lot("b2", 5, 8500, 10500)];
        let plan = plan_allocation(&lots, 7).unwrap();

        assert_eq!(plan.takes.len(), 2);
        assert_eq!(plan.takes[0].batch_id, "b1");
        assert_eq!(plan.takes[0].quantity, 5);
        assert!(plan.takes[0].depletes_batch);
        assert_eq!(plan.takes[1].batch_id, "b2");
        assert_eq!(plan.takes[1].quantity, 2);
        assert!(!plan.takes[1].depletes_batch);
    }

    #[test]
    fn test_exact_depletion_of_all_batches() {
        let lots = vec![lot("b1", 5, 8000, 10000), lot("b2", 5, 8500, 10500)];
        let plan = plan_allocation(&lots, 10).unwrap();

        assert_eq!(plan.takes.len(), 2);
        assert!(plan.takes.iter().all(|t| t.depletes_batch));
        assert!(plan.depletes_any_batch());
    }

    #[test]
    fn test_insufficient_stock_reports_available() {
        let lots = vec![lot("b1", 5, 8000, 10000), lot("b2", 5, 8500, 10500)];
        let err = plan_allocation(&lots, 100).unwrap_err();

        match err {
            CoreError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, 10);
                assert_eq!(requested, 100);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_lot_list_is_insufficient() {
        let err = plan_allocation(&[], 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 0,
                requested: 1
            }
        ));
    }

    #[test]
    fn test_non_positive_request_rejected() {
        let lots = vec![lot("b1", 5, 8000, 10000)];
        assert!(matches!(
            plan_allocation(&lots, 0),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            plan_allocation(&lots, -3),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_quantity_lots_are_skipped() {
        let lots = vec![lot("b0", 0, 7000, 9000), lot("b1", 5, 8000, 10000)];
        let plan = plan_allocation(&lots, 3).unwrap();

        assert_eq!(plan.takes.len(), 1);
        assert_eq!(plan.takes[0].batch_id, "b1");
    }

    /// The reference scenario: B1 10 @ ₱80/₱100, B2 10 @ ₱85/₱105,
    /// sell 15 units.
    #[test]
    fn test_two_batch_profit_scenario() {
        let lots = vec![lot("b1", 10, 8000, 10000), lot("b2", 10, 8500, 10500)];
        let plan = plan_allocation(&lots, 15).unwrap();

        // 10 from B1: cogs ₱800, revenue ₱1,000, profit ₱200
        assert_eq!(plan.takes[0].quantity, 10);
        assert_eq!(plan.takes[0].item_cogs_cents, 80000);
        assert_eq!(plan.takes[0].item_revenue_cents, 100000);
        assert_eq!(plan.takes[0].item_profit_cents, 20000);
        assert!(plan.takes[0].depletes_batch);

        // 5 from B2: cogs ₱425, revenue ₱525, profit ₱100
        assert_eq!(plan.takes[1].quantity, 5);
        assert_eq!(plan.takes[1].item_cogs_cents, 42500);
        assert_eq!(plan.takes[1].item_revenue_cents, 52500);
        assert_eq!(plan.takes[1].item_profit_cents, 10000);
        assert!(!plan.takes[1].depletes_batch);

        // Line totals: cogs ₱1,225, revenue ₱1,525, profit ₱300
        assert_eq!(plan.cogs_cents, 122500);
        assert_eq!(plan.revenue_cents, 152500);
        assert_eq!(plan.profit_cents, 30000);

        // Margin over revenue ≈ 19.67%
        use crate::money::Money;
        let margin = Money::margin_bps(
            Money::from_cents(plan.profit_cents),
            Money::from_cents(plan.revenue_cents),
        );
        assert_eq!(margin, 1967);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let lots = vec![lot("b1", 7, 8000, 10000), lot("b2", 9, 8500, 10500)];
        let a = plan_allocation(&lots, 12).unwrap();
        let b = plan_allocation(&lots, 12).unwrap();
        assert_eq!(a, b);
    }
}
