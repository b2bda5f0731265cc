//! # botika-core: Pure Business Logic for the Botika POS Ledger
//!
//! This crate is the **heart** of the Botika batch inventory & pricing
//! ledger. It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Botika POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        POS checkout / restock UI / bulk CSV importer            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ service layer calls                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 botika-db (Ledger + repositories)               │   │
//! │  │    add_batch, create_sale_with_items, price sync, reports      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ botika-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   fifo    │  │ numbering │  │   │
//! │  │   │  Product  │  │   Money   │  │ BatchLot  │  │ BT-date-  │  │   │
//! │  │   │   Batch   │  │ markup/   │  │ Allocation│  │ time-seq  │  │   │
//! │  │   │   Sale    │  │ margin    │  │ Plan      │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Batch, Sale, allocations)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`fifo`] - The FIFO allocation planner
//! - [`numbering`] - Batch number generation rules
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use botika_core::fifo::{plan_allocation, BatchLot};
//!
//! // Two batches: 5 units each, oldest first
//! let lots = vec![
//!     BatchLot { batch_id: "b1".into(), remaining_quantity: 5,
//!                purchase_price_cents: 8000, selling_price_cents: 10000 },
//!     BatchLot { batch_id: "b2".into(), remaining_quantity: 5,
//!                purchase_price_cents: 8500, selling_price_cents: 10500 },
//! ];
//!
//! // Selling 7 units drains the oldest batch first
//! let plan = plan_allocation(&lots, 7).unwrap();
//! assert_eq!(plan.takes[0].quantity, 5);
//! assert_eq!(plan.takes[1].quantity, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fifo;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use botika_core::Money` instead of
// `use botika_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale
///
/// ## Business Reason
/// Prevents runaway checkouts and ensures reasonable transaction sizes.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum quantity accepted for a single batch intake
///
/// A pharmacy restock above this is almost certainly a data-entry error
/// (the CSV importer splits larger deliveries into multiple rows).
pub const MAX_BATCH_QUANTITY: i64 = 1_000_000;
