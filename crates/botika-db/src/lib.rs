//! # botika-db: Database Layer for the Botika POS Ledger
//!
//! This crate provides database access for the Botika batch inventory &
//! pricing ledger. It uses SQLite for local storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Botika Data Flow                                  │
//! │                                                                         │
//! │  POS checkout / restock / CSV import / admin utility                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     botika-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │   │  Repositories  │   │    Ledger     │  │   │
//! │  │   │   (pool.rs)   │   │ (read views)   │   │ (all writes,  │  │   │
//! │  │   │               │   │                │   │  one tx each) │  │   │
//! │  │   │ SqlitePool    │◄──│ Product/Batch/ │◄──│ add_batch     │  │   │
//! │  │   │ WAL + busy    │   │ Sale           │   │ create_sale_  │  │   │
//! │  │   │ timeout       │   │                │   │ with_items    │  │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Read-side repositories (product, batch, sale)
//! - [`pricing`] - Price synchronization (the cached price's only writer)
//! - [`ledger`] - The transactional ledger service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botika_db::{Database, DbConfig};
//! use botika_db::ledger::{AddBatchRequest, NewSale, NewSaleLine};
//!
//! let db = Database::new(DbConfig::new("path/to/botika.db")).await?;
//!
//! // Restock: one batch per intake
//! let added = db.ledger().add_batch(AddBatchRequest {
//!     product_id,
//!     quantity: 20,
//!     expiry_date: None,
//!     purchase_price_cents: Some(8_000),
//!     selling_price_cents: Some(10_000),
//!     supplier_name: Some("Metro Drug".into()),
//!     notes: None,
//! }).await?;
//!
//! // Checkout: allocation + aggregation in one transaction
//! let receipt = db.ledger().create_sale_with_items(
//!     NewSale { cashier_id, notes: None },
//!     vec![NewSaleLine { product_id, quantity: 3 }],
//! ).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod pricing;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use ledger::{Ledger, LedgerError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
