//! # Repository Module
//!
//! Database repository implementations for the Botika ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Read/Write Split                                     │
//! │                                                                         │
//! │  Repositories (this module)          Ledger (ledger module)            │
//! │  ──────────────────────────          ───────────────────────           │
//! │  Pool-backed, read-mostly            Owns every multi-row write:       │
//! │  lookups and listings:               restock, checkout, price sync     │
//! │  • product CRUD                      run inside ONE transaction        │
//! │  • FIFO-ordered batch views          with rollback on any failure      │
//! │  • sale/profit reporting                                                │
//! │                                                                         │
//! │  Derived fields (current_price_cents, total_stock) are never written   │
//! │  by repositories - the ledger is their single writer.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and listings
//! - [`batch::BatchRepository`] - FIFO-ordered batch views and lookups
//! - [`sale::SaleRepository`] - Sale, item, and allocation reads

pub mod batch;
pub mod product;
pub mod sale;
