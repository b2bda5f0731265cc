//! # Batch Numbering
//!
//! Rules for the human-readable batch number:
//! `BT-{MMDDYY}-{HHMMSS}-{seq}`.
//!
//! ## The Positional Sequence Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seq = (count of existing batches for this product) + 1                │
//! │                                                                         │
//! │  Day 1: add batch  →  BT-061026-093015-001                             │
//! │  Day 2: add batch  →  BT-061126-101502-002                             │
//! │  Day 5: add batch  →  BT-061426-084433-003                             │
//! │                                                                         │
//! │  The sequence counts the product's whole batch history, NOT batches    │
//! │  created "today". A per-day count restarts at 001 every morning and    │
//! │  collides as soon as two same-second intakes land on different days'   │
//! │  counters; the positional count is strictly increasing per product     │
//! │  regardless of calendar day.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The legacy backfill batch (pre-batch-tracking stock attributed
//! retroactively) always takes sequence 1, stamped with the *product's*
//! creation time, so the first real intake becomes 002 or later.
//!
//! Collisions are astronomically rare given the timestamp+count
//! composition (they require manually backdated rows). The storage layer
//! retries with [`perturb_timestamp`] against the UNIQUE constraint and
//! gives up after [`NUMBER_RETRY_BUDGET`] attempts.

use chrono::{DateTime, Duration, Utc};

/// Prefix of every generated batch number.
pub const BATCH_NUMBER_PREFIX: &str = "BT";

/// Sequence number of the synthesized legacy backfill batch.
pub const LEGACY_BACKFILL_SEQUENCE: i64 = 1;

/// How many perturbed candidates to try before giving up with a
/// duplicate-number error.
pub const NUMBER_RETRY_BUDGET: u32 = 3;

/// Formats a batch number from an intake timestamp and a positional
/// sequence number.
///
/// The sequence is zero-padded to 3 digits and widens naturally past 999.
///
/// ## Example
/// ```rust
/// use botika_core::numbering::format_batch_number;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2026, 6, 10, 9, 30, 15).unwrap();
/// assert_eq!(format_batch_number(at, 1), "BT-061026-093015-001");
/// assert_eq!(format_batch_number(at, 42), "BT-061026-093015-042");
/// assert_eq!(format_batch_number(at, 1000), "BT-061026-093015-1000");
/// ```
pub fn format_batch_number(at: DateTime<Utc>, seq: i64) -> String {
    format!(
        "{}-{}-{:03}",
        BATCH_NUMBER_PREFIX,
        at.format("%m%d%y-%H%M%S"),
        seq
    )
}

/// Computes the next positional sequence for a product with
/// `existing_batches` batch rows.
#[inline]
pub const fn next_sequence(existing_batches: i64) -> i64 {
    existing_batches + 1
}

/// Perturbs the intake timestamp for a collision retry.
///
/// The formatted time component has second granularity, so each retry
/// shifts by `attempt` whole seconds - enough to change the rendered
/// `HHMMSS` field while keeping the number honest about when the intake
/// happened.
pub fn perturb_timestamp(at: DateTime<Utc>, attempt: u32) -> DateTime<Utc> {
    at + Duration::seconds(attempt as i64)
}

// =============================================================================
// Unit Tests
// =============================================================================
