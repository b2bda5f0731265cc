//! # Validation Module
//!
//! Input validation for ledger operations.
//!
//! Validation runs before any write: a request that fails here never
//! opens a transaction, so `ValidationError` can never leave partial
//! state behind. The database's NOT NULL / CHECK / UNIQUE constraints
//! remain as the second layer behind these checks.

use crate::error::ValidationError;
use crate::{MAX_BATCH_QUANTITY, MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a batch intake quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_BATCH_QUANTITY
pub fn validate_batch_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_BATCH_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_BATCH_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (9999)
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an optional purchase price in centavos.
///
/// ## Rules
/// - Absent is allowed (unknown cost, markup treated as 0)
/// - Present must be non-negative (>= 0)
pub fn validate_purchase_price_cents(cents: Option<i64>) -> ValidationResult<()> {
    if let Some(cents) = cents {
        if cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "purchase_price".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

/// Validates an optional selling price in centavos.
///
/// ## Rules
/// - Absent is allowed (batch inherits nothing; price sync skips it)
/// - Present must be strictly positive - a zero selling price would be
///   propagated to the product's display price by Price Synchronization
pub fn validate_selling_price_cents(cents: Option<i64>) -> ValidationResult<()> {
    if let Some(cents) = cents {
        if cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "selling_price".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-text field (supplier name, notes).
pub fn validate_free_text(field: &str, value: &Option<String>, max: usize) -> ValidationResult<()> {
    if let Some(value) = value {
        if value.len() > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
            });
        }
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use botika_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items in a sale.
///
/// ## Rules
/// - Must have at least one line
/// - Must not exceed MAX_SALE_LINES (100)
pub fn validate_sale_lines(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_quantity() {
        assert!(validate_batch_quantity(1).is_ok());
        assert!(validate_batch_quantity(500).is_ok());

        assert!(validate_batch_quantity(0).is_err());
        assert!(validate_batch_quantity(-1).is_err());
        assert!(validate_batch_quantity(MAX_BATCH_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_prices() {
        assert!(validate_purchase_price_cents(None).is_ok());
        assert!(validate_purchase_price_cents(Some(0)).is_ok());
        assert!(validate_purchase_price_cents(Some(8000)).is_ok());
        assert!(validate_purchase_price_cents(Some(-1)).is_err());

        assert!(validate_selling_price_cents(None).is_ok());
        assert!(validate_selling_price_cents(Some(10000)).is_ok());
        assert!(validate_selling_price_cents(Some(0)).is_err());
        assert!(validate_selling_price_cents(Some(-5)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Paracetamol 500mg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_sale_lines() {
        assert!(validate_sale_lines(1).is_ok());
        assert!(validate_sale_lines(MAX_SALE_LINES).is_ok());
        assert!(validate_sale_lines(0).is_err());
        assert!(validate_sale_lines(MAX_SALE_LINES + 1).is_err());
    }
}
