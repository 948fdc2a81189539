//! # Validation Module
//!
//! Input validation for the command surface. Commands validate before
//! anything is persisted so a bad input can never cost a version bump.

use crate::error::{ValidationError, ValidationResult};
use crate::types::OrderItem;

/// Maximum length for display names.
pub const MAX_NAME_LEN: usize = 120;

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

// =============================================================================
// Validators
// =============================================================================

/// Validates a display name (product name, customer name).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates a price in cents. Zero is allowed (comped items).
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line-item quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 || quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the line items of a new order.
pub fn validate_order_items(items: &[OrderItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    if items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }
    for item in items {
        validate_name("items.name", &item.name)?;
        validate_quantity(item.quantity)?;
        validate_price("items.unitPriceCents", item.unit_price_cents)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
