//! # Validation Module
//!
//! Input validation for ledger and order requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API collaborator                                             │
//! │  ├── Deserialization into typed records                                │
//! │  └── Auth, session, shop ownership                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: khata-ledger services                                        │
//! │  └── THIS MODULE: field rules, before any statement runs               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (amount_paise > 0)                                          │
//! │  ├── UNIQUE (credit_entries.sale_id)                                   │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khata_core::validation::{validate_amount, validate_quantity};
//!
//! assert!(validate_amount(500).is_ok());
//! assert!(validate_amount(0).is_err());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{NewSale, OrderItemInput, TransactionUpdate};
use crate::{MAX_AMOUNT_PAISE, MAX_BULK_IDS, MAX_ITEM_QUANTITY, MAX_NOTES_LEN, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stored amount in paise.
///
/// ## Rules
/// - Must be > 0 (the sign of a sale comes from its kind)
/// - Must not exceed [`MAX_AMOUNT_PAISE`]
pub fn validate_amount(paise: i64) -> ValidationResult<()> {
    validate_amount_field("amount", paise)
}

fn validate_amount_field(field: &str, paise: i64) -> ValidationResult<()> {
    if paise <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if paise > MAX_AMOUNT_PAISE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_PAISE,
        });
    }
    Ok(())
}

/// Validates an order line quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a credit limit. Zero is allowed (no credit at all).
pub fn validate_credit_limit(limit_paise: Option<i64>) -> ValidationResult<()> {
    match limit_paise {
        Some(limit) if limit < 0 => Err(ValidationError::OutOfRange {
            field: "credit_limit".to_string(),
            min: 0,
            max: MAX_AMOUNT_PAISE,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an identifier (shop, customer, sale, editor).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a name (customer, product, ad-hoc line).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }
    Ok(())
}

/// Validates optional free-text notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: MAX_NOTES_LEN,
            });
        }
    }
    Ok(())
}

/// Validates sale tags: each tag non-empty and at most 50 characters.
pub fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "tags".to_string(),
            });
        }
        if tag.chars().count() > 50 {
            return Err(ValidationError::TooLong {
                field: "tags".to_string(),
                max: 50,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a sale request.
///
/// A CREDIT sale must name a customer: credit extended to nobody cannot
/// be collected.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_id("shop_id", &sale.shop_id)?;
    validate_amount(sale.amount_paise)?;
    validate_notes(sale.notes.as_deref())?;

    match sale.customer_id.as_deref() {
        Some(customer_id) => validate_id("customer_id", customer_id)?,
        None if sale.kind.is_credit() => {
            return Err(ValidationError::Required {
                field: "customer_id".to_string(),
            })
        }
        None => {}
    }
    Ok(())
}

/// Validates an edit request. Every edit must say who and why.
pub fn validate_transaction_update(update: &TransactionUpdate) -> ValidationResult<()> {
    if update.edit_reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "edit_reason".to_string(),
        });
    }
    validate_id("editor_id", &update.editor_id)?;
    if let Some(amount) = update.amount_paise {
        validate_amount(amount)?;
    }
    validate_notes(update.notes.as_deref())?;
    if let Some(tags) = &update.tags {
        validate_tags(tags)?;
    }
    Ok(())
}

/// Validates a list of ids for a bulk operation.
pub fn validate_id_batch(ids: &[String]) -> ValidationResult<()> {
    if ids.is_empty() {
        return Err(ValidationError::Required {
            field: "sale_ids".to_string(),
        });
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(ValidationError::OutOfRange {
            field: "sale_ids".to_string(),
            min: 1,
            max: MAX_BULK_IDS as i64,
        });
    }
    for id in ids {
        validate_id("sale_ids", id)?;
    }
    Ok(())
}

/// Validates the items of an order before any lookup happens.
pub fn validate_order_items(items: &[OrderItemInput]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
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
        validate_quantity(item.quantity())?;
        match item {
            OrderItemInput::Catalog { product_id, .. } => validate_id("product_id", product_id)?,
            OrderItemInput::AdHoc {
                name,
                unit_price_paise,
                ..
            } => {
                validate_name("name", name)?;
                // Zero is allowed: the shop fills the price in before verifying.
                if !(0..=MAX_AMOUNT_PAISE).contains(unit_price_paise) {
                    return Err(ValidationError::OutOfRange {
                        field: "unit_price".to_string(),
                        min: 0,
                        max: MAX_AMOUNT_PAISE,
                    });
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::PaymentKind;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(MAX_AMOUNT_PAISE).is_ok());
        assert!(matches!(
            validate_amount(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_amount(-100).is_err());
        assert!(validate_amount(MAX_AMOUNT_PAISE + 1).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_credit_sale_requires_customer() {
        let sale = NewSale::manual("shop-1", Money::from_rupees(10), PaymentKind::Credit);
        let err = validate_new_sale(&sale).unwrap_err();
        assert_eq!(err.field(), "customer_id");

        let sale = sale.customer("cust-1");
        assert!(validate_new_sale(&sale).is_ok());

        // Walk-in cash sales need no customer.
        let cash = NewSale::manual("shop-1", Money::from_rupees(10), PaymentKind::Cash);
        assert!(validate_new_sale(&cash).is_ok());
    }

    #[test]
    fn test_update_requires_reason_and_editor() {
        let mut update = TransactionUpdate {
            edit_reason: "  ".to_string(),
            editor_id: "owner".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate_transaction_update(&update).unwrap_err().field(),
            "edit_reason"
        );

        update.edit_reason = "typo".to_string();
        update.editor_id = String::new();
        assert_eq!(
            validate_transaction_update(&update).unwrap_err().field(),
            "editor_id"
        );

        update.editor_id = "owner".to_string();
        update.amount_paise = Some(0);
        assert!(validate_transaction_update(&update).is_err());
    }

    #[test]
    fn test_validate_notes_and_tags() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("paid later")).is_ok());
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LEN + 1))).is_err());

        assert!(validate_tags(&["festival".to_string()]).is_ok());
        assert!(validate_tags(&["".to_string()]).is_err());
    }

    #[test]
    fn test_validate_id_batch() {
        assert!(validate_id_batch(&[]).is_err());
        assert!(validate_id_batch(&["a".to_string(), "b".to_string()]).is_ok());
        let too_many: Vec<String> = (0..=MAX_BULK_IDS).map(|i| i.to_string()).collect();
        assert!(validate_id_batch(&too_many).is_err());
    }

    #[test]
    fn test_validate_order_items() {
        assert!(validate_order_items(&[]).is_err());

        let items = vec![
            OrderItemInput::Catalog {
                product_id: "p1".to_string(),
                quantity: 2,
            },
            OrderItemInput::AdHoc {
                name: "Loose rice".to_string(),
                quantity: 1,
                unit_price_paise: 0,
            },
        ];
        assert!(validate_order_items(&items).is_ok());

        let nameless = vec![OrderItemInput::AdHoc {
            name: " ".to_string(),
            quantity: 1,
            unit_price_paise: 100,
        }];
        assert_eq!(validate_order_items(&nameless).unwrap_err().field(), "name");

        let overpriced = vec![OrderItemInput::AdHoc {
            name: "Gold".to_string(),
            quantity: 1,
            unit_price_paise: MAX_AMOUNT_PAISE + 1,
        }];
        assert_eq!(
            validate_order_items(&overpriced).unwrap_err().field(),
            "unit_price"
        );
    }
}
