//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use shared::models::{RefundBank, ShippingAddress};

use crate::utils::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, recipient, bank holder
pub const MAX_NAME_LEN: usize = 200;

/// Client supplied order numbers
pub const MAX_ORDER_NUMBER_LEN: usize = 64;

/// Notes, cancel reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, account number, product id
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Max quantity of a single order line (after merging duplicate lines)
pub const MAX_LINE_QUANTITY: i64 = 9_999;

// ── Amount limits (VND) ─────────────────────────────────────────────

/// Max product unit price
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

/// Max shipping fee of one order
pub const MAX_SHIPPING_FEE: i64 = 100_000_000;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(
            AppError::with_message(ErrorCode::RequiredField, format!("{field} must not be empty"))
                .with_detail("field", field),
        );
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate an amount in VND: `0..=max`
pub fn validate_amount(value: i64, field: &str, max: i64) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} must not be negative"))
            .with_detail("field", field));
    }
    if value > max {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must not exceed {max}"),
        )
        .with_detail("field", field)
        .with_detail("max", max));
    }
    Ok(())
}

pub fn validate_shipping_address(address: &ShippingAddress) -> Result<(), AppError> {
    validate_required_text(&address.recipient_name, "recipient_name", MAX_NAME_LEN)?;
    validate_required_text(&address.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&address.address, "address", MAX_ADDRESS_LEN)?;
    Ok(())
}

pub fn validate_refund_bank(bank: &RefundBank) -> Result<(), AppError> {
    validate_required_text(&bank.bank_name, "bank_name", MAX_NAME_LEN)?;
    validate_required_text(&bank.account_number, "account_number", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&bank.holder_name, "holder_name", MAX_NAME_LEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("ORD-1", "order_number", 64).is_ok());

        let err = validate_required_text("   ", "order_number", 64).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.message, "order_number must not be empty");

        let long = "x".repeat(65);
        let err = validate_required_text(&long, "order_number", 64).unwrap_err();
        assert!(err.message.contains("max 64"));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 20 Vietnamese characters, more than 20 bytes
        let name = "Nguyễn Văn Ánh Dương";
        assert!(validate_required_text(name, "recipient_name", 20).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "note", 5).is_ok());
        assert!(validate_optional_text(&Some("abc".into()), "note", 5).is_ok());
        assert!(validate_optional_text(&Some("abcdef".into()), "note", 5).is_err());
    }

    #[test]
    fn test_shipping_address() {
        let mut address = ShippingAddress {
            recipient_name: "Lan".into(),
            phone: "0901234567".into(),
            address: "12 Lê Lợi, Q1".into(),
        };
        assert!(validate_shipping_address(&address).is_ok());

        address.phone = String::new();
        let err = validate_shipping_address(&address).unwrap_err();
        assert_eq!(err.message, "phone must not be empty");
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(0, "shipping_fee", MAX_SHIPPING_FEE).is_ok());
        assert!(validate_amount(MAX_SHIPPING_FEE, "shipping_fee", MAX_SHIPPING_FEE).is_ok());

        let err = validate_amount(-1, "shipping_fee", MAX_SHIPPING_FEE).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = validate_amount(i64::MAX, "shipping_fee", MAX_SHIPPING_FEE).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }
}
