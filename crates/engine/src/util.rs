//! Internal helpers for input normalization and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so the engine enforces consistent invariants.

use crate::{EngineError, Money, ResultEngine};

/// Trim a required text field, rejecting empty values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn require_non_negative_money(value: Money, label: &str) -> ResultEngine<()> {
    if value.is_negative() {
        return Err(EngineError::InvalidPrice(format!(
            "{label} must be >= 0, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn require_non_negative_quantity(value: i64, label: &str) -> ResultEngine<()> {
    if value < 0 {
        return Err(EngineError::InvalidQuantity(format!(
            "{label} must be >= 0, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(normalize_required_text("  Acme ", "name").unwrap(), "Acme");
        assert_eq!(
            normalize_required_text("   ", "name").unwrap_err().kind(),
            "INVALID_INPUT"
        );
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(normalize_optional_text(Some(" x ")), Some("x".to_string()));
    }
}
