//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Trim a required text field, rejecting empty values.
pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Case-folded NFKC form used for uniqueness checks on account codes and
/// category names.
pub(crate) fn normalize_key(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Ensure a movement currency matches the currency of a referenced account.
pub(crate) fn ensure_account_currency(
    account_currency: Currency,
    movement_currency: Currency,
) -> ResultEngine<()> {
    if account_currency != movement_currency {
        return Err(EngineError::CurrencyMismatch(format!(
            "account currency is {}, movement uses {}",
            account_currency.code(),
            movement_currency.code()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalization_folds_case_and_width() {
        assert_eq!(normalize_key("  Caja "), "caja");
        assert_eq!(normalize_key("Ｂａｎｋ"), "bank");
    }
}
