pub mod auth;
pub mod dashboard;
pub mod employee;
pub mod expenses;
pub mod general;
pub mod salary;
pub mod settings;

use crate::errors::{AppError, AppResult};
use rust_decimal::Decimal;

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional value; blank becomes `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn non_negative(amount: Decimal, field: &str) -> AppResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(AppError::Validation(format!("{} cannot be negative", field)));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn text_helpers_trim() {
        assert_eq!(required_text("  Finance ", "name").unwrap(), "Finance");
        assert!(matches!(required_text("   ", "name"), Err(AppError::Validation(_))));
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some(" EMP-1 ".to_string())), Some("EMP-1".to_string()));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert_eq!(non_negative(dec!(0), "cost").unwrap(), dec!(0));
        assert!(non_negative(dec!(-0.01), "cost").is_err());
    }
}
