//! Warehouse domain model
pub mod aggregates;
pub mod events;
pub mod reports;
pub mod value_objects;

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Money columns are `NUMERIC(12, 2)`.
pub const MONEY_SCALE: u32 = 2;
const MONEY_MAX_CENTS: i64 = 999_999_999_999;

pub fn money_max() -> Decimal { Decimal::new(MONEY_MAX_CENTS, MONEY_SCALE) }

fn money_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Non-negative, at most two decimal places, and within the column range.
/// Storage never rounds an accepted amount.
pub(crate) fn money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(money_error("negative_amount", "amount cannot be negative"));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(money_error("amount_scale", "amount has more than two decimal places"));
    }
    if *value > money_max() {
        return Err(money_error("amount_range", "amount exceeds 9999999999.99"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn check(s: &str) -> Result<(), ValidationError> { money(&Decimal::from_str(s).unwrap()) }

    #[test]
    fn money_accepts_cents() {
        assert!(check("0").is_ok());
        assert!(check("2.5").is_ok());
        assert!(check("2.50").is_ok());
        assert!(check("2.500").is_ok());
        assert!(check("9999999999.99").is_ok());
    }

    #[test]
    fn money_rejects_what_storage_would_change() {
        assert_eq!(check("2.505").unwrap_err().code, "amount_scale");
        assert_eq!(check("12345678901").unwrap_err().code, "amount_range");
        assert_eq!(check("10000000000.00").unwrap_err().code, "amount_range");
        assert_eq!(check("-0.01").unwrap_err().code, "negative_amount");
    }
}
