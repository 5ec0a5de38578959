//! Money arithmetic on integer cents.
//!
//! All balances and transaction amounts are carried as whole cents so ledger
//! sums stay exact. Percentage math rounds down: the engine never repays or
//! lends a fraction of a cent more than the rate allows.

use crate::error::CoreError;

/// An amount in whole cents. Always a positive magnitude on transactions;
/// the signed effect on a balance is derived from the transaction kind.
pub type Cents = i64;

/// Default wallet currency.
pub const CURRENCY: &str = "ZAR";

/// Compute `pct` percent of `amount`, rounding down.
pub fn pct_of(amount: Cents, pct: i32) -> Cents {
    debug_assert!(pct >= 0);
    (amount as i128 * pct as i128 / 100) as Cents
}

/// Validate that an externally supplied amount is a positive magnitude.
pub fn require_positive(amount: Cents) -> Result<Cents, CoreError> {
    if amount <= 0 {
        return Err(CoreError::Validation(
            "Amount must be greater than zero".into(),
        ));
    }
    Ok(amount)
}

/// Format cents as a decimal currency string, e.g. `1050` -> `"10.50"`.
pub fn format_cents(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_rounds_down() {
        assert_eq!(pct_of(10_000, 50), 5_000);
        assert_eq!(pct_of(101, 50), 50);
        assert_eq!(pct_of(99, 33), 32);
        assert_eq!(pct_of(0, 75), 0);
    }

    #[test]
    fn pct_large_amount_does_not_overflow() {
        assert_eq!(pct_of(i64::MAX / 2, 100), i64::MAX / 2);
    }

    #[test]
    fn positive_amounts_only() {
        assert!(require_positive(1).is_ok());
        assert!(require_positive(0).is_err());
        assert!(require_positive(-5).is_err());
    }

    #[test]
    fn formatting() {
        assert_eq!(format_cents(1050), "10.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-7525), "-75.25");
    }
}
