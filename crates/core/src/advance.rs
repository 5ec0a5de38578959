//! Advance credit math: weekly eligibility, per-draw caps, automatic
//! repayment, and the billing-week calendar.
//!
//! Usage is keyed by billing week, which starts Friday 00:00 UTC. Keying by
//! week (rather than mutating a counter back to zero) makes the scheduled
//! weekly reset idempotent by construction.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::CoreError;
use crate::money::{pct_of, Cents};
use crate::types::Timestamp;

/// Limit parameters derived from a subscription package.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceTerms {
    /// Total advance budget per billing week.
    pub weekly_limit: Cents,
    /// Maximum single draw as a percentage of the weekly limit.
    pub advance_percentage: i32,
    /// Fraction of each incoming deposit applied to outstanding advances,
    /// as a percentage.
    pub auto_repay_rate: i32,
}

impl AdvanceTerms {
    /// Largest amount a single draw may request.
    pub fn max_single_draw(&self) -> Cents {
        pct_of(self.weekly_limit, self.advance_percentage)
    }
}

/// Start of the billing week containing `now`. Weeks begin Friday 00:00 UTC.
pub fn billing_week_start(now: Timestamp) -> NaiveDate {
    let date = now.date_naive();
    let days_since_friday =
        (date.weekday().num_days_from_monday() + 7 - Weekday::Fri.num_days_from_monday()) % 7;
    date - Duration::days(days_since_friday as i64)
}

/// Validate a draw request against the terms and this week's usage.
///
/// Fails with [`CoreError::LimitExceeded`] without charging anything; the
/// caller only mutates usage after this passes (and re-checks atomically in
/// the database).
pub fn check_draw(amount: Cents, used: Cents, terms: &AdvanceTerms) -> Result<(), CoreError> {
    if amount <= 0 {
        return Err(CoreError::Validation(
            "Advance amount must be greater than zero".into(),
        ));
    }
    let max_draw = terms.max_single_draw();
    if amount > max_draw {
        return Err(CoreError::LimitExceeded(format!(
            "Single draw is capped at {max_draw} cents"
        )));
    }
    let remaining = terms.weekly_limit - used;
    if amount > remaining {
        return Err(CoreError::LimitExceeded(format!(
            "Only {remaining} cents of this week's limit remain"
        )));
    }
    Ok(())
}

/// Repayment charged against an incoming deposit:
/// `min(outstanding, deposit * auto_repay_rate)`.
pub fn repayment_due(outstanding: Cents, deposit: Cents, auto_repay_rate: i32) -> Cents {
    pct_of(deposit, auto_repay_rate).min(outstanding).max(0)
}

/// Split a repayment across open draws, oldest first.
///
/// Returns one amount per input draw, in order; the sum equals
/// `min(repay, sum(outstanding))`.
pub fn allocate_repayment(outstanding_by_draw: &[Cents], repay: Cents) -> Vec<Cents> {
    let mut remaining = repay;
    outstanding_by_draw
        .iter()
        .map(|&outstanding| {
            let portion = outstanding.min(remaining).max(0);
            remaining -= portion;
            portion
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn terms() -> AdvanceTerms {
        AdvanceTerms {
            weekly_limit: 50_000,
            advance_percentage: 100,
            auto_repay_rate: 50,
        }
    }

    #[test]
    fn draw_within_limit_passes() {
        assert!(check_draw(30_000, 0, &terms()).is_ok());
        assert!(check_draw(20_000, 30_000, &terms()).is_ok());
    }

    #[test]
    fn draw_over_remaining_budget_fails() {
        let result = check_draw(25_000, 30_000, &terms());
        assert_matches!(result, Err(CoreError::LimitExceeded(_)));
    }

    #[test]
    fn draw_over_per_draw_cap_fails() {
        let capped = AdvanceTerms {
            advance_percentage: 40,
            ..terms()
        };
        // Cap is 20_000 even though the full weekly budget is free.
        assert!(check_draw(20_000, 0, &capped).is_ok());
        assert_matches!(
            check_draw(20_001, 0, &capped),
            Err(CoreError::LimitExceeded(_))
        );
    }

    #[test]
    fn non_positive_draw_rejected() {
        assert_matches!(check_draw(0, 0, &terms()), Err(CoreError::Validation(_)));
        assert_matches!(check_draw(-5, 0, &terms()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn repayment_capped_by_outstanding() {
        // Deposit 100.00 with 40.00 outstanding at a 50% rate repays the
        // full 40.00, not 50.00.
        assert_eq!(repayment_due(4_000, 10_000, 50), 4_000);
        // With more outstanding than the rate share, the rate governs.
        assert_eq!(repayment_due(20_000, 10_000, 50), 5_000);
        // Nothing outstanding, nothing repaid.
        assert_eq!(repayment_due(0, 10_000, 50), 0);
    }

    #[test]
    fn repayment_allocates_oldest_first() {
        let portions = allocate_repayment(&[3_000, 2_000, 5_000], 4_000);
        assert_eq!(portions, vec![3_000, 1_000, 0]);

        let exact = allocate_repayment(&[1_000, 1_000], 2_000);
        assert_eq!(exact, vec![1_000, 1_000]);

        let overshoot = allocate_repayment(&[500], 2_000);
        assert_eq!(overshoot, vec![500]);
    }

    #[test]
    fn week_starts_on_friday() {
        // 2026-03-06 is a Friday.
        let friday = Utc.with_ymd_and_hms(2026, 3, 6, 0, 0, 0).unwrap();
        let expected = friday.date_naive();

        assert_eq!(billing_week_start(friday), expected);
        // Midweek (following Wednesday) still maps back to that Friday.
        let wednesday = Utc.with_ymd_and_hms(2026, 3, 11, 15, 30, 0).unwrap();
        assert_eq!(billing_week_start(wednesday), expected);
        // Thursday is the last day of the week.
        let thursday = Utc.with_ymd_and_hms(2026, 3, 12, 23, 59, 59).unwrap();
        assert_eq!(billing_week_start(thursday), expected);
        // The next Friday starts a new week.
        let next_friday = Utc.with_ymd_and_hms(2026, 3, 13, 0, 0, 0).unwrap();
        assert_eq!(
            billing_week_start(next_friday),
            next_friday.date_naive()
        );
    }
}
