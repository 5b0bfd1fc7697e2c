//! Pure payout arithmetic for the distribution cycle.
//!
//! Everything here is deterministic over its inputs; the committing and
//! dry-run paths of the cycle both call through these functions so their
//! numbers cannot diverge.

use crate::fx::MONEY_SCALE;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One period's profit, decomposed for the audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitBreakdown {
    pub rate_pct: Decimal,
    pub gross: Decimal,
    pub fee: Decimal,
    pub net: Decimal,
}

/// Compute one period's profit for a principal at `rate_pct`, withholding
/// `service_fee_pct` of the gross.
pub fn profit_for_period(
    principal: Decimal,
    rate_pct: Decimal,
    service_fee_pct: Decimal,
) -> ProfitBreakdown {
    let gross = (principal * rate_pct / HUNDRED).round_dp(MONEY_SCALE);
    let fee = (gross * service_fee_pct / HUNDRED).round_dp(MONEY_SCALE);
    let net = gross - fee;

    ProfitBreakdown {
        rate_pct,
        gross,
        fee,
        net,
    }
}

/// Effective per-period rate of a stream-weighted plan: each allocation
/// contributes its share of the stream's current ROI. Streams missing from
/// the snapshot contribute zero.
pub fn weighted_rate_pct(
    allocations: &HashMap<String, Decimal>,
    stream_roi_pct: &HashMap<String, Decimal>,
) -> Decimal {
    allocations
        .iter()
        .map(|(stream, allocation_pct)| {
            let roi = stream_roi_pct
                .get(stream)
                .copied()
                .unwrap_or(Decimal::ZERO);
            allocation_pct / HUNDRED * roi
        })
        .sum()
}

/// Period ends that have elapsed by `as_of`, in order. Period `i` ends at
/// `start + i * period_days` for `i` in `1..=duration_days / period_days`.
pub fn period_ends(
    start: DateTime<Utc>,
    duration_days: i32,
    period_days: i64,
    as_of: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    if period_days <= 0 || duration_days <= 0 {
        return Vec::new();
    }

    let total_periods = i64::from(duration_days) / period_days;
    (1..=total_periods)
        .map(|i| start + Duration::days(i * period_days))
        .filter(|end| *end <= as_of)
        .collect()
}

/// When the position's principal unlocks.
pub fn maturity_date(start: DateTime<Utc>, duration_days: i32) -> DateTime<Utc> {
    start + Duration::days(i64::from(duration_days))
}

pub fn is_mature(start: DateTime<Utc>, duration_days: i32, as_of: DateTime<Utc>) -> bool {
    as_of >= maturity_date(start, duration_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_flat_profit_with_fee() {
        // 1000 principal, 10% weekly, 5% fee -> 95 net
        let breakdown = profit_for_period(dec!(1000), dec!(10), dec!(5));
        assert_eq!(breakdown.gross, dec!(100));
        assert_eq!(breakdown.fee, dec!(5));
        assert_eq!(breakdown.net, dec!(95));
    }

    #[test]
    fn test_zero_fee_passes_gross_through() {
        let breakdown = profit_for_period(dec!(250), dec!(4), dec!(0));
        assert_eq!(breakdown.gross, dec!(10));
        assert_eq!(breakdown.net, dec!(10));
    }

    #[test]
    fn test_weighted_rate() {
        let allocations = HashMap::from([
            ("real_estate".to_string(), dec!(40)),
            ("private_credit".to_string(), dec!(35)),
            ("treasuries".to_string(), dec!(25)),
        ]);
        let roi = HashMap::from([
            ("real_estate".to_string(), dec!(2.0)),
            ("private_credit".to_string(), dec!(4.0)),
            ("treasuries".to_string(), dec!(1.0)),
        ]);

        // 0.40*2.0 + 0.35*4.0 + 0.25*1.0 = 2.45
        assert_eq!(weighted_rate_pct(&allocations, &roi), dec!(2.45));
    }

    #[test]
    fn test_weighted_rate_unknown_stream_contributes_zero() {
        let allocations = HashMap::from([
            ("real_estate".to_string(), dec!(60)),
            ("unlisted".to_string(), dec!(40)),
        ]);
        let roi = HashMap::from([("real_estate".to_string(), dec!(3.0))]);

        assert_eq!(weighted_rate_pct(&allocations, &roi), dec!(1.8));
    }

    #[test]
    fn test_period_ends_eight_days_in() {
        // 14-day weekly plan, 8 days elapsed: week 1 due, week 2 not yet
        let start = ts("2026-01-01T00:00:00Z");
        let as_of = ts("2026-01-09T00:00:00Z");

        let ends = period_ends(start, 14, 7, as_of);
        assert_eq!(ends, vec![ts("2026-01-08T00:00:00Z")]);
    }

    #[test]
    fn test_period_ends_never_exceed_duration() {
        // 30-day weekly plan has exactly 4 payable periods
        let start = ts("2026-01-01T00:00:00Z");
        let as_of = ts("2026-06-01T00:00:00Z");

        let ends = period_ends(start, 30, 7, as_of);
        assert_eq!(ends.len(), 4);
        assert_eq!(*ends.last().unwrap(), ts("2026-01-29T00:00:00Z"));
    }

    #[test]
    fn test_period_ends_none_before_first_window() {
        let start = ts("2026-01-01T00:00:00Z");
        let as_of = ts("2026-01-07T23:59:59Z");

        assert!(period_ends(start, 28, 7, as_of).is_empty());
    }

    #[test]
    fn test_period_end_due_at_exact_boundary() {
        let start = ts("2026-01-01T00:00:00Z");
        let as_of = ts("2026-01-08T00:00:00Z");

        assert_eq!(period_ends(start, 28, 7, as_of).len(), 1);
    }

    #[test]
    fn test_maturity() {
        let start = ts("2026-01-01T00:00:00Z");
        assert!(!is_mature(start, 14, ts("2026-01-14T23:59:59Z")));
        assert!(is_mature(start, 14, ts("2026-01-15T00:00:00Z")));
        assert!(is_mature(start, 14, ts("2026-03-01T00:00:00Z")));
    }
}
