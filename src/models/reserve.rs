use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Singleton aggregate row: reserve accumulated from distributed profit and
/// assets-under-management recomputed each cycle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReserveBuffer {
    pub id: i16,
    pub current_amount: Decimal,
    pub total_aum: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl ReserveBuffer {
    /// Published coverage ratio (reserve / AUM); None while no principal is
    /// under management.
    pub fn coverage_ratio(&self) -> Option<Decimal> {
        if self.total_aum.is_zero() {
            None
        } else {
            Some(self.current_amount / self.total_aum)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_coverage_ratio() {
        let reserve = ReserveBuffer {
            id: 1,
            current_amount: dec!(250),
            total_aum: dec!(1000),
            updated_at: Utc::now(),
        };
        assert_eq!(reserve.coverage_ratio(), Some(dec!(0.25)));
    }

    #[test]
    fn test_coverage_ratio_undefined_without_aum() {
        let reserve = ReserveBuffer {
            id: 1,
            current_amount: dec!(250),
            total_aum: Decimal::ZERO,
            updated_at: Utc::now(),
        };
        assert_eq!(reserve.coverage_ratio(), None);
    }
}
