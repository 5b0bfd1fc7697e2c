use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Idempotency marker and audit record for one period's payout. Unique on
/// `(investment_id, period_ending)`; the weighted fields are populated only
/// for stream-weighted plans.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfitLogEntry {
    pub id: Uuid,
    pub investment_id: Uuid,
    pub amount: Decimal,
    pub period_ending: DateTime<Utc>,
    pub weighted_pct: Option<Decimal>,
    pub gross_profit: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}
