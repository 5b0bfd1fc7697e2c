//! Repository for profit log entries, the idempotency marker store.
//!
//! The unique `(investment_id, period_ending)` constraint is the sole
//! guarantee against paying a period twice; claims go through
//! `INSERT ... ON CONFLICT DO NOTHING` so a lost race reads as
//! "already paid", never as a failure.

use crate::error::RepoResult;
use crate::models::ProfitLogEntry;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ProfitLogRepository {
    pool: PgPool,
}

impl ProfitLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cheap pre-check used to skip periods that are visibly paid
    pub async fn exists(
        &self,
        investment_id: Uuid,
        period_ending: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM profit_log_entries
                WHERE investment_id = $1 AND period_ending = $2
            )
            "#,
        )
        .bind(investment_id)
        .bind(period_ending)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Atomically claim a payout period. Returns None when another run
    /// already holds the claim.
    #[allow(clippy::too_many_arguments)]
    pub async fn try_claim(
        &self,
        investment_id: Uuid,
        amount: Decimal,
        period_ending: DateTime<Utc>,
        weighted_pct: Option<Decimal>,
        gross_profit: Option<Decimal>,
        fee: Option<Decimal>,
    ) -> RepoResult<Option<ProfitLogEntry>> {
        let entry = sqlx::query_as::<_, ProfitLogEntry>(
            r#"
            INSERT INTO profit_log_entries
            (investment_id, amount, period_ending, weighted_pct, gross_profit, fee)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (investment_id, period_ending) DO NOTHING
            RETURNING id, investment_id, amount, period_ending, weighted_pct, gross_profit, fee, created_at
            "#,
        )
        .bind(investment_id)
        .bind(amount)
        .bind(period_ending)
        .bind(weighted_pct)
        .bind(gross_profit)
        .bind(fee)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Payout history for a position, oldest first
    pub async fn entries_for(&self, investment_id: Uuid) -> RepoResult<Vec<ProfitLogEntry>> {
        let entries = sqlx::query_as::<_, ProfitLogEntry>(
            r#"
            SELECT id, investment_id, amount, period_ending, weighted_pct, gross_profit, fee, created_at
            FROM profit_log_entries
            WHERE investment_id = $1
            ORDER BY period_ending
            "#,
        )
        .bind(investment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
