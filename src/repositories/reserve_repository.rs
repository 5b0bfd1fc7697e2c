//! Repository for the singleton reserve/AUM aggregate row

use crate::error::RepoResult;
use crate::models::ReserveBuffer;
use rust_decimal::Decimal;
use sqlx::PgPool;

pub struct ReserveRepository {
    pool: PgPool,
}

impl ReserveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> RepoResult<ReserveBuffer> {
        let reserve = sqlx::query_as::<_, ReserveBuffer>(
            r#"
            SELECT id, current_amount, total_aum, updated_at
            FROM reserve_buffer
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(reserve)
    }

    /// Fold one cycle's results into the aggregate: reserve grows by the
    /// net profit paid out, AUM is replaced with the fresh recomputation.
    /// Single statement, so both numbers move together or not at all.
    pub async fn apply_cycle(
        &self,
        total_aum: Decimal,
        profit_delta: Decimal,
    ) -> RepoResult<ReserveBuffer> {
        let reserve = sqlx::query_as::<_, ReserveBuffer>(
            r#"
            UPDATE reserve_buffer
            SET current_amount = current_amount + $1, total_aum = $2, updated_at = NOW()
            WHERE id = 1
            RETURNING id, current_amount, total_aum, updated_at
            "#,
        )
        .bind(profit_delta)
        .bind(total_aum)
        .fetch_one(&self.pool)
        .await?;

        Ok(reserve)
    }
}
