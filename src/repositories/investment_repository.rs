//! Repository for investment positions

use crate::error::{RepoResult, RepositoryError};
use crate::models::{InvestmentPosition, PositionStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct InvestmentRepository {
    pool: PgPool,
}

impl InvestmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        plan_id: Uuid,
        principal: Decimal,
        status: PositionStatus,
        start_date: DateTime<Utc>,
    ) -> RepoResult<InvestmentPosition> {
        let position = sqlx::query_as::<_, InvestmentPosition>(
            r#"
            INSERT INTO investment_positions (owner_id, plan_id, principal, status, start_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, plan_id, principal, status, start_date, created_at
            "#,
        )
        .bind(owner_id)
        .bind(plan_id)
        .bind(principal)
        .bind(status.as_str())
        .bind(start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(position)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<InvestmentPosition>> {
        let position = sqlx::query_as::<_, InvestmentPosition>(
            r#"
            SELECT id, owner_id, plan_id, principal, status, start_date, created_at
            FROM investment_positions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(position)
    }

    pub async fn find_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<InvestmentPosition>> {
        let positions = sqlx::query_as::<_, InvestmentPosition>(
            r#"
            SELECT id, owner_id, plan_id, principal, status, start_date, created_at
            FROM investment_positions
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(positions)
    }

    /// All positions the distribution cycle must visit
    pub async fn find_active(&self) -> RepoResult<Vec<InvestmentPosition>> {
        let positions = sqlx::query_as::<_, InvestmentPosition>(
            r#"
            SELECT id, owner_id, plan_id, principal, status, start_date, created_at
            FROM investment_positions
            WHERE status = 'active'
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(positions)
    }

    /// Transition an active position to matured. Guarded on the current
    /// status so a concurrent cycle cannot mature the same position twice.
    pub async fn mark_matured(&self, id: Uuid) -> RepoResult<InvestmentPosition> {
        let position = sqlx::query_as::<_, InvestmentPosition>(
            r#"
            UPDATE investment_positions
            SET status = 'matured'
            WHERE id = $1 AND status = 'active'
            RETURNING id, owner_id, plan_id, principal, status, start_date, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        position.ok_or_else(|| {
            RepositoryError::NotFound(format!("Active position {} not found", id))
        })
    }

    /// Saga compensation only: remove a position whose funding sequence
    /// could not be completed.
    pub async fn delete(&self, id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM investment_positions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Live sum of principal across active positions (assets under
    /// management), recomputed fresh rather than tracked incrementally
    pub async fn active_principal_sum(&self) -> RepoResult<Decimal> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(principal), 0)
            FROM investment_positions
            WHERE status = 'active'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }
}
