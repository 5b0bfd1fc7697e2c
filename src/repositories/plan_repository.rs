//! Read-mostly repository over the plan catalog

use crate::error::RepoResult;
use crate::models::Plan;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a plan (catalog administration and test fixtures)
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        slug: &str,
        name: &str,
        tier: &str,
        min_amount: Decimal,
        max_amount: Decimal,
        duration_days: i32,
        return_percentage: Decimal,
        payout_frequency: &str,
        allocations: &serde_json::Value,
    ) -> RepoResult<Plan> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans
            (slug, name, tier, min_amount, max_amount, duration_days, return_percentage, payout_frequency, allocations)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, slug, name, tier, min_amount, max_amount, duration_days,
                      return_percentage, payout_frequency, allocations, created_at
            "#,
        )
        .bind(slug)
        .bind(name)
        .bind(tier)
        .bind(min_amount)
        .bind(max_amount)
        .bind(duration_days)
        .bind(return_percentage)
        .bind(payout_frequency)
        .bind(allocations)
        .fetch_one(&self.pool)
        .await?;

        Ok(plan)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, slug, name, tier, min_amount, max_amount, duration_days,
                   return_percentage, payout_frequency, allocations, created_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, slug, name, tier, min_amount, max_amount, duration_days,
                   return_percentage, payout_frequency, allocations, created_at
            FROM plans
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    /// Resolve a plan by id, slug, or display name (in that order)
    pub async fn resolve(&self, identifier: &str) -> RepoResult<Option<Plan>> {
        if let Ok(id) = identifier.parse::<Uuid>() {
            if let Some(plan) = self.find_by_id(id).await? {
                return Ok(Some(plan));
            }
        }

        if let Some(plan) = self.find_by_slug(&identifier.to_lowercase()).await? {
            return Ok(Some(plan));
        }

        let plan = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, slug, name, tier, min_amount, max_amount, duration_days,
                   return_percentage, payout_frequency, allocations, created_at
            FROM plans
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    pub async fn list(&self) -> RepoResult<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, slug, name, tier, min_amount, max_amount, duration_days,
                   return_percentage, payout_frequency, allocations, created_at
            FROM plans
            ORDER BY min_amount
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }
}
