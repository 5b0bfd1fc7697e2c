//! Repository for user-facing statement records

use crate::error::RepoResult;
use crate::models::{Transaction, TransactionStatus, TransactionType};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        owner_id: Uuid,
        investment_id: Option<Uuid>,
        tx_type: TransactionType,
        amount: Decimal,
        currency: &str,
        status: TransactionStatus,
        reference: serde_json::Value,
    ) -> RepoResult<Transaction> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (owner_id, investment_id, tx_type, amount, currency, status, reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_id, investment_id, tx_type, amount, currency, status, reference, created_at
            "#,
        )
        .bind(owner_id)
        .bind(investment_id)
        .bind(tx_type.as_str())
        .bind(amount)
        .bind(currency)
        .bind(status.as_str())
        .bind(reference)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Statement history for a user, most recent first
    pub async fn history_for(&self, owner_id: Uuid, limit: i64) -> RepoResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, investment_id, tx_type, amount, currency, status, reference, created_at
            FROM transactions
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn find_by_investment(&self, investment_id: Uuid) -> RepoResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, investment_id, tx_type, amount, currency, status, reference, created_at
            FROM transactions
            WHERE investment_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(investment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Whether principal has already been released for a position. Guards
    /// the maturity credit against replays across cycle runs.
    pub async fn principal_release_exists(&self, investment_id: Uuid) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM transactions
                WHERE investment_id = $1
                  AND tx_type = 'transfer'
                  AND reference->>'kind' = 'principal_release'
            )
            "#,
        )
        .bind(investment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
