//! Repository for wallet balances and the append-only movement log

use crate::error::{RepoResult, RepositoryError};
use crate::models::{MovementDirection, MovementSource, Wallet, WalletMovement};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get or create a wallet for an (owner, currency) pair
    pub async fn find_or_create(&self, owner_id: Uuid, currency: &str) -> RepoResult<Wallet> {
        let currency = currency.to_uppercase();

        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (owner_id, currency, balance)
            VALUES ($1, $2, 0)
            ON CONFLICT (owner_id, currency) DO UPDATE SET updated_at = NOW()
            RETURNING id, owner_id, currency, balance, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// All wallets held by an owner
    pub async fn find_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Wallet>> {
        let wallets = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, owner_id, currency, balance, updated_at
            FROM wallets
            WHERE owner_id = $1
            ORDER BY currency
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(wallets)
    }

    /// Balance for an (owner, currency) pair; absence is not an error and
    /// reads as zero
    pub async fn balance_of(&self, owner_id: Uuid, currency: &str) -> RepoResult<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT balance FROM wallets
            WHERE owner_id = $1 AND currency = $2
            "#,
        )
        .bind(owner_id)
        .bind(currency.to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    /// Credit a wallet, creating it if absent. The balance update and the
    /// movement insert commit as one transaction.
    pub async fn credit(
        &self,
        owner_id: Uuid,
        currency: &str,
        amount: Decimal,
        source: MovementSource,
        reference: Option<&str>,
        performed_by: &str,
    ) -> RepoResult<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(RepositoryError::InvalidInput(format!(
                "Credit amount must be positive, got {}",
                amount
            )));
        }

        let currency = currency.to_uppercase();
        let mut tx = self.pool.begin().await?;

        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (owner_id, currency, balance)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, currency) DO UPDATE
            SET balance = wallets.balance + $3, updated_at = NOW()
            RETURNING id, owner_id, currency, balance, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&currency)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_movements (wallet_id, amount, direction, source_kind, reference, performed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(wallet.id)
        .bind(amount)
        .bind(MovementDirection::Credit.as_str())
        .bind(source.as_str())
        .bind(reference)
        .bind(performed_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(wallet)
    }

    /// Debit a wallet. The balance is re-read under a row lock immediately
    /// before mutation; insufficiency is rejected before anything changes.
    pub async fn debit(
        &self,
        owner_id: Uuid,
        currency: &str,
        amount: Decimal,
        source: MovementSource,
        reference: Option<&str>,
        performed_by: &str,
    ) -> RepoResult<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(RepositoryError::InvalidInput(format!(
                "Debit amount must be positive, got {}",
                amount
            )));
        }

        let currency = currency.to_uppercase();
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, owner_id, currency, balance, updated_at
            FROM wallets
            WHERE owner_id = $1 AND currency = $2
            FOR UPDATE
            "#,
        )
        .bind(owner_id)
        .bind(&currency)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Err(RepositoryError::InsufficientFunds {
                available: Decimal::ZERO,
                requested: amount,
            });
        };

        if current.balance < amount {
            return Err(RepositoryError::InsufficientFunds {
                available: current.balance,
                requested: amount,
            });
        }

        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            UPDATE wallets
            SET balance = balance - $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, currency, balance, updated_at
            "#,
        )
        .bind(current.id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_movements (wallet_id, amount, direction, source_kind, reference, performed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(wallet.id)
        .bind(amount)
        .bind(MovementDirection::Debit.as_str())
        .bind(source.as_str())
        .bind(reference)
        .bind(performed_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(wallet)
    }

    /// Movement history for a wallet, most recent first
    pub async fn movements_for(&self, wallet_id: Uuid, limit: i64) -> RepoResult<Vec<WalletMovement>> {
        let movements = sqlx::query_as::<_, WalletMovement>(
            r#"
            SELECT id, wallet_id, amount, direction, source_kind, reference, performed_by, created_at
            FROM wallet_movements
            WHERE wallet_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}
