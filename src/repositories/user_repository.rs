use crate::error::RepoResult;
use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(&self, email: &str, referrer_id: Option<Uuid>) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, referrer_id)
            VALUES ($1, $2)
            RETURNING id, email, referrer_id, kyc_approved, created_at
            "#,
        )
        .bind(email)
        .bind(referrer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, referrer_id, kyc_approved, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// The referrer of a user, if one is set
    pub async fn referrer_of(&self, id: Uuid) -> RepoResult<Option<Uuid>> {
        let referrer = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT referrer_id FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(referrer.flatten())
    }

    /// Flip the KYC approval bit (admin workflow lands here)
    pub async fn set_kyc_approved(&self, id: Uuid, approved: bool) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET kyc_approved = $2
            WHERE id = $1
            RETURNING id, email, referrer_id, kyc_approved, created_at
            "#,
        )
        .bind(id)
        .bind(approved)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
