use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Slim local identity row. Session management lives elsewhere; this record
/// exists because the referral cascade needs `referrer_id` and the cycle's
/// KYC gate needs an approval bit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub referrer_id: Option<Uuid>,
    pub kyc_approved: bool,
    pub created_at: DateTime<Utc>,
}
