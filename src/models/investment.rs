use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Position lifecycle. `Pending` positions hold no funds and wait for a
/// deposit; `Matured` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Pending,
    Active,
    Matured,
}

impl PositionStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PositionStatus::Pending),
            "active" => Ok(PositionStatus::Active),
            "matured" => Ok(PositionStatus::Matured),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Pending => "pending",
            PositionStatus::Active => "active",
            PositionStatus::Matured => "matured",
        }
    }
}

impl From<String> for PositionStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(PositionStatus::Pending)
    }
}

impl From<PositionStatus> for String {
    fn from(status: PositionStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Fixed-term claim created when a user commits principal to a plan.
/// Principal is held in USD regardless of which wallets funded it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvestmentPosition {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plan_id: Uuid,
    pub principal: Decimal,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InvestmentPosition {
    pub fn status(&self) -> PositionStatus {
        PositionStatus::from_str(&self.status).unwrap_or(PositionStatus::Pending)
    }

    pub fn is_active(&self) -> bool {
        self.status() == PositionStatus::Active
    }
}
