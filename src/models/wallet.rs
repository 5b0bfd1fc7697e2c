//! Wallet and movement-log models for fund tracking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-currency balance owned by a user. One row per (owner, currency);
/// mutated only through ledger operations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub currency: String,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Direction of a ledger movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    Credit,
    Debit,
}

impl MovementDirection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

/// Workflow that caused a movement; the basis for idempotency checks and
/// auditing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementSource {
    Deposit,
    WithdrawalRequest,
    InvestmentCreation,
    ProfitCredit,
    PrincipalReturn,
    ReferralCredit,
    Rollback,
}

impl MovementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::WithdrawalRequest => "withdrawal_request",
            Self::InvestmentCreation => "investment_creation",
            Self::ProfitCredit => "profit_credit",
            Self::PrincipalReturn => "principal_return",
            Self::ReferralCredit => "referral_credit",
            Self::Rollback => "rollback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "withdrawal_request" => Some(Self::WithdrawalRequest),
            "investment_creation" => Some(Self::InvestmentCreation),
            "profit_credit" => Some(Self::ProfitCredit),
            "principal_return" => Some(Self::PrincipalReturn),
            "referral_credit" => Some(Self::ReferralCredit),
            "rollback" => Some(Self::Rollback),
            _ => None,
        }
    }
}

/// Append-only ledger entry; immutable once written. A wallet's balance is
/// always the sum of its credits minus the sum of its debits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletMovement {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Decimal,
    pub direction: String,
    pub source_kind: String,
    pub reference: Option<String>,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

impl WalletMovement {
    pub fn direction(&self) -> Option<MovementDirection> {
        MovementDirection::from_str(&self.direction)
    }

    pub fn source(&self) -> Option<MovementSource> {
        MovementSource::from_str(&self.source_kind)
    }

    /// Signed contribution of this movement to the wallet balance
    pub fn signed_amount(&self) -> Decimal {
        match self.direction() {
            Some(MovementDirection::Debit) => -self.amount,
            _ => self.amount,
        }
    }
}
