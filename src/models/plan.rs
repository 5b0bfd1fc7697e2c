use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Plan tier, which also keys the referral bonus rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Starter,
    Growth,
    Pro,
}

impl PlanTier {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "starter" => Ok(PlanTier::Starter),
            "growth" => Ok(PlanTier::Growth),
            "pro" => Ok(PlanTier::Pro),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Starter => "starter",
            PlanTier::Growth => "growth",
            PlanTier::Pro => "pro",
        }
    }
}

/// How often an active position pays out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutFrequency {
    Weekly,
    Monthly,
    Daily,
}

impl PayoutFrequency {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(PayoutFrequency::Weekly),
            "monthly" => Ok(PayoutFrequency::Monthly),
            "daily" => Ok(PayoutFrequency::Daily),
            _ => Err(format!("Invalid payout frequency: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutFrequency::Weekly => "weekly",
            PayoutFrequency::Monthly => "monthly",
            PayoutFrequency::Daily => "daily",
        }
    }

    /// Length of one payout period
    pub fn period_days(&self) -> i64 {
        match self {
            PayoutFrequency::Weekly => 7,
            PayoutFrequency::Monthly => 30,
            PayoutFrequency::Daily => 1,
        }
    }
}

/// Immutable plan terms a position is created against. `allocations` maps
/// revenue-stream names to percentages summing to 100; an empty map means
/// the plan pays the flat `return_percentage`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub tier: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub duration_days: i32,
    pub return_percentage: Decimal,
    pub payout_frequency: String,
    pub allocations: Value,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn tier(&self) -> PlanTier {
        PlanTier::from_str(&self.tier).unwrap_or(PlanTier::Starter)
    }

    pub fn frequency(&self) -> PayoutFrequency {
        PayoutFrequency::from_str(&self.payout_frequency).unwrap_or(PayoutFrequency::Weekly)
    }

    /// Parse the JSONB allocation map. Values may be stored as numbers or
    /// numeric strings.
    pub fn allocations_map(&self) -> HashMap<String, Decimal> {
        let Some(object) = self.allocations.as_object() else {
            return HashMap::new();
        };

        object
            .iter()
            .filter_map(|(stream, value)| {
                let pct = match value {
                    Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
                    Value::String(s) => s.parse::<Decimal>().ok(),
                    _ => None,
                }?;
                Some((stream.clone(), pct))
            })
            .collect()
    }

    /// Plans with stream allocations earn a weighted rate from the
    /// performance feed instead of the flat rate.
    pub fn is_stream_weighted(&self) -> bool {
        !self.allocations_map().is_empty()
    }

    /// Inclusive range check against plan bounds, in USD.
    pub fn accepts_amount(&self, amount_usd: Decimal) -> bool {
        amount_usd >= self.min_amount && amount_usd <= self.max_amount
    }
}
