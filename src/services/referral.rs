//! Referral bonus cascade, invoked once per credited profit event.

use crate::error::{AppError, AppResult};
use crate::models::{
    InvestmentPosition, MovementSource, Plan, PlanTier, TransactionStatus, TransactionType,
};
use crate::repositories::{TransactionRepository, UserRepository, WalletRepository};
use crate::services::audit::AuditTrailService;
use crate::services::notify::{Notification, NotificationDispatcher, NotificationKind};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Fraction of each net profit credit paid to the referrer, by plan tier
pub fn tier_rate(tier: PlanTier) -> Decimal {
    match tier {
        PlanTier::Starter => Decimal::new(3, 2), // 0.03
        PlanTier::Growth => Decimal::new(5, 2),  // 0.05
        PlanTier::Pro => Decimal::new(7, 2),     // 0.07
    }
}

pub struct ReferralService {
    user_repo: Arc<UserRepository>,
    wallet_repo: Arc<WalletRepository>,
    transaction_repo: Arc<TransactionRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Option<Arc<AuditTrailService>>,
}

impl ReferralService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        wallet_repo: Arc<WalletRepository>,
        transaction_repo: Arc<TransactionRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            user_repo,
            wallet_repo,
            transaction_repo,
            notifier,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditTrailService>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Credit the owner's referrer for a profit event. Returns the bonus
    /// paid, or None when no referrer is set or the bonus rounds to zero.
    pub async fn on_profit_credited(
        &self,
        position: &InvestmentPosition,
        plan: &Plan,
        net_amount: Decimal,
    ) -> AppResult<Option<Decimal>> {
        let Some(referrer_id) = self
            .user_repo
            .referrer_of(position.owner_id)
            .await
            .map_err(AppError::from)?
        else {
            return Ok(None);
        };

        let bonus = (net_amount * tier_rate(plan.tier())).round_dp(crate::fx::MONEY_SCALE);
        if bonus <= Decimal::ZERO {
            return Ok(None);
        }

        self.wallet_repo
            .credit(
                referrer_id,
                "USD",
                bonus,
                MovementSource::ReferralCredit,
                Some(&format!("investment:{}", position.id)),
                "system",
            )
            .await
            .map_err(AppError::from)?;

        self.transaction_repo
            .record(
                referrer_id,
                Some(position.id),
                TransactionType::Transfer,
                bonus,
                "USD",
                TransactionStatus::Completed,
                serde_json::json!({
                    "kind": "referral_bonus",
                    "referred_user": position.owner_id,
                    "tier": plan.tier,
                }),
            )
            .await
            .map_err(AppError::from)?;

        self.notifier
            .dispatch(
                referrer_id,
                Notification::new(
                    NotificationKind::ReferralBonus,
                    "Referral bonus credited",
                    format!("You earned a {} USD referral bonus", bonus),
                ),
            )
            .await;

        if let Some(audit) = &self.audit {
            audit
                .log_referral_credited(referrer_id, position.id, bonus)
                .await?;
        }

        info!(
            "Referral bonus {} USD credited to {} for investment {}",
            bonus, referrer_id, position.id
        );

        Ok(Some(bonus))
    }
}
