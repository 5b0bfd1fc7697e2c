//! Investment creation workflow.
//!
//! One purchase may be funded from several of the owner's wallets across
//! currencies. There is no global lock around the sequence; each wallet
//! debit is individually atomic, and completed debits are recorded so the
//! whole sequence can be compensated in reverse if a later step fails.

use crate::error::{AppError, AppResult};
use crate::fx::{CurrencyConverter, MONEY_SCALE};
use crate::models::{
    InvestmentPosition, MovementSource, Plan, PositionStatus, TransactionStatus, TransactionType,
    Wallet,
};
use crate::repositories::{
    InvestmentRepository, PlanRepository, TransactionRepository, WalletRepository,
};
use crate::services::audit::AuditTrailService;
use crate::services::notify::{Notification, NotificationDispatcher, NotificationKind};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Terminal status of a creation request. PENDING is a valid outcome, not
/// an error: it tells the caller to prompt for a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    Active,
    Pending,
}

/// Shortfall detail returned with a PENDING outcome
#[derive(Debug, Clone, PartialEq)]
pub struct FundingDiagnostics {
    pub available_usd: Decimal,
    pub requested_usd: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub status: CreateStatus,
    pub position: InvestmentPosition,
    pub diagnostics: Option<FundingDiagnostics>,
}

/// One wallet's share of a funding sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDebit {
    pub wallet_id: Uuid,
    pub currency: String,
    pub native_amount: Decimal,
    pub usd_amount: Decimal,
}

/// Decide which wallets fund a purchase and by how much. Preference order:
/// the request currency, then USD, then the rest by descending USD value.
/// Pure over its inputs so the ordering and conservation properties are
/// testable without storage.
pub fn plan_funding(
    wallets: &[Wallet],
    request_currency: &str,
    amount_usd: Decimal,
    fx: &CurrencyConverter,
) -> AppResult<Vec<PlannedDebit>> {
    let request_currency = request_currency.to_uppercase();

    let mut valued: Vec<(&Wallet, Decimal)> = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        if wallet.balance <= Decimal::ZERO {
            continue;
        }
        valued.push((wallet, fx.to_base(wallet.balance, &wallet.currency)?));
    }

    let rank = |w: &Wallet| {
        if w.currency == request_currency {
            0
        } else if w.currency == "USD" {
            1
        } else {
            2
        }
    };
    valued.sort_by(|(a, a_usd), (b, b_usd)| rank(a).cmp(&rank(b)).then(b_usd.cmp(a_usd)));

    let mut debits = Vec::new();
    let mut remaining = amount_usd;

    for (wallet, usd_value) in valued {
        if remaining <= Decimal::ZERO {
            break;
        }

        let (native, usd) = if usd_value >= remaining {
            (fx.from_base(remaining, &wallet.currency)?, remaining)
        } else {
            (wallet.balance, usd_value)
        };

        if native <= Decimal::ZERO {
            continue;
        }

        debits.push(PlannedDebit {
            wallet_id: wallet.id,
            currency: wallet.currency.clone(),
            native_amount: native.round_dp(MONEY_SCALE),
            usd_amount: usd,
        });
        remaining -= usd;
    }

    if remaining > Decimal::new(1, MONEY_SCALE) {
        return Err(AppError::InsufficientFunds {
            available: amount_usd - remaining,
            requested: amount_usd,
        });
    }

    Ok(debits)
}

pub struct InvestmentService {
    plan_repo: Arc<PlanRepository>,
    wallet_repo: Arc<WalletRepository>,
    investment_repo: Arc<InvestmentRepository>,
    transaction_repo: Arc<TransactionRepository>,
    fx: CurrencyConverter,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Option<Arc<AuditTrailService>>,
}

impl InvestmentService {
    pub fn new(
        plan_repo: Arc<PlanRepository>,
        wallet_repo: Arc<WalletRepository>,
        investment_repo: Arc<InvestmentRepository>,
        transaction_repo: Arc<TransactionRepository>,
        fx: CurrencyConverter,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            plan_repo,
            wallet_repo,
            investment_repo,
            transaction_repo,
            fx,
            notifier,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditTrailService>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Create an investment position, debiting the owner's wallets to fund
    /// it. Insufficient funds produce a PENDING position rather than an
    /// error; storage failures mid-sequence are compensated before they
    /// surface.
    pub async fn create_investment(
        &self,
        owner_id: Uuid,
        plan_identifier: &str,
        amount: Decimal,
        currency: &str,
    ) -> AppResult<CreateOutcome> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "Investment amount must be positive, got {}",
                amount
            )));
        }

        let plan = self
            .plan_repo
            .resolve(plan_identifier)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::PlanNotFound(plan_identifier.to_string()))?;

        let amount_usd = self.fx.to_base(amount, currency)?;
        if !plan.accepts_amount(amount_usd) {
            return Err(AppError::AmountOutOfRange {
                requested: amount_usd,
                min: plan.min_amount,
                max: plan.max_amount,
            });
        }

        let wallets = self
            .wallet_repo
            .find_by_owner(owner_id)
            .await
            .map_err(AppError::from)?;

        let mut available_usd = Decimal::ZERO;
        for wallet in &wallets {
            available_usd += self.fx.to_base(wallet.balance, &wallet.currency)?;
        }

        if available_usd < amount_usd {
            return self
                .create_pending(owner_id, &plan, amount_usd, available_usd, currency)
                .await;
        }

        let funding = plan_funding(&wallets, currency, amount_usd, &self.fx)?;

        // Saga: execute the debit sequence, remembering every completed
        // step so it can be compensated in reverse.
        let mut completed: Vec<PlannedDebit> = Vec::with_capacity(funding.len());
        for debit in &funding {
            let result = self
                .wallet_repo
                .debit(
                    owner_id,
                    &debit.currency,
                    debit.native_amount,
                    MovementSource::InvestmentCreation,
                    Some(&format!("plan:{}", plan.slug)),
                    "system",
                )
                .await;

            match result {
                Ok(_) => completed.push(debit.clone()),
                Err(e) => {
                    self.compensate_debits(owner_id, &completed).await;
                    return Err(AppError::transaction_failed("wallet_debit", e.into()));
                }
            }
        }

        let position = match self
            .investment_repo
            .create(
                owner_id,
                plan.id,
                amount_usd,
                PositionStatus::Active,
                Utc::now(),
            )
            .await
        {
            Ok(position) => position,
            Err(e) => {
                self.compensate_debits(owner_id, &completed).await;
                return Err(AppError::transaction_failed("position_create", e.into()));
            }
        };

        if let Err(e) = self
            .transaction_repo
            .record(
                owner_id,
                Some(position.id),
                TransactionType::Transfer,
                amount_usd,
                "USD",
                TransactionStatus::Completed,
                serde_json::json!({
                    "kind": "investment_funding",
                    "plan": plan.slug,
                    "request_amount": amount,
                    "request_currency": currency.to_uppercase(),
                }),
            )
            .await
        {
            if let Err(delete_err) = self.investment_repo.delete(position.id).await {
                error!(
                    "Compensation failed: could not remove position {}: {}",
                    position.id, delete_err
                );
            }
            self.compensate_debits(owner_id, &completed).await;
            return Err(AppError::transaction_failed("funding_transaction", e.into()));
        }

        self.notifier
            .dispatch(
                owner_id,
                Notification::new(
                    NotificationKind::PositionActivated,
                    "Investment activated",
                    format!(
                        "Your {} USD position in the {} plan is now active",
                        amount_usd, plan.name
                    ),
                ),
            )
            .await;

        if let Some(audit) = &self.audit {
            audit.log_investment_created(&position, &plan.slug).await?;
        }

        info!(
            "Investment {} activated: {} USD across {} wallet(s)",
            position.id,
            amount_usd,
            completed.len()
        );

        Ok(CreateOutcome {
            status: CreateStatus::Active,
            position,
            diagnostics: None,
        })
    }

    async fn create_pending(
        &self,
        owner_id: Uuid,
        plan: &Plan,
        amount_usd: Decimal,
        available_usd: Decimal,
        request_currency: &str,
    ) -> AppResult<CreateOutcome> {
        let position = self
            .investment_repo
            .create(
                owner_id,
                plan.id,
                amount_usd,
                PositionStatus::Pending,
                Utc::now(),
            )
            .await
            .map_err(AppError::from)?;

        self.transaction_repo
            .record(
                owner_id,
                Some(position.id),
                TransactionType::Transfer,
                amount_usd,
                "USD",
                TransactionStatus::Pending,
                serde_json::json!({
                    "kind": "investment_funding",
                    "plan": plan.slug,
                    "available_usd": available_usd,
                    "request_currency": request_currency.to_uppercase(),
                }),
            )
            .await
            .map_err(AppError::from)?;

        if let Some(audit) = &self.audit {
            audit.log_investment_created(&position, &plan.slug).await?;
        }

        info!(
            "Investment {} pending: available {} USD < requested {} USD",
            position.id, available_usd, amount_usd
        );

        Ok(CreateOutcome {
            status: CreateStatus::Pending,
            position,
            diagnostics: Some(FundingDiagnostics {
                available_usd,
                requested_usd: amount_usd,
            }),
        })
    }

    /// Credit back every completed debit, most recent first. A failed
    /// compensation is logged loudly and the remaining refunds still run;
    /// it must never be silently swallowed.
    pub async fn compensate_debits(&self, owner_id: Uuid, completed: &[PlannedDebit]) {
        for debit in completed.iter().rev() {
            let result = self
                .wallet_repo
                .credit(
                    owner_id,
                    &debit.currency,
                    debit.native_amount,
                    MovementSource::Rollback,
                    Some(&format!("wallet:{}", debit.wallet_id)),
                    "system",
                )
                .await;

            if let Err(e) = result {
                error!(
                    "Rollback credit of {} {} to wallet {} failed, manual reconciliation required: {}",
                    debit.native_amount, debit.currency, debit.wallet_id, e
                );
            } else {
                warn!(
                    "Rolled back {} {} to wallet {}",
                    debit.native_amount, debit.currency, debit.wallet_id
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet(currency: &str, balance: Decimal) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            currency: currency.to_string(),
            balance,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_funding_prefers_request_currency_then_usd() {
        let fx = CurrencyConverter::default();
        let wallets = vec![
            wallet("USD", dec!(500)),
            wallet("EUR", dec!(500)),
            wallet("GBP", dec!(500)),
        ];

        let plan = plan_funding(&wallets, "EUR", dec!(100), &fx).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].currency, "EUR");

        // Exhausts EUR (545 USD) first, then falls to USD
        let plan = plan_funding(&wallets, "EUR", dec!(600), &fx).unwrap();
        assert_eq!(plan[0].currency, "EUR");
        assert_eq!(plan[1].currency, "USD");
    }

    #[test]
    fn test_funding_orders_remaining_by_usd_value() {
        let fx = CurrencyConverter::default();
        let wallets = vec![
            wallet("EUR", dec!(10)),  // 10.90 USD
            wallet("GBP", dec!(100)), // 127 USD
        ];

        let plan = plan_funding(&wallets, "USD", dec!(130), &fx).unwrap();
        assert_eq!(plan[0].currency, "GBP");
        assert_eq!(plan[1].currency, "EUR");
    }

    #[test]
    fn test_funding_conserves_value() {
        let fx = CurrencyConverter::default();
        let wallets = vec![
            wallet("EUR", dec!(40)),
            wallet("USD", dec!(30)),
            wallet("GBP", dec!(50)),
        ];

        let amount = dec!(100);
        let plan = plan_funding(&wallets, "EUR", amount, &fx).unwrap();

        let mut total_usd = Decimal::ZERO;
        for debit in &plan {
            total_usd += fx.to_base(debit.native_amount, &debit.currency).unwrap();
        }
        assert!(
            (total_usd - amount).abs() <= dec!(0.000001),
            "funded {total_usd} for requested {amount}"
        );
    }

    #[test]
    fn test_funding_skips_empty_wallets() {
        let fx = CurrencyConverter::default();
        let wallets = vec![wallet("EUR", Decimal::ZERO), wallet("USD", dec!(200))];

        let plan = plan_funding(&wallets, "EUR", dec!(100), &fx).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].currency, "USD");
    }

    #[test]
    fn test_funding_insufficient_total_errors() {
        let fx = CurrencyConverter::default();
        let wallets = vec![wallet("USD", dec!(50))];

        let err = plan_funding(&wallets, "USD", dec!(100), &fx).unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds { .. }));
    }
}
