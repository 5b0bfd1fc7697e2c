//! Deposit, withdrawal, and statement operations over the wallet ledger.

use crate::error::{AppError, AppResult};
use crate::fx::CurrencyConverter;
use crate::models::{
    MovementSource, Transaction, TransactionStatus, TransactionType, Wallet, WalletMovement,
};
use crate::repositories::{TransactionRepository, WalletRepository};
use crate::services::notify::{Notification, NotificationDispatcher, NotificationKind};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct WalletService {
    wallet_repo: Arc<WalletRepository>,
    transaction_repo: Arc<TransactionRepository>,
    fx: CurrencyConverter,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl WalletService {
    pub fn new(
        wallet_repo: Arc<WalletRepository>,
        transaction_repo: Arc<TransactionRepository>,
        fx: CurrencyConverter,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            wallet_repo,
            transaction_repo,
            fx,
            notifier,
        }
    }

    /// Credit a confirmed deposit from the payment provider
    pub async fn record_deposit(
        &self,
        owner_id: Uuid,
        amount: Decimal,
        currency: &str,
        provider_reference: &str,
    ) -> AppResult<Wallet> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "Deposit amount must be positive, got {}",
                amount
            )));
        }
        if !self.fx.is_supported(currency) {
            return Err(AppError::UnknownCurrency(currency.to_string()));
        }

        let wallet = self
            .wallet_repo
            .credit(
                owner_id,
                currency,
                amount,
                MovementSource::Deposit,
                Some(provider_reference),
                "provider",
            )
            .await
            .map_err(AppError::from)?;

        self.transaction_repo
            .record(
                owner_id,
                None,
                TransactionType::Deposit,
                amount,
                &wallet.currency,
                TransactionStatus::Completed,
                serde_json::json!({ "kind": "deposit", "provider_reference": provider_reference }),
            )
            .await
            .map_err(AppError::from)?;

        self.notifier
            .dispatch(
                owner_id,
                Notification::new(
                    NotificationKind::DepositReceived,
                    "Deposit received",
                    format!("{} {} credited to your wallet", amount, wallet.currency),
                ),
            )
            .await;

        info!(
            "Deposit {} {} credited for {}",
            amount, wallet.currency, owner_id
        );

        Ok(wallet)
    }

    /// Debit a withdrawal request; the payout itself settles on external
    /// rails, so the statement entry stays PENDING here
    pub async fn request_withdrawal(
        &self,
        owner_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> AppResult<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "Withdrawal amount must be positive, got {}",
                amount
            )));
        }
        if !self.fx.is_supported(currency) {
            return Err(AppError::UnknownCurrency(currency.to_string()));
        }

        let wallet = self
            .wallet_repo
            .debit(
                owner_id,
                currency,
                amount,
                MovementSource::WithdrawalRequest,
                None,
                "system",
            )
            .await
            .map_err(AppError::from)?;

        let transaction = self
            .transaction_repo
            .record(
                owner_id,
                None,
                TransactionType::Withdrawal,
                amount,
                &wallet.currency,
                TransactionStatus::Pending,
                serde_json::json!({ "kind": "withdrawal_request" }),
            )
            .await
            .map_err(AppError::from)?;

        self.notifier
            .dispatch(
                owner_id,
                Notification::new(
                    NotificationKind::WithdrawalRequested,
                    "Withdrawal requested",
                    format!("{} {} withdrawal is being processed", amount, wallet.currency),
                ),
            )
            .await;

        Ok(transaction)
    }

    /// Purchasing power across every wallet the owner holds, in USD
    pub async fn total_available_usd(&self, owner_id: Uuid) -> AppResult<Decimal> {
        let wallets = self
            .wallet_repo
            .find_by_owner(owner_id)
            .await
            .map_err(AppError::from)?;

        let mut total = Decimal::ZERO;
        for wallet in &wallets {
            total += self.fx.to_base(wallet.balance, &wallet.currency)?;
        }

        Ok(total)
    }

    pub async fn balance_of(&self, owner_id: Uuid, currency: &str) -> AppResult<Decimal> {
        Ok(self
            .wallet_repo
            .balance_of(owner_id, currency)
            .await
            .map_err(AppError::from)?)
    }

    pub async fn statement(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<Transaction>> {
        Ok(self
            .transaction_repo
            .history_for(owner_id, limit)
            .await
            .map_err(AppError::from)?)
    }

    pub async fn movements(&self, wallet_id: Uuid, limit: i64) -> AppResult<Vec<WalletMovement>> {
        Ok(self
            .wallet_repo
            .movements_for(wallet_id, limit)
            .await
            .map_err(AppError::from)?)
    }
}
