//! Vestra Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod config;
pub mod database;
pub mod error;
pub mod fx;
pub mod models;
pub mod repositories;
pub mod roi;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use std::sync::Arc;

/// Application state containing all repositories
pub struct AppState {
    pub database: Database,
    pub user_repo: Arc<UserRepository>,
    pub plan_repo: Arc<PlanRepository>,
    pub wallet_repo: Arc<WalletRepository>,
    pub investment_repo: Arc<InvestmentRepository>,
    pub profit_log_repo: Arc<ProfitLogRepository>,
    pub transaction_repo: Arc<TransactionRepository>,
    pub reserve_repo: Arc<ReserveRepository>,
}

impl AppState {
    /// Create a new AppState with initialized repositories
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());

        Self {
            database: database.clone(),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            plan_repo: Arc::new(PlanRepository::new(pool.clone())),
            wallet_repo: Arc::new(WalletRepository::new(pool.clone())),
            investment_repo: Arc::new(InvestmentRepository::new(pool.clone())),
            profit_log_repo: Arc::new(ProfitLogRepository::new(pool.clone())),
            transaction_repo: Arc::new(TransactionRepository::new(pool.clone())),
            reserve_repo: Arc::new(ReserveRepository::new(pool)),
        }
    }
}
