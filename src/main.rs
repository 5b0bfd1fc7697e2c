//! Vestra Backend Service
//!
//! Main entry point for the Vestra investment platform backend.
//! This service provides:
//! - The investment ledger (wallets, positions, statements)
//! - A scheduled profit-distribution cycle with maturity release
//! - Reserve/AUM accounting behind the published coverage ratio

mod config;
mod database;
mod error;
mod fx;
mod models;
mod repositories;
mod roi;
mod services;

use config::AppConfig;
use database::{create_pool, run_migrations, Database};
use error::{AppError, AppResult};
use fx::{CurrencyConverter, RateTable};
use repositories::*;
use services::{
    ApproveAllKyc, AuditTrailService, DistributionService, InvestmentService, KycStatusProvider,
    LogNotifier, NotificationDispatcher, PerformanceFeed, RecordedKycStatus, ReferralService,
    SnapshotPerformanceFeed, WalletService,
};
use std::sync::Arc;
use tracing::{error, info, warn};

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

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vestra_backend={},sqlx=warn", config.log_level).into()
            }),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Vestra Backend Service Starting                 ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("Service fee: {}%", config.service_fee_pct);
    info!("KYC-gated profits: {}", config.kyc_gate_profits);

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    // Run migrations
    info!("Running database migrations...");
    run_migrations(&pool).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    info!("Initializing core services...");

    // Initialize application state with repositories
    let app_state = Arc::new(AppState::new(pool.clone()));
    info!("✓ Application state initialized with repositories");

    // Currency converter: built-in rate table unless a versioned override
    // file is configured
    let rate_table = match &config.fx_rates_file {
        Some(path) => {
            let table = RateTable::from_json_file(path)?;
            info!("Loaded FX rate table v{} from {}", table.version, path);
            table
        }
        None => RateTable::builtin(),
    };
    let fx = CurrencyConverter::new(rate_table);
    info!(
        "✓ Currency converter initialized (table v{}, {} currencies)",
        fx.table_version(),
        fx.supported_currencies().len()
    );

    // Initialize audit trail service
    let audit_log_dir = std::path::PathBuf::from(&config.audit_log_dir);
    let audit_trail = Arc::new(AuditTrailService::new(audit_log_dir).map_err(|e| {
        error!("Failed to initialize audit trail: {}", e);
        AppError::Message(format!("Audit trail initialization failed: {}", e))
    })?);
    info!("✓ Audit trail service initialized");

    // Notification dispatch and collaborator feeds
    let notifier: Arc<dyn NotificationDispatcher> = Arc::new(LogNotifier);
    let feed: Arc<dyn PerformanceFeed> = Arc::new(SnapshotPerformanceFeed::new());
    let kyc: Arc<dyn KycStatusProvider> = if config.kyc_gate_profits {
        Arc::new(RecordedKycStatus::new(app_state.user_repo.clone()))
    } else {
        Arc::new(ApproveAllKyc)
    };
    info!("✓ Collaborator seams initialized");

    // Initialize wallet service
    let _wallet_service = Arc::new(WalletService::new(
        app_state.wallet_repo.clone(),
        app_state.transaction_repo.clone(),
        fx.clone(),
        notifier.clone(),
    ));
    info!("✓ Wallet service initialized");

    // Initialize investment creation workflow
    let _investment_service = Arc::new(
        InvestmentService::new(
            app_state.plan_repo.clone(),
            app_state.wallet_repo.clone(),
            app_state.investment_repo.clone(),
            app_state.transaction_repo.clone(),
            fx.clone(),
            notifier.clone(),
        )
        .with_audit(audit_trail.clone()),
    );
    info!("✓ Investment service initialized");

    // Initialize referral cascade
    let referral_service = Arc::new(
        ReferralService::new(
            app_state.user_repo.clone(),
            app_state.wallet_repo.clone(),
            app_state.transaction_repo.clone(),
            notifier.clone(),
        )
        .with_audit(audit_trail.clone()),
    );
    info!("✓ Referral service initialized");

    // Initialize distribution cycle
    let distribution_service = Arc::new(
        DistributionService::new(
            app_state.investment_repo.clone(),
            app_state.plan_repo.clone(),
            app_state.wallet_repo.clone(),
            app_state.profit_log_repo.clone(),
            app_state.transaction_repo.clone(),
            app_state.reserve_repo.clone(),
            referral_service.clone(),
            feed.clone(),
            kyc.clone(),
            notifier.clone(),
            config.service_fee_pct,
            config.kyc_gate_profits,
        )
        .with_audit(audit_trail.clone()),
    );
    info!("✓ Distribution service initialized");

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================

    // Start the distribution scheduler (skipped when the interval is 0)
    let scheduler_handle = match config.distribution_interval() {
        Some(interval) => {
            let service = distribution_service.clone();
            let handle = tokio::spawn(async move {
                service.run_forever(interval).await;
            });
            info!("✓ Distribution scheduler started ({:?} interval)", interval);
            Some(handle)
        }
        None => {
            warn!("DISTRIBUTION_INTERVAL_SECS=0 - scheduler not started");
            None
        }
    };

    // =========================================================================
    // READY
    // =========================================================================
    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Vestra Backend Service Ready!                   ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = async {
            if let Some(handle) = scheduler_handle {
                handle.await.ok();
            } else {
                // Never completes if the scheduler is not running
                futures::future::pending::<()>().await;
            }
        } => {
            error!("Distribution scheduler exited unexpectedly");
        }
    }

    info!("Vestra backend service shutdown complete");
    Ok(())
}
