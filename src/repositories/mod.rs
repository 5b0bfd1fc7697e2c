pub mod investment_repository;
pub mod plan_repository;
pub mod profit_log_repository;
pub mod reserve_repository;
pub mod transaction_repository;
pub mod user_repository;
pub mod wallet_repository;

// Re-export all repositories for convenient access
pub use investment_repository::InvestmentRepository;
pub use plan_repository::PlanRepository;
pub use profit_log_repository::ProfitLogRepository;
pub use reserve_repository::ReserveRepository;
pub use transaction_repository::TransactionRepository;
pub use user_repository::UserRepository;
pub use wallet_repository::WalletRepository;
