//! Domain models for the Vestra backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the investment platform.

pub mod investment;
pub mod plan;
pub mod profit_log;
pub mod reserve;
pub mod transaction;
pub mod user;
pub mod wallet;

// Re-export all models for convenient access
pub use investment::{InvestmentPosition, PositionStatus};
pub use plan::{PayoutFrequency, Plan, PlanTier};
pub use profit_log::ProfitLogEntry;
pub use reserve::ReserveBuffer;
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::User;
pub use wallet::{MovementDirection, MovementSource, Wallet, WalletMovement};
