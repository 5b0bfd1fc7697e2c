pub mod audit;
pub mod distribution;
pub mod investment_service;
pub mod kyc;
pub mod notify;
pub mod performance;
pub mod referral;
pub mod wallet_service;

pub use audit::AuditTrailService;
pub use distribution::{CycleOptions, CycleSummary, DistributionService};
pub use investment_service::{
    CreateOutcome, CreateStatus, FundingDiagnostics, InvestmentService, PlannedDebit,
};
pub use kyc::{ApproveAllKyc, KycStatusProvider, RecordedKycStatus};
pub use notify::{LogNotifier, NoopNotifier, Notification, NotificationDispatcher, NotificationKind};
pub use performance::{PerformanceFeed, SnapshotPerformanceFeed};
pub use referral::ReferralService;
pub use wallet_service::WalletService;
