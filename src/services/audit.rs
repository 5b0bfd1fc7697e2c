use crate::error::{AppError, AppResult};
use crate::models::{InvestmentPosition, ProfitLogEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: i64,
    pub event_type: String, // "investment_created", "profit_distributed", etc.
    pub investment_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub details: serde_json::Value,
}

/// Audit trail service for logging all fund-moving actions
pub struct AuditTrailService {
    #[allow(dead_code)]
    log_file: PathBuf,
    file_handle: Arc<Mutex<std::fs::File>>,
}

impl AuditTrailService {
    /// Create a new audit trail service
    pub fn new(log_directory: PathBuf) -> AppResult<Self> {
        // Ensure directory exists
        std::fs::create_dir_all(&log_directory)
            .map_err(|e| AppError::Message(format!("Failed to create log directory: {}", e)))?;

        // Create log file with date
        let date = chrono::Utc::now().format("%Y-%m-%d");
        let log_file = log_directory.join(format!("audit_{}.log", date));

        // Open file in append mode
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| AppError::Message(format!("Failed to open audit log file: {}", e)))?;

        info!("Audit trail initialized: {:?}", log_file);

        Ok(Self {
            log_file,
            file_handle: Arc::new(Mutex::new(file)),
        })
    }

    /// Log an audit entry
    pub async fn log(&self, entry: AuditLogEntry) -> AppResult<()> {
        let json = serde_json::to_string(&entry).map_err(AppError::Serialization)?;

        let mut file = self.file_handle.lock().await;
        writeln!(file, "{}", json)
            .map_err(|e| AppError::Message(format!("Failed to write audit log: {}", e)))?;

        file.flush()
            .map_err(|e| AppError::Message(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Log position creation (both ACTIVE and PENDING outcomes)
    pub async fn log_investment_created(
        &self,
        position: &InvestmentPosition,
        plan_slug: &str,
    ) -> AppResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "investment_created".to_string(),
            investment_id: Some(position.id),
            owner_id: Some(position.owner_id),
            details: serde_json::json!({
                "plan": plan_slug,
                "principal": position.principal.to_string(),
                "status": position.status,
            }),
        };

        self.log(entry).await
    }

    /// Log one period's profit payout
    pub async fn log_profit_distributed(
        &self,
        owner_id: Uuid,
        entry: &ProfitLogEntry,
    ) -> AppResult<()> {
        let log = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "profit_distributed".to_string(),
            investment_id: Some(entry.investment_id),
            owner_id: Some(owner_id),
            details: serde_json::json!({
                "amount": entry.amount.to_string(),
                "period_ending": entry.period_ending.to_rfc3339(),
                "weighted_pct": entry.weighted_pct.map(|p| p.to_string()),
            }),
        };

        self.log(log).await
    }

    /// Log principal release at maturity
    pub async fn log_principal_released(&self, position: &InvestmentPosition) -> AppResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "principal_released".to_string(),
            investment_id: Some(position.id),
            owner_id: Some(position.owner_id),
            details: serde_json::json!({
                "principal": position.principal.to_string(),
            }),
        };

        self.log(entry).await
    }

    /// Log a referral bonus credit
    pub async fn log_referral_credited(
        &self,
        referrer_id: Uuid,
        investment_id: Uuid,
        bonus: Decimal,
    ) -> AppResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "referral_credited".to_string(),
            investment_id: Some(investment_id),
            owner_id: Some(referrer_id),
            details: serde_json::json!({
                "bonus": bonus.to_string(),
            }),
        };

        self.log(entry).await
    }

    /// Log a completed distribution cycle
    pub async fn log_cycle_completed(
        &self,
        total_profit: Decimal,
        total_aum: Decimal,
        credited_count: u64,
        matured_count: u64,
    ) -> AppResult<()> {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now().timestamp(),
            event_type: "cycle_completed".to_string(),
            investment_id: None,
            owner_id: None,
            details: serde_json::json!({
                "total_profit": total_profit.to_string(),
                "total_aum": total_aum.to_string(),
                "credited_count": credited_count,
                "matured_count": matured_count,
            }),
        };

        self.log(entry).await
    }
}
