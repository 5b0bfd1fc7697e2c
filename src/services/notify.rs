//! Notification dispatch seam.
//!
//! Delivery transport lives outside this subsystem; the engine only emits
//! domain notifications through this trait. Dispatch is best-effort and
//! infallible at the call site; implementations swallow their own
//! transport errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PositionActivated,
    ProfitCredited,
    PrincipalReleased,
    ReferralBonus,
    DepositReceived,
    WithdrawalRequested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, owner_id: Uuid, notification: Notification);
}

/// Default dispatcher: writes the notification to the log stream
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn dispatch(&self, owner_id: Uuid, notification: Notification) {
        info!(
            "notify {}: [{}] {}",
            owner_id, notification.title, notification.message
        );
    }
}

/// Dispatcher that drops everything; used where delivery is irrelevant
pub struct NoopNotifier;

#[async_trait]
impl NotificationDispatcher for NoopNotifier {
    async fn dispatch(&self, _owner_id: Uuid, _notification: Notification) {}
}
