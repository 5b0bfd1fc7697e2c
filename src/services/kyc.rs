//! KYC status seam consulted by the distribution cycle's policy gate.

use crate::repositories::UserRepository;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait KycStatusProvider: Send + Sync {
    async fn is_approved(&self, owner_id: Uuid) -> bool;
}

/// Treats every owner as approved; the default while gating is off
pub struct ApproveAllKyc;

#[async_trait]
impl KycStatusProvider for ApproveAllKyc {
    async fn is_approved(&self, _owner_id: Uuid) -> bool {
        true
    }
}

/// Reads the approval bit recorded on the local user row
pub struct RecordedKycStatus {
    user_repo: Arc<UserRepository>,
}

impl RecordedKycStatus {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl KycStatusProvider for RecordedKycStatus {
    async fn is_approved(&self, owner_id: Uuid) -> bool {
        match self.user_repo.find_by_id(owner_id).await {
            Ok(Some(user)) => user.kyc_approved,
            _ => false,
        }
    }
}
