//! Tenant Onboarding
//!
//! Orchestrates the one path that may create a membership without a prior
//! authorization check: no tenant exists yet to check against. The tenant
//! record, the first `owner` membership, and the default agent
//! configuration commit as a single atomic unit in the directory; on any
//! partial failure nothing is visible.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use frontdesk_common::{AccessError, CoreResult, PrincipalId};

use crate::directory::TenantDirectory;
use crate::model::{Tenant, TenantAttributes};

/// Onboarding state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    /// Request accepted, nothing committed yet
    Requested,
    /// Tenant and owner membership committed
    Provisioned,
    /// Rolled back entirely
    Failed,
}

/// Execution record of one onboarding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingRecord {
    /// Request id
    pub id: Uuid,
    /// Principal becoming the first owner
    pub principal_id: PrincipalId,
    /// Current stage
    pub stage: OnboardingStage,
    /// When the request was accepted
    pub started_at: DateTime<Utc>,
    /// When the request reached a terminal stage
    pub completed_at: Option<DateTime<Utc>>,
}

impl OnboardingRecord {
    fn new(principal_id: PrincipalId) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal_id,
            stage: OnboardingStage::Requested,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    fn complete(&mut self, stage: OnboardingStage) {
        self.stage = stage;
        self.completed_at = Some(Utc::now());
    }
}

/// Coordinates atomic tenant creation
pub struct OnboardingCoordinator {
    directory: Arc<dyn TenantDirectory>,
}

impl OnboardingCoordinator {
    /// Create a coordinator over a directory
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self { directory }
    }

    /// Onboard a new tenant with `principal` as its first owner
    ///
    /// Fails with [`AccessError::DuplicateOnboarding`] if the principal
    /// already holds a membership anywhere; a principal may not own two
    /// tenants under current policy. Two concurrent requests for the same
    /// principal serialize in the directory, so exactly one succeeds.
    pub async fn onboard(
        &self,
        principal: PrincipalId,
        attrs: TenantAttributes,
    ) -> CoreResult<Tenant> {
        let mut record = OnboardingRecord::new(principal);
        tracing::debug!(request_id = %record.id, principal_id = %principal, "onboarding requested");

        // Cheap precheck; the directory re-enforces this under its own
        // writer section, which is what makes the race safe.
        if !self
            .directory
            .memberships_for_principal(&principal)
            .await?
            .is_empty()
        {
            record.complete(OnboardingStage::Failed);
            return Err(AccessError::DuplicateOnboarding);
        }

        match self
            .directory
            .create_tenant_with_owner(attrs, principal)
            .await
        {
            Ok(tenant) => {
                record.complete(OnboardingStage::Provisioned);
                tracing::info!(
                    request_id = %record.id,
                    tenant_id = %tenant.id,
                    "onboarding provisioned"
                );
                Ok(tenant)
            }
            Err(err) => {
                record.complete(OnboardingStage::Failed);
                tracing::warn!(request_id = %record.id, error = %err, "onboarding failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use frontdesk_common::Role;

    #[tokio::test]
    async fn test_onboard_creates_tenant_and_owner() {
        let dir = Arc::new(InMemoryDirectory::new());
        let coordinator = OnboardingCoordinator::new(dir.clone());
        let principal = Uuid::new_v4();

        let tenant = coordinator
            .onboard(principal, TenantAttributes::new("Acme Dental"))
            .await
            .unwrap();

        let membership = dir.membership(&tenant.id, &principal).await.unwrap().unwrap();
        assert_eq!(membership.role, Role::Owner);
        assert_eq!(dir.tenant_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_onboarding_rejected() {
        let dir = Arc::new(InMemoryDirectory::new());
        let coordinator = OnboardingCoordinator::new(dir.clone());
        let principal = Uuid::new_v4();

        coordinator
            .onboard(principal, TenantAttributes::new("First"))
            .await
            .unwrap();
        let err = coordinator
            .onboard(principal, TenantAttributes::new("Second"))
            .await
            .unwrap_err();

        assert_eq!(err, AccessError::DuplicateOnboarding);
        assert_eq!(dir.tenant_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_onboarding_single_winner() {
        let dir = Arc::new(InMemoryDirectory::new());
        let coordinator = Arc::new(OnboardingCoordinator::new(dir.clone()));
        let principal = Uuid::new_v4();

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .onboard(principal, TenantAttributes::new("Racer A"))
                    .await
            })
        };
        let second = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .onboard(principal, TenantAttributes::new("Racer B"))
                    .await
            })
        };

        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AccessError::DuplicateOnboarding))));
        assert_eq!(dir.tenant_count(), 1);
    }
}
