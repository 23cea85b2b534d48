//! Authorization engine

use std::sync::Arc;

use chrono::Utc;

use frontdesk_common::{
    AtomicCounter, Decision, DenyReason, Operation, Principal, ResourceRef, TenantContext,
};

use crate::audit::{AuditRecord, AuditSink};
use crate::table::PolicyTable;

/// Central authorization decision point
///
/// Total over its inputs: every `(role, operation)` pair has a defined
/// outcome, and everything the policy table does not cover fails closed.
/// Holds no mutable state beyond lock-free counters, so one engine serves
/// any number of concurrent request handlers.
pub struct AuthorizationEngine {
    table: PolicyTable,
    audit: Arc<dyn AuditSink>,

    // Metrics
    allows: AtomicCounter,
    denies: AtomicCounter,
}

impl AuthorizationEngine {
    /// Engine over the builtin policy table
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self::with_table(PolicyTable::builtin(), audit)
    }

    /// Engine over a custom policy table
    pub fn with_table(table: PolicyTable, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            table,
            audit,
            allows: AtomicCounter::new(0),
            denies: AtomicCounter::new(0),
        }
    }

    /// Decide whether `context` may perform `operation` on `resource`
    ///
    /// Emits exactly one audit record per call. Synchronous and free of
    /// I/O; directory lookups happen before this point, in the resolver.
    pub fn authorize(
        &self,
        context: &TenantContext,
        resource: &ResourceRef,
        operation: Operation,
    ) -> Decision {
        let decision = self.decide(context, resource, operation);

        match decision {
            Decision::Allow => {
                self.allows.inc();
            }
            Decision::Deny(_) => {
                self.denies.inc();
            }
        }

        self.audit.record(AuditRecord {
            timestamp: Utc::now(),
            principal: context.principal,
            tenant_id: context.tenant_id,
            resource: resource.kind,
            resource_tenant: resource.tenant_id,
            operation,
            decision,
        });

        decision
    }

    fn decide(
        &self,
        context: &TenantContext,
        resource: &ResourceRef,
        operation: Operation,
    ) -> Decision {
        // Tenant match comes first and binds every principal, the service
        // principal included. A tenant-affine resource without an owning
        // tenant id cannot be matched and is treated the same way.
        if resource.kind.has_tenant_affinity() {
            match resource.tenant_id {
                Some(owner) if owner == context.tenant_id => {}
                _ => return Decision::Deny(DenyReason::CrossTenant),
            }
        }

        let Some(required) = self.table.min_role(resource.kind, operation) else {
            return Decision::Deny(DenyReason::UnknownResource);
        };

        match context.principal {
            Principal::Service => Decision::Allow,
            Principal::User { role, .. } if role >= required => Decision::Allow,
            Principal::User { .. } => Decision::Deny(DenyReason::InsufficientRole { required }),
        }
    }

    /// Decision counters since startup
    pub fn stats(&self) -> EngineStats {
        let allows = self.allows.get();
        let denies = self.denies.get();
        EngineStats {
            allows,
            denies,
            total: allows + denies,
        }
    }
}

/// Engine statistics
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EngineStats {
    /// Decisions that allowed the operation
    pub allows: u64,
    /// Decisions that denied the operation
    pub denies: u64,
    /// All decisions made
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use frontdesk_common::{ResourceKind, Role};
    use uuid::Uuid;

    fn engine() -> (AuthorizationEngine, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (AuthorizationEngine::new(sink.clone()), sink)
    }

    #[test]
    fn test_owner_writes_own_agent_config() {
        let (engine, _) = engine();
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_user(tenant, Uuid::new_v4(), Role::Owner);
        let resource = ResourceRef::owned(ResourceKind::AgentConfig, tenant);

        assert_eq!(
            engine.authorize(&ctx, &resource, Operation::Write),
            Decision::Allow
        );
    }

    #[test]
    fn test_cross_tenant_always_denied() {
        let (engine, _) = engine();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();

        // Highest role, service principal, every operation: the outcome
        // never changes.
        let owner = TenantContext::for_user(tenant_a, Uuid::new_v4(), Role::Owner);
        let service = TenantContext::for_service(tenant_a);
        for ctx in [owner, service] {
            for kind in [
                ResourceKind::TenantProfile,
                ResourceKind::AgentConfig,
                ResourceKind::CallHistory,
                ResourceKind::IntegrationCredentials,
            ] {
                let foreign = ResourceRef::owned(kind, tenant_b);
                for op in [Operation::Read, Operation::Write, Operation::Admin] {
                    assert_eq!(
                        engine.authorize(&ctx, &foreign, op),
                        Decision::Deny(DenyReason::CrossTenant)
                    );
                }
            }
        }
    }

    #[test]
    fn test_viewer_reads_but_never_writes() {
        let (engine, _) = engine();
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_user(tenant, Uuid::new_v4(), Role::Viewer);

        let readable = [
            ResourceKind::TenantProfile,
            ResourceKind::AgentConfig,
            ResourceKind::CallHistory,
            ResourceKind::PhoneNumbers,
            ResourceKind::Members,
        ];
        for kind in readable {
            let resource = ResourceRef::owned(kind, tenant);
            assert_eq!(
                engine.authorize(&ctx, &resource, Operation::Read),
                Decision::Allow
            );
            assert!(!engine.authorize(&ctx, &resource, Operation::Write).is_allow());
            assert!(!engine.authorize(&ctx, &resource, Operation::Admin).is_allow());
        }

        // Credentials are the deliberate exception: even reads need admin.
        let credentials = ResourceRef::owned(ResourceKind::IntegrationCredentials, tenant);
        assert_eq!(
            engine.authorize(&ctx, &credentials, Operation::Read),
            Decision::Deny(DenyReason::InsufficientRole {
                required: Role::Admin
            })
        );
    }

    #[test]
    fn test_agent_cannot_write_tenant_profile() {
        let (engine, _) = engine();
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_user(tenant, Uuid::new_v4(), Role::Agent);
        let resource = ResourceRef::owned(ResourceKind::TenantProfile, tenant);

        assert_eq!(
            engine.authorize(&ctx, &resource, Operation::Write),
            Decision::Deny(DenyReason::InsufficientRole {
                required: Role::Admin
            })
        );
    }

    #[test]
    fn test_service_bypasses_role_not_tenant() {
        let (engine, _) = engine();
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_service(tenant);

        let own = ResourceRef::owned(ResourceKind::CallHistory, tenant);
        assert_eq!(engine.authorize(&ctx, &own, Operation::Write), Decision::Allow);
        assert_eq!(
            engine.authorize(&ctx, &own, Operation::Admin),
            Decision::Allow
        );

        let foreign = ResourceRef::owned(ResourceKind::CallHistory, Uuid::new_v4());
        assert_eq!(
            engine.authorize(&ctx, &foreign, Operation::Write),
            Decision::Deny(DenyReason::CrossTenant)
        );
    }

    #[test]
    fn test_templates_readable_across_tenants() {
        let (engine, _) = engine();
        let ctx = TenantContext::for_user(Uuid::new_v4(), Uuid::new_v4(), Role::Viewer);
        let templates = ResourceRef::templates();

        assert_eq!(
            engine.authorize(&ctx, &templates, Operation::Read),
            Decision::Allow
        );
        // No write entry exists; the engine fails closed.
        assert_eq!(
            engine.authorize(&ctx, &templates, Operation::Write),
            Decision::Deny(DenyReason::UnknownResource)
        );
    }

    #[test]
    fn test_malformed_owned_ref_fails_closed() {
        let (engine, _) = engine();
        let ctx = TenantContext::for_user(Uuid::new_v4(), Uuid::new_v4(), Role::Owner);
        // Tenant-affine kind with no owning tenant: the match cannot be
        // established, so it denies.
        let malformed = ResourceRef {
            kind: ResourceKind::CallHistory,
            tenant_id: None,
        };
        assert_eq!(
            engine.authorize(&ctx, &malformed, Operation::Read),
            Decision::Deny(DenyReason::CrossTenant)
        );
    }

    #[test]
    fn test_uncovered_table_denies_unknown_resource() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = AuthorizationEngine::with_table(PolicyTable::empty(), sink);
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_user(tenant, Uuid::new_v4(), Role::Owner);
        let resource = ResourceRef::owned(ResourceKind::TenantProfile, tenant);

        assert_eq!(
            engine.authorize(&ctx, &resource, Operation::Read),
            Decision::Deny(DenyReason::UnknownResource)
        );
    }

    #[test]
    fn test_one_audit_record_per_decision() {
        let (engine, sink) = engine();
        let tenant = Uuid::new_v4();
        let ctx = TenantContext::for_user(tenant, Uuid::new_v4(), Role::Viewer);

        engine.authorize(
            &ctx,
            &ResourceRef::owned(ResourceKind::CallHistory, tenant),
            Operation::Read,
        );
        engine.authorize(
            &ctx,
            &ResourceRef::owned(ResourceKind::CallHistory, Uuid::new_v4()),
            Operation::Read,
        );

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reason(), None);
        assert_eq!(records[1].reason(), Some(DenyReason::CrossTenant));
        assert_eq!(records[1].tenant_id, tenant);

        let stats = engine.stats();
        assert_eq!(stats.allows, 1);
        assert_eq!(stats.denies, 1);
        assert_eq!(stats.total, 2);
    }
}
