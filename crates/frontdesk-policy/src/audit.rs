//! Audit records for authorization decisions
//!
//! The engine emits one record per `authorize` call. Delivery is
//! best-effort: sinks must return quickly and may drop records, and a lost
//! record never changes a decision.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use frontdesk_common::{Decision, DenyReason, Operation, Principal, ResourceKind, TenantId};

/// One authorization decision, as consumed by the audit pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// Acting principal
    pub principal: Principal,
    /// Tenant the request was resolved to
    pub tenant_id: TenantId,
    /// Kind of resource targeted
    pub resource: ResourceKind,
    /// Tenant owning the resource, when the kind has tenant affinity
    pub resource_tenant: Option<TenantId>,
    /// Operation attempted
    pub operation: Operation,
    /// Outcome
    pub decision: Decision,
}

impl AuditRecord {
    /// Specific internal deny reason, if denied
    pub fn reason(&self) -> Option<DenyReason> {
        self.decision.deny_reason()
    }
}

/// Consumer of audit records
///
/// Implementations must not block the caller; the engine invokes
/// [`record`](Self::record) inline on the request path.
pub trait AuditSink: Send + Sync {
    /// Accept one record, best-effort
    fn record(&self, record: AuditRecord);
}

/// Sink that emits audit records as tracing events
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        match record.decision {
            Decision::Allow => tracing::info!(
                principal = ?record.principal,
                tenant_id = %record.tenant_id,
                resource = ?record.resource,
                operation = ?record.operation,
                "access allowed"
            ),
            Decision::Deny(reason) => tracing::warn!(
                principal = ?record.principal,
                tenant_id = %record.tenant_id,
                resource = ?record.resource,
                resource_tenant = ?record.resource_tenant,
                operation = ?record.operation,
                reason = ?reason,
                "access denied"
            ),
        }
    }
}

/// Sink that retains records in memory, for tests and local inspection
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Number of records retained
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}
