//! Resource kinds, operations, and authorization decisions

use serde::{Deserialize, Serialize};

use crate::principal::Role;
use crate::TenantId;

/// Kinds of data a request can touch
///
/// Every tenant-scoped table carries a mandatory tenant id column; the one
/// reference kind without tenant affinity is the shared agent-pack
/// template library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Tenant profile (name, timezone, industry, notification recipients)
    TenantProfile,
    /// Per-tenant agent behavior configuration
    AgentConfig,
    /// Call records, transcripts, and recordings
    CallHistory,
    /// Phone numbers routed to the tenant
    PhoneNumbers,
    /// Tenant memberships
    Members,
    /// Third-party integration credentials
    IntegrationCredentials,
    /// Shared read-only agent-pack templates, owned by no tenant
    AgentPackTemplates,
}

impl ResourceKind {
    /// Whether resources of this kind belong to a tenant
    pub fn has_tenant_affinity(&self) -> bool {
        !matches!(self, Self::AgentPackTemplates)
    }
}

/// A concrete resource an operation targets: its kind plus the tenant that
/// owns it (`None` only for kinds without tenant affinity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Kind of the resource
    pub kind: ResourceKind,
    /// Owning tenant, from the resource's own tenant id column
    pub tenant_id: Option<TenantId>,
}

impl ResourceRef {
    /// Reference to a tenant-owned resource
    pub fn owned(kind: ResourceKind, tenant_id: TenantId) -> Self {
        Self {
            kind,
            tenant_id: Some(tenant_id),
        }
    }

    /// Reference to the shared agent-pack template library
    pub fn templates() -> Self {
        Self {
            kind: ResourceKind::AgentPackTemplates,
            tenant_id: None,
        }
    }
}

/// Operation classes gated by the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read existing records
    Read,
    /// Create or update records
    Write,
    /// Administrative actions (rotation, member management, status changes)
    Admin,
}

/// Why an operation was denied
///
/// The specific reason is preserved internally for audit; the caller layer
/// decides how much of it to expose externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    /// Resource tenant differs from the resolved tenant
    CrossTenant,
    /// Principal role is below the operation's minimum
    InsufficientRole {
        /// Minimum role the policy table demands
        required: Role,
    },
    /// No policy entry covers the (resource, operation) pair
    UnknownResource,
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Operation may proceed
    Allow,
    /// Operation is refused; never retried
    Deny(DenyReason),
}

impl Decision {
    /// Whether the operation may proceed
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Deny reason, if denied
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(*reason),
        }
    }
}
