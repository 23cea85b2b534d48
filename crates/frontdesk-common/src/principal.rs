//! Principals, roles, and request-scoped tenant contexts

use serde::{Deserialize, Serialize};

use crate::{PrincipalId, TenantId};

/// Membership role, ordered from least to most privileged
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to tenant data
    Viewer,
    /// Handles calls and day-to-day records
    Agent,
    /// Manages configuration, members, and credentials
    Admin,
    /// Full control; every tenant keeps at least one
    Owner,
}

impl Role {
    /// Stable string form, matching the stored role column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Agent => "agent",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor
///
/// The two access paths share one type so a single `authorize` call serves
/// both: interactive users carry a membership role, while the backend's own
/// service identity carries none and is exempt from role minimums (never
/// from tenant matching).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// Interactive user with a membership role in the resolved tenant
    User {
        /// User id from the external auth layer
        id: PrincipalId,
        /// Role held in the resolved tenant
        role: Role,
    },
    /// The backend service itself (webhook processing, background jobs)
    Service,
}

impl Principal {
    /// User id, if interactive
    pub fn id(&self) -> Option<PrincipalId> {
        match self {
            Self::User { id, .. } => Some(*id),
            Self::Service => None,
        }
    }

    /// Membership role, if interactive
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::User { role, .. } => Some(*role),
            Self::Service => None,
        }
    }
}

/// Resolved tenant context for one request
///
/// Owned by the request's execution and passed explicitly through every
/// call boundary. Never persisted, never shared across requests, never
/// stashed in a thread-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// The tenant every operation in this request may touch
    pub tenant_id: TenantId,
    /// The actor the context was resolved for
    pub principal: Principal,
}

impl TenantContext {
    /// Context for an interactive user resolved through a membership
    pub fn for_user(tenant_id: TenantId, user_id: PrincipalId, role: Role) -> Self {
        Self {
            tenant_id,
            principal: Principal::User { id: user_id, role },
        }
    }

    /// Context for the service principal, already scoped to one tenant
    pub fn for_service(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            principal: Principal::Service,
        }
    }

    /// Role of the acting principal, if interactive
    pub fn role(&self) -> Option<Role> {
        self.principal.role()
    }
}
