//! Error taxonomy for the frontdesk core

use thiserror::Error;

use crate::principal::Role;
use crate::TenantId;

/// Frontdesk core error type
///
/// Authorization failures (`CrossTenant`, `InsufficientRole`,
/// `UnknownResource`) are never retried. `StorageUnavailable` is the only
/// retryable class, and retries belong to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Principal has no membership in any tenant
    #[error("principal has no tenant association")]
    NoTenantAssociation,

    /// Principal holds memberships in more than one tenant; the directory
    /// must never allow this under current policy
    #[error("principal is associated with more than one tenant")]
    AmbiguousTenant,

    /// No active phone route for the destination number
    #[error("no active tenant for destination {0}")]
    UnknownDestination(String),

    /// Route points at a tenant that is not currently servable
    #[error("tenant {0} is not servable")]
    TenantNotServable(TenantId),

    /// Resource belongs to a different tenant than the resolved context
    #[error("cross-tenant access denied")]
    CrossTenant,

    /// No policy entry covers the resource kind
    #[error("unknown resource kind")]
    UnknownResource,

    /// Principal role is below the operation's minimum
    #[error("insufficient role: requires at least {required}")]
    InsufficientRole {
        /// Minimum role the policy table demands
        required: Role,
    },

    /// Ciphertext failed to authenticate or decrypt; fatal for the record
    #[error("decryption failed")]
    DecryptionError,

    /// Principal already holds a membership somewhere
    #[error("principal already belongs to a tenant")]
    DuplicateOnboarding,

    /// Principal already holds a membership in the target tenant
    #[error("principal is already a member of this tenant")]
    AlreadyMember,

    /// Backing store unreachable; retryable with caller-supplied backoff
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Phone number failed E.164 normalization
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    /// Operation would leave the tenant without an owner
    #[error("tenant must retain at least one owner")]
    LastOwner,

    /// Phone number is still actively routed to a tenant
    #[error("phone number is still actively routed")]
    RouteStillActive,

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),
}

impl AccessError {
    /// Whether the caller may retry the failed operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

/// Result type for the frontdesk core
pub type CoreResult<T> = Result<T, AccessError>;
