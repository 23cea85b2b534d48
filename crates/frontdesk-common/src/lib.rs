//! Frontdesk Common - Shared types for the tenant isolation core
//!
//! This crate provides the vocabulary every other frontdesk crate speaks:
//! - Tenant and principal identifiers
//! - Roles, principals, and request-scoped tenant contexts
//! - Resource kinds, operations, and authorization decisions
//! - The error taxonomy for the whole core
//!
//! Nothing in here performs I/O or holds mutable state; the types are the
//! contract between the resolver, the authorization engine, the vault, and
//! the storage layer behind them.

#![warn(missing_docs)]

pub mod error;
pub mod principal;
pub mod resource;

pub use error::{AccessError, CoreResult};
pub use principal::{Principal, Role, TenantContext};
pub use resource::{DenyReason, Decision, Operation, ResourceKind, ResourceRef};

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Tenant ID
pub type TenantId = Uuid;

/// Principal ID (a user id from the external auth layer)
pub type PrincipalId = Uuid;

/// High-performance counter for lock-free metrics
#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    /// Create new counter
    pub const fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Increment and return previous value
    #[inline(always)]
    pub fn inc(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Get current value
    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
