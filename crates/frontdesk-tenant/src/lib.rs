//! Frontdesk Tenant - directory, resolution, and onboarding
//!
//! Everything that establishes *which tenant a request belongs to*:
//!
//! - [`model`] - tenants, memberships, phone routes, agent configuration
//! - [`directory`] - the storage abstraction that owns those records and
//!   enforces their uniqueness invariants transactionally
//! - [`resolver`] - derives a [`frontdesk_common::TenantContext`] from an
//!   authenticated principal or from an inbound call's destination number
//! - [`onboarding`] - atomic creation of a tenant plus its first owner
//!
//! No module in this crate makes authorization decisions; callers pass the
//! resolved context to `frontdesk-policy` before touching directory data.

#![warn(missing_docs)]

pub mod directory;
pub mod model;
pub mod onboarding;
pub mod resolver;

pub use directory::{InMemoryDirectory, TenantDirectory};
pub use model::{
    AgentConfig, Membership, PhoneNumber, PhoneRoute, RouteStatus, Tenant, TenantAttributes,
    TenantStatus, TenantUpdate,
};
pub use onboarding::OnboardingCoordinator;
pub use resolver::TenantResolver;
