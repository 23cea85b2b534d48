//! Tenant Directory - authoritative store of tenants, memberships, and routes
//!
//! The directory is pure data access with the uniqueness invariants the
//! rest of the core depends on enforced *inside* the store, at its
//! serialization points. Checking first and inserting later in the calling
//! layer would race; here every mutation validates and commits under one
//! writer section, and the two-record onboarding commit is all-or-nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use frontdesk_common::{AccessError, CoreResult, PrincipalId, Role, TenantId};

use crate::model::{
    AgentConfig, Membership, PhoneNumber, PhoneRoute, RouteStatus, Tenant, TenantAttributes,
    TenantStatus, TenantUpdate,
};

/// Storage abstraction over tenants, memberships, phone routes, and agent
/// configuration
///
/// Implementations must guarantee, transactionally:
/// - at most one membership per (tenant, principal), and under current
///   policy at most one membership per principal globally;
/// - at most one active route per phone number;
/// - at least one `owner` membership per tenant at all times;
/// - [`create_tenant_with_owner`](Self::create_tenant_with_owner) commits
///   both records or neither.
///
/// The [`version`](Self::version) counter increases on every mutation and
/// backs cache invalidation in the resolver.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Atomically create a tenant, its first `owner` membership, and the
    /// default agent configuration
    async fn create_tenant_with_owner(
        &self,
        attrs: TenantAttributes,
        owner: PrincipalId,
    ) -> CoreResult<Tenant>;

    /// Fetch a tenant by id
    async fn tenant(&self, id: &TenantId) -> CoreResult<Tenant>;

    /// Apply a partial profile update
    async fn update_tenant(&self, id: &TenantId, update: TenantUpdate) -> CoreResult<Tenant>;

    /// Transition the tenant's lifecycle status
    async fn set_tenant_status(&self, id: &TenantId, status: TenantStatus) -> CoreResult<()>;

    /// All memberships held by a principal, across tenants
    async fn memberships_for_principal(
        &self,
        principal: &PrincipalId,
    ) -> CoreResult<Vec<Membership>>;

    /// Membership of a principal in one tenant, if any
    async fn membership(
        &self,
        tenant: &TenantId,
        principal: &PrincipalId,
    ) -> CoreResult<Option<Membership>>;

    /// Add a member to a tenant
    async fn add_membership(
        &self,
        tenant: &TenantId,
        principal: PrincipalId,
        role: Role,
    ) -> CoreResult<Membership>;

    /// Remove a member; refuses to remove the last owner
    async fn remove_membership(
        &self,
        tenant: &TenantId,
        principal: &PrincipalId,
    ) -> CoreResult<()>;

    /// Change a member's role; refuses to demote the sole owner
    async fn change_role(
        &self,
        tenant: &TenantId,
        principal: &PrincipalId,
        role: Role,
    ) -> CoreResult<Membership>;

    /// All members of a tenant
    async fn members_of(&self, tenant: &TenantId) -> CoreResult<Vec<Membership>>;

    /// Active route for a destination number, if any
    async fn active_route(&self, number: &PhoneNumber) -> CoreResult<Option<PhoneRoute>>;

    /// All routes owned by a tenant
    async fn routes_for_tenant(&self, tenant: &TenantId) -> CoreResult<Vec<PhoneRoute>>;

    /// Route a number to a tenant; the number must not be actively routed
    async fn assign_route(&self, number: PhoneNumber, tenant: TenantId) -> CoreResult<PhoneRoute>;

    /// Deactivate a route, freeing the number for reassignment
    async fn deactivate_route(&self, number: &PhoneNumber) -> CoreResult<()>;

    /// Agent configuration of a tenant
    async fn agent_config(&self, tenant: &TenantId) -> CoreResult<AgentConfig>;

    /// Replace the agent configuration of a tenant
    async fn update_agent_config(
        &self,
        tenant: &TenantId,
        config: AgentConfig,
    ) -> CoreResult<AgentConfig>;

    /// Monotone counter bumped by every mutation, for cache invalidation
    fn version(&self) -> u64;
}

#[derive(Default)]
struct DirectoryState {
    tenants: HashMap<TenantId, Tenant>,
    memberships: HashMap<TenantId, HashMap<PrincipalId, Membership>>,
    routes: HashMap<PhoneNumber, PhoneRoute>,
    agent_configs: HashMap<TenantId, AgentConfig>,
}

impl DirectoryState {
    fn memberships_of(&self, principal: &PrincipalId) -> Vec<Membership> {
        self.memberships
            .values()
            .filter_map(|members| members.get(principal))
            .cloned()
            .collect()
    }

    fn owner_count(&self, tenant: &TenantId) -> usize {
        self.memberships
            .get(tenant)
            .map(|members| {
                members
                    .values()
                    .filter(|m| m.role == Role::Owner)
                    .count()
            })
            .unwrap_or(0)
    }
}

/// In-memory reference implementation of [`TenantDirectory`]
///
/// One `RwLock` over the whole state makes every mutation a serialization
/// point, which is exactly the transactional guarantee the trait demands.
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    /// Version for cache invalidation
    version: AtomicU64,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DirectoryState::default()),
            version: AtomicU64::new(0),
        }
    }

    /// Number of tenants on record
    pub fn tenant_count(&self) -> usize {
        self.state.read().tenants.len()
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::Release);
    }

    fn insert_membership_locked(
        state: &mut DirectoryState,
        tenant: TenantId,
        principal: PrincipalId,
        role: Role,
    ) -> CoreResult<Membership> {
        if let Some(members) = state.memberships.get(&tenant) {
            if members.contains_key(&principal) {
                return Err(AccessError::AlreadyMember);
            }
        }
        // Fixed policy: one tenant per principal, enforced at write time
        if !state.memberships_of(&principal).is_empty() {
            return Err(AccessError::DuplicateOnboarding);
        }
        let membership = Membership {
            tenant_id: tenant,
            principal_id: principal,
            role,
            created_at: Utc::now(),
        };
        state
            .memberships
            .entry(tenant)
            .or_default()
            .insert(principal, membership.clone());
        Ok(membership)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TenantDirectory for InMemoryDirectory {
    async fn create_tenant_with_owner(
        &self,
        attrs: TenantAttributes,
        owner: PrincipalId,
    ) -> CoreResult<Tenant> {
        let tenant = Tenant::new(attrs);
        let mut state = self.state.write();

        state.tenants.insert(tenant.id, tenant.clone());
        state
            .agent_configs
            .insert(tenant.id, AgentConfig::default_for(tenant.id));

        if let Err(err) =
            Self::insert_membership_locked(&mut state, tenant.id, owner, Role::Owner)
        {
            // Roll back before the writer section ends; no partial tenant
            // is ever observable.
            state.tenants.remove(&tenant.id);
            state.agent_configs.remove(&tenant.id);
            return Err(err);
        }

        drop(state);
        self.bump();
        tracing::info!(tenant_id = %tenant.id, principal_id = %owner, "tenant provisioned");
        Ok(tenant)
    }

    async fn tenant(&self, id: &TenantId) -> CoreResult<Tenant> {
        self.state
            .read()
            .tenants
            .get(id)
            .cloned()
            .ok_or_else(|| AccessError::NotFound(format!("tenant {id}")))
    }

    async fn update_tenant(&self, id: &TenantId, update: TenantUpdate) -> CoreResult<Tenant> {
        let mut state = self.state.write();
        let tenant = state
            .tenants
            .get_mut(id)
            .ok_or_else(|| AccessError::NotFound(format!("tenant {id}")))?;

        if let Some(name) = update.name {
            tenant.name = name;
        }
        if let Some(timezone) = update.timezone {
            tenant.timezone = timezone;
        }
        if let Some(industry) = update.industry {
            tenant.industry = Some(industry);
        }
        if let Some(recipients) = update.default_email_recipients {
            tenant.default_email_recipients = recipients;
        }
        tenant.updated_at = Utc::now();
        let updated = tenant.clone();
        drop(state);
        self.bump();
        Ok(updated)
    }

    async fn set_tenant_status(&self, id: &TenantId, status: TenantStatus) -> CoreResult<()> {
        let mut state = self.state.write();
        let tenant = state
            .tenants
            .get_mut(id)
            .ok_or_else(|| AccessError::NotFound(format!("tenant {id}")))?;
        tenant.status = status;
        tenant.updated_at = Utc::now();
        drop(state);
        self.bump();
        Ok(())
    }

    async fn memberships_for_principal(
        &self,
        principal: &PrincipalId,
    ) -> CoreResult<Vec<Membership>> {
        Ok(self.state.read().memberships_of(principal))
    }

    async fn membership(
        &self,
        tenant: &TenantId,
        principal: &PrincipalId,
    ) -> CoreResult<Option<Membership>> {
        Ok(self
            .state
            .read()
            .memberships
            .get(tenant)
            .and_then(|members| members.get(principal))
            .cloned())
    }

    async fn add_membership(
        &self,
        tenant: &TenantId,
        principal: PrincipalId,
        role: Role,
    ) -> CoreResult<Membership> {
        let mut state = self.state.write();
        if !state.tenants.contains_key(tenant) {
            return Err(AccessError::NotFound(format!("tenant {tenant}")));
        }
        let membership = Self::insert_membership_locked(&mut state, *tenant, principal, role)?;
        drop(state);
        self.bump();
        Ok(membership)
    }

    async fn remove_membership(
        &self,
        tenant: &TenantId,
        principal: &PrincipalId,
    ) -> CoreResult<()> {
        let mut state = self.state.write();
        let members = state
            .memberships
            .get(tenant)
            .ok_or_else(|| AccessError::NotFound(format!("tenant {tenant}")))?;
        let membership = members
            .get(principal)
            .ok_or_else(|| AccessError::NotFound(format!("membership of {principal}")))?;

        if membership.role == Role::Owner && state.owner_count(tenant) <= 1 {
            return Err(AccessError::LastOwner);
        }
        if let Some(members) = state.memberships.get_mut(tenant) {
            members.remove(principal);
        }
        drop(state);
        self.bump();
        Ok(())
    }

    async fn change_role(
        &self,
        tenant: &TenantId,
        principal: &PrincipalId,
        role: Role,
    ) -> CoreResult<Membership> {
        let mut state = self.state.write();
        let current = state
            .memberships
            .get(tenant)
            .and_then(|members| members.get(principal))
            .cloned()
            .ok_or_else(|| AccessError::NotFound(format!("membership of {principal}")))?;

        if current.role == Role::Owner && role != Role::Owner && state.owner_count(tenant) <= 1 {
            return Err(AccessError::LastOwner);
        }
        let members = state
            .memberships
            .get_mut(tenant)
            .ok_or_else(|| AccessError::NotFound(format!("tenant {tenant}")))?;
        let membership = members
            .get_mut(principal)
            .ok_or_else(|| AccessError::NotFound(format!("membership of {principal}")))?;
        membership.role = role;
        let changed = membership.clone();
        drop(state);
        self.bump();
        Ok(changed)
    }

    async fn members_of(&self, tenant: &TenantId) -> CoreResult<Vec<Membership>> {
        Ok(self
            .state
            .read()
            .memberships
            .get(tenant)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn active_route(&self, number: &PhoneNumber) -> CoreResult<Option<PhoneRoute>> {
        Ok(self
            .state
            .read()
            .routes
            .get(number)
            .filter(|route| route.status == RouteStatus::Active)
            .cloned())
    }

    async fn routes_for_tenant(&self, tenant: &TenantId) -> CoreResult<Vec<PhoneRoute>> {
        Ok(self
            .state
            .read()
            .routes
            .values()
            .filter(|route| route.tenant_id == *tenant)
            .cloned()
            .collect())
    }

    async fn assign_route(&self, number: PhoneNumber, tenant: TenantId) -> CoreResult<PhoneRoute> {
        let mut state = self.state.write();
        if !state.tenants.contains_key(&tenant) {
            return Err(AccessError::NotFound(format!("tenant {tenant}")));
        }
        if let Some(existing) = state.routes.get(&number) {
            if existing.status == RouteStatus::Active {
                return Err(AccessError::RouteStillActive);
            }
        }
        let route = PhoneRoute {
            number: number.clone(),
            tenant_id: tenant,
            status: RouteStatus::Active,
            assigned_at: Utc::now(),
        };
        state.routes.insert(number, route.clone());
        drop(state);
        self.bump();
        Ok(route)
    }

    async fn deactivate_route(&self, number: &PhoneNumber) -> CoreResult<()> {
        let mut state = self.state.write();
        let route = state
            .routes
            .get_mut(number)
            .ok_or_else(|| AccessError::NotFound(format!("route for {number}")))?;
        route.status = RouteStatus::Inactive;
        drop(state);
        self.bump();
        Ok(())
    }

    async fn agent_config(&self, tenant: &TenantId) -> CoreResult<AgentConfig> {
        self.state
            .read()
            .agent_configs
            .get(tenant)
            .cloned()
            .ok_or_else(|| AccessError::NotFound(format!("agent config for {tenant}")))
    }

    async fn update_agent_config(
        &self,
        tenant: &TenantId,
        mut config: AgentConfig,
    ) -> CoreResult<AgentConfig> {
        let mut state = self.state.write();
        if !state.tenants.contains_key(tenant) {
            return Err(AccessError::NotFound(format!("tenant {tenant}")));
        }
        config.tenant_id = *tenant;
        state.agent_configs.insert(*tenant, config.clone());
        drop(state);
        self.bump();
        Ok(config)
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
