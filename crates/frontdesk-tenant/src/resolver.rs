//! Tenant Resolution
//!
//! Derives the acting tenant for a request. Interactive principals resolve
//! through their membership; service-context calls (inbound telephony
//! events) resolve through the active route of the *verified destination*
//! number. Caller-supplied fields such as the claimed origin are attacker
//! controlled and never participate in resolution.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use frontdesk_common::{AccessError, CoreResult, PrincipalId, TenantContext};

use crate::directory::TenantDirectory;
use crate::model::PhoneNumber;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ResolveKey {
    Principal(PrincipalId),
    Destination(PhoneNumber),
}

/// Resolves tenant contexts from directory state
///
/// Lookups are cached for a short TTL and validated against the directory
/// version, so a role downgrade or route reassignment invalidates the
/// entry on the next lookup. The TTL window is the accepted, bounded
/// staleness for directories whose version counter lags replication.
pub struct TenantResolver {
    directory: Arc<dyn TenantDirectory>,
    cache: Cache<ResolveKey, (u64, TenantContext)>,
}

impl TenantResolver {
    /// Default cache TTL
    const CACHE_TTL: Duration = Duration::from_secs(5);

    /// Create a resolver over a directory
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self::with_ttl(directory, Self::CACHE_TTL)
    }

    /// Create a resolver with a custom cache TTL
    pub fn with_ttl(directory: Arc<dyn TenantDirectory>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(16_384)
            .time_to_live(ttl)
            .build();
        Self { directory, cache }
    }

    fn cached(&self, key: &ResolveKey) -> Option<TenantContext> {
        let current = self.directory.version();
        self.cache.get(key).and_then(|(version, ctx)| {
            if version == current {
                Some(ctx)
            } else {
                // Stale entry - directory changed since it was cached
                None
            }
        })
    }

    /// Resolve the tenant context for an authenticated principal
    ///
    /// Exactly one membership is expected. Zero memberships is a normal
    /// failure; more than one violates the directory's fixed
    /// one-tenant-per-principal policy and fails closed.
    pub async fn resolve_principal(&self, principal: &PrincipalId) -> CoreResult<TenantContext> {
        let key = ResolveKey::Principal(*principal);
        if let Some(ctx) = self.cached(&key) {
            return Ok(ctx);
        }

        let version = self.directory.version();
        let memberships = self.directory.memberships_for_principal(principal).await?;
        let context = match memberships.as_slice() {
            [] => {
                tracing::debug!(principal_id = %principal, "no tenant association");
                return Err(AccessError::NoTenantAssociation);
            }
            [membership] => {
                TenantContext::for_user(membership.tenant_id, *principal, membership.role)
            }
            _ => {
                tracing::warn!(
                    principal_id = %principal,
                    memberships = memberships.len(),
                    "principal holds multiple memberships; directory invariant violated"
                );
                return Err(AccessError::AmbiguousTenant);
            }
        };

        self.cache.insert(key, (version, context));
        Ok(context)
    }

    /// Resolve the tenant context for an inbound call from its verified
    /// destination number
    ///
    /// Produces a service-principal context: no user session exists on
    /// this path, and the webhook layer acts within the routed tenant
    /// only.
    pub async fn resolve_destination(&self, destination: &PhoneNumber) -> CoreResult<TenantContext> {
        let key = ResolveKey::Destination(destination.clone());
        if let Some(ctx) = self.cached(&key) {
            return Ok(ctx);
        }

        let version = self.directory.version();
        let route = self
            .directory
            .active_route(destination)
            .await?
            .ok_or_else(|| {
                tracing::debug!(destination = %destination, "no active route");
                AccessError::UnknownDestination(destination.to_string())
            })?;

        let tenant = self.directory.tenant(&route.tenant_id).await?;
        if !tenant.status.is_servable() {
            tracing::debug!(tenant_id = %tenant.id, status = ?tenant.status, "tenant not servable");
            return Err(AccessError::TenantNotServable(tenant.id));
        }

        let context = TenantContext::for_service(tenant.id);
        self.cache.insert(key, (version, context));
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::model::{Membership, TenantAttributes, TenantStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use frontdesk_common::{Principal, Role, TenantId};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_resolve_principal() {
        let dir = Arc::new(InMemoryDirectory::new());
        let owner = Uuid::new_v4();
        let tenant = dir
            .create_tenant_with_owner(TenantAttributes::new("Acme"), owner)
            .await
            .unwrap();

        let resolver = TenantResolver::new(dir);
        let ctx = resolver.resolve_principal(&owner).await.unwrap();
        assert_eq!(ctx.tenant_id, tenant.id);
        assert_eq!(ctx.role(), Some(Role::Owner));
    }

    #[tokio::test]
    async fn test_resolve_unknown_principal() {
        let resolver = TenantResolver::new(Arc::new(InMemoryDirectory::new()));
        let err = resolver.resolve_principal(&Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, AccessError::NoTenantAssociation);
    }

    #[tokio::test]
    async fn test_resolve_destination() {
        let dir = Arc::new(InMemoryDirectory::new());
        let tenant = dir
            .create_tenant_with_owner(TenantAttributes::new("Acme"), Uuid::new_v4())
            .await
            .unwrap();
        let number = PhoneNumber::parse("+14165550100").unwrap();
        dir.assign_route(number.clone(), tenant.id).await.unwrap();

        let resolver = TenantResolver::new(dir);
        let ctx = resolver.resolve_destination(&number).await.unwrap();
        assert_eq!(ctx.tenant_id, tenant.id);
        assert_eq!(ctx.principal, Principal::Service);
    }

    #[tokio::test]
    async fn test_unrouted_destination() {
        let resolver = TenantResolver::new(Arc::new(InMemoryDirectory::new()));
        let number = PhoneNumber::parse("+14165550100").unwrap();
        let err = resolver.resolve_destination(&number).await.unwrap_err();
        assert_eq!(err, AccessError::UnknownDestination("+14165550100".into()));
    }

    #[tokio::test]
    async fn test_suspended_tenant_not_servable() {
        let dir = Arc::new(InMemoryDirectory::new());
        let tenant = dir
            .create_tenant_with_owner(TenantAttributes::new("Acme"), Uuid::new_v4())
            .await
            .unwrap();
        let number = PhoneNumber::parse("+14165550100").unwrap();
        dir.assign_route(number.clone(), tenant.id).await.unwrap();
        dir.set_tenant_status(&tenant.id, TenantStatus::Suspended)
            .await
            .unwrap();

        let resolver = TenantResolver::new(dir);
        let err = resolver.resolve_destination(&number).await.unwrap_err();
        assert_eq!(err, AccessError::TenantNotServable(tenant.id));
    }

    #[tokio::test]
    async fn test_role_change_invalidates_cache() {
        let dir = Arc::new(InMemoryDirectory::new());
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let tenant = dir
            .create_tenant_with_owner(TenantAttributes::new("Acme"), owner)
            .await
            .unwrap();
        dir.add_membership(&tenant.id, member, Role::Admin)
            .await
            .unwrap();

        let resolver = TenantResolver::new(dir.clone());
        let ctx = resolver.resolve_principal(&member).await.unwrap();
        assert_eq!(ctx.role(), Some(Role::Admin));

        // Downgrade bumps the directory version; the cached context must
        // not serve the old role.
        dir.change_role(&tenant.id, &member, Role::Viewer)
            .await
            .unwrap();
        let ctx = resolver.resolve_principal(&member).await.unwrap();
        assert_eq!(ctx.role(), Some(Role::Viewer));
    }

    /// Directory double that violates the one-tenant-per-principal
    /// invariant, as a misconfigured external store could.
    struct AmbiguousDirectory;

    #[async_trait]
    impl TenantDirectory for AmbiguousDirectory {
        async fn memberships_for_principal(
            &self,
            principal: &PrincipalId,
        ) -> CoreResult<Vec<Membership>> {
            let membership = |tenant_id: TenantId| Membership {
                tenant_id,
                principal_id: *principal,
                role: Role::Owner,
                created_at: Utc::now(),
            };
            Ok(vec![membership(Uuid::new_v4()), membership(Uuid::new_v4())])
        }

        async fn create_tenant_with_owner(
            &self,
            _attrs: TenantAttributes,
            _owner: PrincipalId,
        ) -> CoreResult<crate::model::Tenant> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn tenant(&self, id: &TenantId) -> CoreResult<crate::model::Tenant> {
            Err(AccessError::NotFound(format!("tenant {id}")))
        }
        async fn update_tenant(
            &self,
            id: &TenantId,
            _update: crate::model::TenantUpdate,
        ) -> CoreResult<crate::model::Tenant> {
            Err(AccessError::NotFound(format!("tenant {id}")))
        }
        async fn set_tenant_status(
            &self,
            _id: &TenantId,
            _status: TenantStatus,
        ) -> CoreResult<()> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn membership(
            &self,
            _tenant: &TenantId,
            _principal: &PrincipalId,
        ) -> CoreResult<Option<Membership>> {
            Ok(None)
        }
        async fn add_membership(
            &self,
            _tenant: &TenantId,
            _principal: PrincipalId,
            _role: Role,
        ) -> CoreResult<Membership> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn remove_membership(
            &self,
            _tenant: &TenantId,
            _principal: &PrincipalId,
        ) -> CoreResult<()> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn change_role(
            &self,
            _tenant: &TenantId,
            _principal: &PrincipalId,
            _role: Role,
        ) -> CoreResult<Membership> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn members_of(&self, _tenant: &TenantId) -> CoreResult<Vec<Membership>> {
            Ok(Vec::new())
        }
        async fn active_route(
            &self,
            _number: &PhoneNumber,
        ) -> CoreResult<Option<crate::model::PhoneRoute>> {
            Ok(None)
        }
        async fn routes_for_tenant(
            &self,
            _tenant: &TenantId,
        ) -> CoreResult<Vec<crate::model::PhoneRoute>> {
            Ok(Vec::new())
        }
        async fn assign_route(
            &self,
            _number: PhoneNumber,
            _tenant: TenantId,
        ) -> CoreResult<crate::model::PhoneRoute> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn deactivate_route(&self, _number: &PhoneNumber) -> CoreResult<()> {
            Err(AccessError::StorageUnavailable("stub".into()))
        }
        async fn agent_config(&self, tenant: &TenantId) -> CoreResult<crate::model::AgentConfig> {
            Err(AccessError::NotFound(format!("agent config for {tenant}")))
        }
        async fn update_agent_config(
            &self,
            _tenant: &TenantId,
            config: crate::model::AgentConfig,
        ) -> CoreResult<crate::model::AgentConfig> {
            Ok(config)
        }
        fn version(&self) -> u64 {
            0
        }
    }

    #[tokio::test]
    async fn test_multiple_memberships_fail_closed() {
        let resolver = TenantResolver::new(Arc::new(AmbiguousDirectory));
        let err = resolver.resolve_principal(&Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, AccessError::AmbiguousTenant);
    }
}
