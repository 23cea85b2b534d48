//! Static policy table mapping operations to minimum roles

use std::collections::HashMap;

use frontdesk_common::{Operation, ResourceKind, Role};

/// Minimum-role table for `(resource, operation)` pairs
///
/// The table is built once at startup and read concurrently without
/// synchronization. There is no default-allow: a pair without an entry is
/// denied as an unknown resource.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: HashMap<(ResourceKind, Operation), Role>,
}

impl PolicyTable {
    /// Table with no entries; everything denies until populated
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The production policy
    ///
    /// Shared agent-pack templates are readable by any authenticated
    /// principal and deliberately carry no write or admin entry; template
    /// maintenance happens outside the tenant-facing core.
    pub fn builtin() -> Self {
        use Operation::{Admin, Read, Write};
        use ResourceKind::*;

        Self::empty()
            .require(TenantProfile, Read, Role::Viewer)
            .require(TenantProfile, Write, Role::Admin)
            .require(TenantProfile, Admin, Role::Owner)
            .require(AgentConfig, Read, Role::Viewer)
            .require(AgentConfig, Write, Role::Admin)
            .require(AgentConfig, Admin, Role::Admin)
            .require(CallHistory, Read, Role::Viewer)
            .require(CallHistory, Write, Role::Agent)
            .require(CallHistory, Admin, Role::Admin)
            .require(PhoneNumbers, Read, Role::Viewer)
            .require(PhoneNumbers, Write, Role::Admin)
            .require(PhoneNumbers, Admin, Role::Admin)
            .require(Members, Read, Role::Viewer)
            .require(Members, Write, Role::Admin)
            .require(Members, Admin, Role::Owner)
            .require(IntegrationCredentials, Read, Role::Admin)
            .require(IntegrationCredentials, Write, Role::Admin)
            .require(IntegrationCredentials, Admin, Role::Admin)
            .require(AgentPackTemplates, Read, Role::Viewer)
    }

    /// Add or replace an entry
    pub fn require(mut self, kind: ResourceKind, operation: Operation, min_role: Role) -> Self {
        self.entries.insert((kind, operation), min_role);
        self
    }

    /// Minimum role for a pair, if the table covers it
    pub fn min_role(&self, kind: ResourceKind, operation: Operation) -> Option<Role> {
        self.entries.get(&(kind, operation)).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}
