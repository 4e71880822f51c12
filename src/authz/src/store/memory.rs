//! In-memory repository backend
//!
//! Thread-safe maps standing in for the relational store. Unique constraints
//! and cascades behave the way the tables do: duplicate keys are `Conflict`,
//! grants pointing at unknown permissions are `NotFound`.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::sync::RwLock;

use super::{AuditLogStore, MembershipStore, OverrideStore, PermissionStore, RolePermissionStore};
use crate::error::{AuthzError, Result};
use crate::types::{
    AuditLogEntry, Membership, OrganizationId, Permission, PermissionCheck, PermissionId, Role,
    RolePermission, UserId, UserPermissionOverride,
};

type MemberKey = (UserId, OrganizationId);
type OverrideKey = (UserId, OrganizationId, PermissionId);

/// DashMap-backed implementation of every repository trait
#[derive(Default)]
pub struct InMemoryStore {
    memberships: DashMap<MemberKey, Membership>,
    permissions: DashMap<PermissionId, Permission>,
    permission_index: DashMap<PermissionCheck, PermissionId>,
    role_permissions: DashSet<RolePermission>,
    overrides: DashMap<OverrideKey, UserPermissionOverride>,
    audit_log: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn member_key(user_id: &str, organization_id: &str) -> MemberKey {
        (user_id.to_string(), organization_id.to_string())
    }

    fn override_key(user_id: &str, organization_id: &str, permission_id: &str) -> OverrideKey {
        (
            user_id.to_string(),
            organization_id.to_string(),
            permission_id.to_string(),
        )
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn find(&self, user_id: &str, organization_id: &str) -> Result<Option<Membership>> {
        Ok(self
            .memberships
            .get(&Self::member_key(user_id, organization_id))
            .map(|m| m.value().clone()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Membership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.key().0 == user_id)
            .map(|m| m.value().clone())
            .collect())
    }

    async fn save(&self, membership: Membership) -> Result<Membership> {
        let key = Self::member_key(&membership.user_id, &membership.organization_id);
        self.memberships.insert(key, membership.clone());
        Ok(membership)
    }

    async fn delete(&self, user_id: &str, organization_id: &str) -> Result<bool> {
        let removed = self
            .memberships
            .remove(&Self::member_key(user_id, organization_id))
            .is_some();

        if removed {
            // Overrides cascade with the membership's organization scope
            self.overrides
                .retain(|(u, o, _), _| !(u == user_id && o == organization_id));
        }

        Ok(removed)
    }

    async fn delete_organization(&self, organization_id: &str) -> Result<usize> {
        let before = self.memberships.len();
        self.memberships.retain(|(_, o), _| o != organization_id);
        self.overrides.retain(|(_, o, _), _| o != organization_id);
        Ok(before.saturating_sub(self.memberships.len()))
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn find(&self, id: &str) -> Result<Option<Permission>> {
        Ok(self.permissions.get(id).map(|p| p.value().clone()))
    }

    async fn find_by_check(&self, check: PermissionCheck) -> Result<Option<Permission>> {
        let Some(id) = self.permission_index.get(&check).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        Ok(self.permissions.get(&id).map(|p| p.value().clone()))
    }

    async fn insert(&self, permission: Permission) -> Result<Permission> {
        // Lock order: permissions, then permission_index
        let Entry::Vacant(by_id) = self.permissions.entry(permission.id.clone()) else {
            return Err(AuthzError::Conflict(format!(
                "permission id '{}' already exists",
                permission.id
            )));
        };

        match self.permission_index.entry(permission.check()) {
            Entry::Occupied(_) => Err(AuthzError::Conflict(format!(
                "permission {} already exists",
                permission.check()
            ))),
            Entry::Vacant(by_check) => {
                by_check.insert(permission.id.clone());
                by_id.insert(permission.clone());
                Ok(permission)
            }
        }
    }

    async fn list(&self) -> Result<Vec<Permission>> {
        Ok(self.permissions.iter().map(|p| p.value().clone()).collect())
    }
}

#[async_trait]
impl RolePermissionStore for InMemoryStore {
    async fn list_with_permissions(&self) -> Result<Vec<(Role, PermissionCheck)>> {
        Ok(self
            .role_permissions
            .iter()
            .filter_map(|grant| {
                self.permissions
                    .get(&grant.permission_id)
                    .map(|p| (grant.role, p.check()))
            })
            .collect())
    }

    async fn insert(&self, grant: RolePermission) -> Result<()> {
        if !self.permissions.contains_key(&grant.permission_id) {
            return Err(AuthzError::NotFound(format!(
                "permission '{}'",
                grant.permission_id
            )));
        }

        if !self.role_permissions.insert(grant.clone()) {
            return Err(AuthzError::Conflict(format!(
                "role {} already holds permission '{}'",
                grant.role, grant.permission_id
            )));
        }

        Ok(())
    }

    async fn delete(&self, role: Role, permission_id: &str) -> Result<bool> {
        let grant = RolePermission {
            role,
            permission_id: permission_id.to_string(),
        };
        Ok(self.role_permissions.remove(&grant).is_some())
    }
}

#[async_trait]
impl OverrideStore for InMemoryStore {
    async fn find(
        &self,
        user_id: &str,
        organization_id: &str,
        permission_id: &str,
    ) -> Result<Option<UserPermissionOverride>> {
        Ok(self
            .overrides
            .get(&Self::override_key(user_id, organization_id, permission_id))
            .map(|o| o.value().clone()))
    }

    async fn list_for_member(
        &self,
        user_id: &str,
        organization_id: &str,
    ) -> Result<Vec<UserPermissionOverride>> {
        Ok(self
            .overrides
            .iter()
            .filter(|o| o.user_id == user_id && o.organization_id == organization_id)
            .map(|o| o.value().clone())
            .collect())
    }

    async fn upsert(&self, entry: UserPermissionOverride) -> Result<UserPermissionOverride> {
        let key = Self::override_key(&entry.user_id, &entry.organization_id, &entry.permission_id);

        let stored = match self.overrides.entry(key) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().granted = entry.granted;
                existing.get().clone()
            }
            Entry::Vacant(slot) => slot.insert(entry).value().clone(),
        };

        Ok(stored)
    }

    async fn delete(&self, user_id: &str, organization_id: &str, permission_id: &str) -> Result<bool> {
        Ok(self
            .overrides
            .remove(&Self::override_key(user_id, organization_id, permission_id))
            .is_some())
    }
}

#[async_trait]
impl AuditLogStore for InMemoryStore {
    async fn insert(&self, entry: AuditLogEntry) -> Result<AuditLogEntry> {
        let mut log = self.audit_log.write().await;
        log.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_organization(&self, organization_id: &str) -> Result<Vec<AuditLogEntry>> {
        let log = self.audit_log.read().await;
        let mut entries: Vec<AuditLogEntry> = log
            .iter()
            .filter(|e| e.organization_id.as_deref() == Some(organization_id))
            .cloned()
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
