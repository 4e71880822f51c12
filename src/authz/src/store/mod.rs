//! Repository contracts consumed by the engine and the audit recorder
//!
//! Storage mechanics live behind these traits. Every call is a point lookup,
//! a single-row write, or a simple filtered list.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{
    AuditLogEntry, Membership, Permission, PermissionCheck, Role, RolePermission,
    UserPermissionOverride,
};

/// (userId, organizationId) -> role
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Get the membership for a user in an organization
    async fn find(&self, user_id: &str, organization_id: &str) -> Result<Option<Membership>>;

    /// All memberships a user holds, across organizations
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Membership>>;

    /// Insert or replace a membership (role change)
    async fn save(&self, membership: Membership) -> Result<Membership>;

    /// Remove a membership, returning whether one existed
    async fn delete(&self, user_id: &str, organization_id: &str) -> Result<bool>;

    /// Remove every membership of an organization (organization deletion)
    async fn delete_organization(&self, organization_id: &str) -> Result<usize>;
}

/// Static permission catalog
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Get a permission by ID
    async fn find(&self, id: &str) -> Result<Option<Permission>>;

    /// Get a permission by its unique (resource, action) pair
    async fn find_by_check(&self, check: PermissionCheck) -> Result<Option<Permission>>;

    /// Insert a permission; `Conflict` if the id or (resource, action) exists
    async fn insert(&self, permission: Permission) -> Result<Permission>;

    /// List the whole catalog
    async fn list(&self) -> Result<Vec<Permission>>;
}

/// Role -> permission grants
#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    /// All grants joined with their permission's (resource, action)
    async fn list_with_permissions(&self) -> Result<Vec<(Role, PermissionCheck)>>;

    /// Insert a grant; `Conflict` if the pair exists
    async fn insert(&self, grant: RolePermission) -> Result<()>;

    /// Remove a grant, returning whether one existed
    async fn delete(&self, role: Role, permission_id: &str) -> Result<bool>;
}

/// Per (user, organization, permission) overrides
#[async_trait]
pub trait OverrideStore: Send + Sync {
    async fn find(
        &self,
        user_id: &str,
        organization_id: &str,
        permission_id: &str,
    ) -> Result<Option<UserPermissionOverride>>;

    /// All overrides a user holds in an organization
    async fn list_for_member(
        &self,
        user_id: &str,
        organization_id: &str,
    ) -> Result<Vec<UserPermissionOverride>>;

    /// Insert, or update `granted` on the existing row for the same triple
    async fn upsert(&self, entry: UserPermissionOverride) -> Result<UserPermissionOverride>;

    /// Remove the row for the triple, returning whether one existed
    async fn delete(&self, user_id: &str, organization_id: &str, permission_id: &str) -> Result<bool>;
}

/// Append-only audit log
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn insert(&self, entry: AuditLogEntry) -> Result<AuditLogEntry>;

    /// Entries for an organization, newest first
    async fn list_by_organization(&self, organization_id: &str) -> Result<Vec<AuditLogEntry>>;
}

/// The stores the permission engine reads from
#[derive(Clone)]
pub struct Repositories {
    pub memberships: Arc<dyn MembershipStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub role_permissions: Arc<dyn RolePermissionStore>,
    pub overrides: Arc<dyn OverrideStore>,
}

impl Repositories {
    /// Use one backend for every store
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: MembershipStore + PermissionStore + RolePermissionStore + OverrideStore + 'static,
    {
        Self {
            memberships: store.clone(),
            permissions: store.clone(),
            role_permissions: store.clone(),
            overrides: store,
        }
    }
}
