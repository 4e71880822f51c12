//! Permission resolution engine
//!
//! Combines memberships, the role -> capability map and user overrides into
//! one decision.
//!
//! ```text
//! (user, org, resource, action)
//!        │
//!   Membership? ── no ──► deny
//!        │ yes
//!   Override row? ── yes ──► override.granted
//!        │ no
//!   RolePermissionMap[role] contains (resource, action)?
//!        ▲
//!     [Cache] ── invalidate_cache()
//! ```
//!
//! Role grants are read on every check and rarely change, so they are
//! cached. Overrides must take effect immediately and are always read live.

pub mod cache;

pub use cache::{CacheStats, RolePermissionCache, RolePermissionMap};

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AuthzConfig;
use crate::error::{AuthzError, Result};
use crate::store::Repositories;
use crate::types::{
    EffectivePermission, Membership, Permission, PermissionAction, PermissionCheck, PermissionResource, Role,
    UserPermissionOverride,
};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cache the role -> capability map between checks
    pub enable_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { enable_cache: true }
    }
}

impl From<&AuthzConfig> for EngineConfig {
    fn from(config: &AuthzConfig) -> Self {
        Self {
            enable_cache: config.enable_cache,
        }
    }
}

/// Decides what a user may do inside an organization
pub struct PermissionEngine {
    repos: Repositories,
    cache: RolePermissionCache,
    config: EngineConfig,
}

impl PermissionEngine {
    /// Create a new engine over the given repositories
    pub fn new(config: EngineConfig, repos: Repositories) -> Self {
        info!("PermissionEngine initialized with cache={}", config.enable_cache);

        Self {
            repos,
            cache: RolePermissionCache::new(),
            config,
        }
    }

    /// Role of a user in an organization, if they are a member
    pub async fn membership_role(&self, user_id: &str, organization_id: &str) -> Result<Option<Role>> {
        Ok(self
            .repos
            .memberships
            .find(user_id, organization_id)
            .await?
            .map(|m| m.role))
    }

    /// Every organization a user belongs to, with their role in each
    pub async fn user_memberships(&self, user_id: &str) -> Result<Vec<Membership>> {
        let mut memberships = self.repos.memberships.list_for_user(user_id).await?;
        memberships.sort_by(|a, b| a.organization_id.cmp(&b.organization_id));
        Ok(memberships)
    }

    /// Check whether a user holds a capability within an organization.
    ///
    /// Non-members hold nothing, overrides notwithstanding. An override row
    /// for the exact permission is terminal. Otherwise the membership role's
    /// default grants decide.
    pub async fn has_permission(
        &self,
        user_id: &str,
        organization_id: &str,
        resource: PermissionResource,
        action: PermissionAction,
    ) -> Result<bool> {
        let check = PermissionCheck::new(resource, action);

        let Some(role) = self.membership_role(user_id, organization_id).await? else {
            debug!("has_permission: user={} org={} {} -> not a member", user_id, organization_id, check);
            return Ok(false);
        };

        self.member_has_permission(user_id, organization_id, role, check).await
    }

    /// [`has_permission`](Self::has_permission) for a caller whose
    /// membership `role` has already been resolved
    pub(crate) async fn member_has_permission(
        &self,
        user_id: &str,
        organization_id: &str,
        role: Role,
        check: PermissionCheck,
    ) -> Result<bool> {
        if let Some(permission) = self.repos.permissions.find_by_check(check).await? {
            if let Some(entry) = self
                .repos
                .overrides
                .find(user_id, organization_id, &permission.id)
                .await?
            {
                debug!(
                    "has_permission: user={} org={} {} -> override granted={}",
                    user_id, organization_id, check, entry.granted
                );
                return Ok(entry.granted);
            }
        }

        let granted = self.role_map().await?.grants(role, &check);
        debug!(
            "has_permission: user={} org={} {} -> role {} granted={}",
            user_id, organization_id, check, role, granted
        );
        Ok(granted)
    }

    /// Full decision table for a member: every catalog permission with its
    /// effective grant. Non-members get an empty table.
    pub async fn effective_permissions(
        &self,
        user_id: &str,
        organization_id: &str,
    ) -> Result<Vec<EffectivePermission>> {
        let Some(role) = self.membership_role(user_id, organization_id).await? else {
            return Ok(Vec::new());
        };

        let catalog = self.all_permissions().await?;
        let role_grants = self.role_map().await?.for_role(role);

        let overrides: HashMap<String, bool> = self
            .repos
            .overrides
            .list_for_member(user_id, organization_id)
            .await?
            .into_iter()
            .map(|o| (o.permission_id, o.granted))
            .collect();

        Ok(catalog
            .into_iter()
            .map(|permission| {
                let granted = overrides
                    .get(&permission.id)
                    .copied()
                    .unwrap_or_else(|| role_grants.contains(&permission.check()));

                EffectivePermission {
                    resource: permission.resource,
                    action: permission.action,
                    granted,
                }
            })
            .collect())
    }

    /// Capability set of a role, populating the cache on first use
    pub async fn role_permissions(&self, role: Role) -> Result<HashSet<PermissionCheck>> {
        Ok(self.role_map().await?.for_role(role))
    }

    /// The whole catalog, sorted by resource then action
    pub async fn all_permissions(&self) -> Result<Vec<Permission>> {
        let mut catalog = self.repos.permissions.list().await?;
        catalog.sort_by_key(|p| (p.resource, p.action));
        Ok(catalog)
    }

    /// Drop the cached role map.
    ///
    /// Must be called by whoever changes role grants; nothing else refreshes it.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
        info!("Role permission cache invalidated");
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Grant a permission to a user in an organization, regardless of role
    pub async fn grant_override(
        &self,
        user_id: &str,
        organization_id: &str,
        permission_id: &str,
    ) -> Result<UserPermissionOverride> {
        self.set_override(user_id, organization_id, permission_id, true).await
    }

    /// Deny a permission to a user in an organization, regardless of role
    pub async fn deny_override(
        &self,
        user_id: &str,
        organization_id: &str,
        permission_id: &str,
    ) -> Result<UserPermissionOverride> {
        self.set_override(user_id, organization_id, permission_id, false).await
    }

    /// Remove an override so the role-derived value applies again
    pub async fn remove_override(
        &self,
        user_id: &str,
        organization_id: &str,
        permission_id: &str,
    ) -> Result<()> {
        let removed = self
            .repos
            .overrides
            .delete(user_id, organization_id, permission_id)
            .await?;

        info!(
            "Override removed: user={} org={} permission={} existed={}",
            user_id, organization_id, permission_id, removed
        );
        Ok(())
    }

    async fn set_override(
        &self,
        user_id: &str,
        organization_id: &str,
        permission_id: &str,
        granted: bool,
    ) -> Result<UserPermissionOverride> {
        let permission = self
            .repos
            .permissions
            .find(permission_id)
            .await?
            .ok_or_else(|| AuthzError::NotFound(format!("permission '{}'", permission_id)))?;

        let stored = self
            .repos
            .overrides
            .upsert(UserPermissionOverride {
                user_id: user_id.to_string(),
                organization_id: organization_id.to_string(),
                permission_id: permission.id.clone(),
                granted,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            "Override set: user={} org={} permission={} granted={}",
            user_id,
            organization_id,
            permission.check(),
            granted
        );
        Ok(stored)
    }

    async fn role_map(&self) -> Result<Arc<RolePermissionMap>> {
        if self.config.enable_cache {
            self.cache.get_or_load(|| self.load_role_map()).await
        } else {
            Ok(Arc::new(self.load_role_map().await?))
        }
    }

    async fn load_role_map(&self) -> Result<RolePermissionMap> {
        let rows = self.repos.role_permissions.list_with_permissions().await?;
        debug!("Loaded {} role permission rows", rows.len());
        Ok(RolePermissionMap::from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_defaults;
    use crate::store::{InMemoryStore, MembershipStore, PermissionStore};

    async fn seeded_engine(config: EngineConfig) -> (PermissionEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        seed_defaults(store.as_ref()).await.unwrap();
        let engine = PermissionEngine::new(config, Repositories::from_shared(store.clone()));
        (engine, store)
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let (engine, _) = seeded_engine(EngineConfig::default()).await;
        assert!(!engine.cache_stats().populated);
        assert_eq!(engine.all_permissions().await.unwrap().len(), 17);
    }

    #[tokio::test]
    async fn test_all_permissions_sorted() {
        let (engine, _) = seeded_engine(EngineConfig::default()).await;
        let catalog = engine.all_permissions().await.unwrap();
        let keys: Vec<_> = catalog.iter().map(|p| (p.resource, p.action)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(catalog[0].check().to_string(), "TASK:CREATE");
    }

    #[tokio::test]
    async fn test_uncached_engine_does_not_populate_cache() {
        let (engine, store) = seeded_engine(EngineConfig { enable_cache: false }).await;
        store.save(Membership::new("u1", "o1", Role::Viewer)).await.unwrap();

        assert!(engine
            .has_permission("u1", "o1", PermissionResource::Task, PermissionAction::Read)
            .await
            .unwrap());
        assert!(!engine.cache_stats().populated);
    }

    #[tokio::test]
    async fn test_override_unknown_permission_is_not_found() {
        let (engine, _) = seeded_engine(EngineConfig::default()).await;
        let err = engine.grant_override("u1", "o1", "no-such-permission").await.unwrap_err();
        assert!(matches!(err, AuthzError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_override_row_references_permission() {
        let (engine, store) = seeded_engine(EngineConfig::default()).await;
        let task_delete = store
            .find_by_check(PermissionCheck::new(PermissionResource::Task, PermissionAction::Delete))
            .await
            .unwrap()
            .unwrap();

        let granted = engine.grant_override("u1", "o1", &task_delete.id).await.unwrap();
        assert_eq!(granted.permission_id, task_delete.id);
        assert!(granted.granted);

        let denied = engine.deny_override("u1", "o1", &task_delete.id).await.unwrap();
        assert_eq!(denied.permission_id, task_delete.id);
        assert!(!denied.granted);
    }

    #[tokio::test]
    async fn test_user_memberships_lists_every_organization() {
        let (engine, store) = seeded_engine(EngineConfig::default()).await;
        store.save(Membership::new("u1", "o2", Role::Owner)).await.unwrap();
        store.save(Membership::new("u1", "o1", Role::Viewer)).await.unwrap();
        store.save(Membership::new("u2", "o1", Role::Admin)).await.unwrap();

        let memberships = engine.user_memberships("u1").await.unwrap();
        let orgs: Vec<(&str, Role)> = memberships
            .iter()
            .map(|m| (m.organization_id.as_str(), m.role))
            .collect();
        assert_eq!(orgs, vec![("o1", Role::Viewer), ("o2", Role::Owner)]);

        assert!(engine.user_memberships("nobody").await.unwrap().is_empty());
    }
}
