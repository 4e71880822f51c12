//! Core authorization types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// Unique user identifier
pub type UserId = String;

/// Unique organization identifier
pub type OrganizationId = String;

/// Unique permission identifier
pub type PermissionId = String;

/// Authenticated user, as handed over by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier
    pub id: UserId,

    /// Email the principal authenticated with
    pub email: String,
}

impl Principal {
    /// Create a new principal
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// Role a user holds inside one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Viewer,
    Admin,
    Owner,
}

impl Role {
    /// All roles, lowest privilege first
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Admin, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIEWER" => Ok(Role::Viewer),
            "ADMIN" => Ok(Role::Admin),
            "OWNER" => Ok(Role::Owner),
            other => Err(AuthzError::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// Resource a permission applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionResource {
    Task,
    Organization,
    Member,
    AuditLog,
    Invitation,
}

impl PermissionResource {
    pub const ALL: [PermissionResource; 5] = [
        PermissionResource::Task,
        PermissionResource::Organization,
        PermissionResource::Member,
        PermissionResource::AuditLog,
        PermissionResource::Invitation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionResource::Task => "TASK",
            PermissionResource::Organization => "ORGANIZATION",
            PermissionResource::Member => "MEMBER",
            PermissionResource::AuditLog => "AUDIT_LOG",
            PermissionResource::Invitation => "INVITATION",
        }
    }
}

impl fmt::Display for PermissionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionResource {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionResource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AuthzError::InvalidInput(format!("unknown resource '{}'", s)))
    }
}

/// Action a permission allows on its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
    Restore,
    Invite,
    Manage,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 7] = [
        PermissionAction::Create,
        PermissionAction::Read,
        PermissionAction::Update,
        PermissionAction::Delete,
        PermissionAction::Restore,
        PermissionAction::Invite,
        PermissionAction::Manage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Create => "CREATE",
            PermissionAction::Read => "READ",
            PermissionAction::Update => "UPDATE",
            PermissionAction::Delete => "DELETE",
            PermissionAction::Restore => "RESTORE",
            PermissionAction::Invite => "INVITE",
            PermissionAction::Manage => "MANAGE",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AuthzError::InvalidInput(format!("unknown action '{}'", s)))
    }
}

/// A (resource, action) capability pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionCheck {
    pub resource: PermissionResource,
    pub action: PermissionAction,
}

impl PermissionCheck {
    pub fn new(resource: PermissionResource, action: PermissionAction) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for PermissionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for PermissionCheck {
    type Err = AuthzError;

    /// Parses the `RESOURCE:ACTION` form, e.g. `TASK:DELETE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidInput(format!("expected RESOURCE:ACTION, got '{}'", s)))?;
        Ok(Self::new(resource.parse()?, action.parse()?))
    }
}

/// Catalog entry for a capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique permission identifier
    pub id: PermissionId,

    /// Human readable name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub resource: PermissionResource,

    pub action: PermissionAction,
}

impl Permission {
    /// Create a catalog entry with a fresh identifier
    pub fn new(name: impl Into<String>, resource: PermissionResource, action: PermissionAction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            resource,
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The capability this entry describes
    pub fn check(&self) -> PermissionCheck {
        PermissionCheck::new(self.resource, self.action)
    }
}

/// A user's role within one organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
}

impl Membership {
    pub fn new(user_id: impl Into<String>, organization_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            role,
        }
    }
}

/// Default capability grant for a role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: Role,
    pub permission_id: PermissionId,
}

/// Per-user grant or deny that supersedes the role-derived value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub permission_id: PermissionId,

    /// true grants the permission, false denies it
    pub granted: bool,

    pub created_at: DateTime<Utc>,
}

/// Final grant/deny for one capability after override-then-role precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    pub resource: PermissionResource,
    pub action: PermissionAction,
    pub granted: bool,
}

/// Immutable record of a completed mutating operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry ID
    pub id: String,

    /// User who performed the operation
    pub user_id: UserId,

    /// Verb of the operation (POST, PUT, DELETE)
    pub action: String,

    /// Path the operation addressed
    pub resource: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,

    /// Sanitized body and path params
    pub details: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}
