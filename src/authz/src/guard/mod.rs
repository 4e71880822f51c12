//! Authorization guards
//!
//! Two variants share authentication, organization extraction and
//! membership lookup, then diverge:
//!
//! - [`RoleGuard`]: the member's role must reach the lowest listed role
//!   (hierarchy floor).
//! - [`PermissionGuard`]: any one of the listed capabilities suffices
//!   (first match wins, later ones are not evaluated).
//!
//! Guards only read. Their sole side effect is the [`AuthContext`] they
//! attach to the request.
//!
//! [`AuthContext`]: crate::context::AuthContext

pub mod permission;
pub mod requirements;
pub mod role;

pub use permission::PermissionGuard;
pub use requirements::{Requirement, RequirementRegistry};
pub use role::RoleGuard;

use std::sync::Arc;
use tracing::warn;

use crate::context::{extract_organization_id, RequestContext};
use crate::engine::PermissionEngine;
use crate::error::{AuthzError, DenyReason, Result};
use crate::types::{OrganizationId, Role, UserId};

/// Runs whichever guard a requirement calls for
#[derive(Clone)]
pub struct GuardPipeline {
    role_guard: RoleGuard,
    permission_guard: PermissionGuard,
}

impl GuardPipeline {
    pub fn new(engine: Arc<PermissionEngine>) -> Self {
        Self {
            role_guard: RoleGuard::new(engine.clone()),
            permission_guard: PermissionGuard::new(engine),
        }
    }

    /// Allow or reject `request` against `requirement`.
    ///
    /// On success the resolved context is attached to `request.auth`.
    pub async fn authorize(&self, requirement: &Requirement, request: &mut RequestContext) -> Result<()> {
        match requirement {
            Requirement::None => Ok(()),
            Requirement::Roles(roles) => self.role_guard.check(roles, request).await,
            Requirement::Permissions(permissions) => self.permission_guard.check(permissions, request).await,
        }
    }
}

/// Principal, organization and role every guard resolves before deciding
struct MemberScope {
    user_id: UserId,
    organization_id: OrganizationId,
    role: Role,
}

/// Shared preconditions: authenticated, organization named, member of it
async fn resolve_member(engine: &PermissionEngine, request: &RequestContext) -> Result<MemberScope> {
    let Some(principal) = request.principal.as_ref() else {
        return Err(deny(request, DenyReason::AuthenticationRequired, "Authentication required"));
    };

    let Some(organization_id) = extract_organization_id(request) else {
        return Err(deny(
            request,
            DenyReason::OrganizationContextRequired,
            "Organization context required",
        ));
    };

    let Some(role) = engine.membership_role(&principal.id, &organization_id).await? else {
        return Err(deny(
            request,
            DenyReason::NotAMember,
            "User is not a member of this organization",
        ));
    };

    Ok(MemberScope {
        user_id: principal.id.clone(),
        organization_id,
        role,
    })
}

fn deny(request: &RequestContext, reason: DenyReason, message: impl Into<String>) -> AuthzError {
    let message = message.into();
    warn!(
        method = %request.method,
        path = %request.path,
        user = request.principal.as_ref().map(|p| p.id.as_str()).unwrap_or("-"),
        reason = %reason,
        "Access denied: {}",
        message
    );
    AuthzError::forbidden(reason, message)
}
