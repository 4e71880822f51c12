//! Role-hierarchy guard

use std::sync::Arc;
use tracing::debug;

use super::{deny, resolve_member};
use crate::context::RequestContext;
use crate::engine::PermissionEngine;
use crate::error::{DenyReason, Result};
use crate::hierarchy;
use crate::types::Role;

/// Allows members whose role reaches the lowest of the listed roles
#[derive(Clone)]
pub struct RoleGuard {
    engine: Arc<PermissionEngine>,
}

impl RoleGuard {
    pub fn new(engine: Arc<PermissionEngine>) -> Self {
        Self { engine }
    }

    /// Check `request` against the acceptable roles.
    ///
    /// No listed roles allows unconditionally. On success the organization
    /// id and the member's role are attached to the request.
    pub async fn check(&self, required: &[Role], request: &mut RequestContext) -> Result<()> {
        if required.is_empty() {
            return Ok(());
        }

        let member = resolve_member(&self.engine, request).await?;

        if !hierarchy::satisfies(member.role, required) {
            let required_names: Vec<&str> = required.iter().map(Role::as_str).collect();
            return Err(deny(
                request,
                DenyReason::InsufficientPermissions,
                format!(
                    "Insufficient permissions. Required: {}, Current: {}",
                    required_names.join(" or "),
                    member.role
                ),
            ));
        }

        debug!(
            "Role guard allowed user={} org={} role={}",
            member.user_id, member.organization_id, member.role
        );

        request.auth.organization_id = Some(member.organization_id);
        request.auth.role = Some(member.role);
        Ok(())
    }
}
