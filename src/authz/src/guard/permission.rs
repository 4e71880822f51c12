//! Permission guard

use std::sync::Arc;
use tracing::debug;

use super::{deny, resolve_member};
use crate::context::RequestContext;
use crate::engine::PermissionEngine;
use crate::error::{DenyReason, Result};
use crate::types::PermissionCheck;

/// Allows members holding any one of the listed capabilities
#[derive(Clone)]
pub struct PermissionGuard {
    engine: Arc<PermissionEngine>,
}

impl PermissionGuard {
    pub fn new(engine: Arc<PermissionEngine>) -> Self {
        Self { engine }
    }

    /// Check `request` against the acceptable capabilities, in order.
    ///
    /// The first one the member holds decides; it is attached to the request
    /// along with the organization id. No listed capabilities allows
    /// unconditionally.
    pub async fn check(&self, required: &[PermissionCheck], request: &mut RequestContext) -> Result<()> {
        if required.is_empty() {
            return Ok(());
        }

        let member = resolve_member(&self.engine, request).await?;

        for permission in required {
            let granted = self
                .engine
                .member_has_permission(&member.user_id, &member.organization_id, member.role, *permission)
                .await?;

            if granted {
                debug!(
                    "Permission guard allowed user={} org={} via {}",
                    member.user_id, member.organization_id, permission
                );
                request.auth.organization_id = Some(member.organization_id);
                request.auth.matched_permission = Some(*permission);
                return Ok(());
            }
        }

        let names: Vec<String> = required.iter().map(PermissionCheck::to_string).collect();
        Err(deny(
            request,
            DenyReason::InsufficientPermissions,
            format!("Insufficient permissions. Required: {}", names.join(" or ")),
        ))
    }
}
