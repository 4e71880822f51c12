//! Default permission catalog and role grants
//!
//! OWNER holds every permission. ADMIN holds all but organization deletion,
//! organization management and member removal. VIEWER is read-mostly (task
//! updates are narrowed further by the task service).

use tracing::info;

use crate::error::Result;
use crate::store::{PermissionStore, RolePermissionStore};
use crate::types::{Permission, PermissionAction as A, PermissionCheck, PermissionResource as R, Role, RolePermission};

/// (resource, action, name, description)
const DEFAULT_PERMISSIONS: &[(R, A, &str, &str)] = &[
    (R::Task, A::Create, "Create Tasks", "Create new tasks in the organization"),
    (R::Task, A::Read, "Read Tasks", "View tasks in the organization"),
    (R::Task, A::Update, "Update Tasks", "Edit existing tasks"),
    (R::Task, A::Delete, "Delete Tasks", "Delete tasks (soft delete)"),
    (R::Task, A::Restore, "Restore Tasks", "Restore soft-deleted tasks"),
    (R::Organization, A::Read, "Read Organization", "View organization details"),
    (R::Organization, A::Update, "Update Organization", "Edit organization settings"),
    (R::Organization, A::Delete, "Delete Organization", "Delete the organization"),
    (R::Organization, A::Manage, "Manage Organization", "Full organization management"),
    (R::Member, A::Read, "Read Members", "View organization members"),
    (R::Member, A::Update, "Update Members", "Change member roles"),
    (R::Member, A::Delete, "Delete Members", "Remove members from organization"),
    (R::Member, A::Invite, "Invite Members", "Invite new members"),
    (R::AuditLog, A::Read, "Read Audit Logs", "View audit logs"),
    (R::Invitation, A::Create, "Create Invitations", "Create new invitations"),
    (R::Invitation, A::Read, "Read Invitations", "View invitations"),
    (R::Invitation, A::Delete, "Delete Invitations", "Cancel/delete invitations"),
];

const ADMIN_EXCLUDED: &[(R, A)] = &[
    (R::Organization, A::Delete),
    (R::Organization, A::Manage),
    (R::Member, A::Delete),
];

const VIEWER_GRANTS: &[(R, A)] = &[
    (R::Task, A::Read),
    (R::Task, A::Update),
    (R::Organization, A::Read),
    (R::Member, A::Read),
    (R::Invitation, A::Read),
];

/// Default capability set of a role
pub fn default_grants(role: Role) -> Vec<PermissionCheck> {
    let all = DEFAULT_PERMISSIONS
        .iter()
        .map(|(resource, action, _, _)| PermissionCheck::new(*resource, *action));

    match role {
        Role::Owner => all.collect(),
        Role::Admin => all
            .filter(|c| !ADMIN_EXCLUDED.contains(&(c.resource, c.action)))
            .collect(),
        Role::Viewer => VIEWER_GRANTS
            .iter()
            .map(|(resource, action)| PermissionCheck::new(*resource, *action))
            .collect(),
    }
}

/// Seed the catalog and the default role grants.
///
/// Entries already present are left untouched, so running this twice is a
/// no-op the second time. Returns the number of rows inserted.
pub async fn seed_defaults<S>(store: &S) -> Result<usize>
where
    S: PermissionStore + RolePermissionStore,
{
    let mut inserted = 0;

    for (resource, action, name, description) in DEFAULT_PERMISSIONS {
        let check = PermissionCheck::new(*resource, *action);
        if store.find_by_check(check).await?.is_none() {
            PermissionStore::insert(store, Permission::new(*name, *resource, *action).with_description(*description))
                .await?;
            inserted += 1;
        }
    }

    let existing = store.list_with_permissions().await?;

    for role in Role::ALL {
        for check in default_grants(role) {
            if existing.contains(&(role, check)) {
                continue;
            }
            let Some(permission) = store.find_by_check(check).await? else {
                continue;
            };
            RolePermissionStore::insert(
                store,
                RolePermission {
                    role,
                    permission_id: permission.id,
                },
            )
            .await?;
            inserted += 1;
        }
    }

    info!("Seeded default permission catalog ({} rows inserted)", inserted);
    Ok(inserted)
}
