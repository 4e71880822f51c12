//! Role hierarchy: OWNER > ADMIN > VIEWER
//!
//! A higher role inherits everything a lower one may do for hierarchy-style
//! checks. The ordering is an explicit level table, not declaration order.

use crate::types::Role;

/// Privilege level of a role (higher = more privileged)
pub fn level(role: Role) -> u8 {
    match role {
        Role::Viewer => 1,
        Role::Admin => 2,
        Role::Owner => 3,
    }
}

/// Whether `actual` meets a requirement listing the acceptable roles.
///
/// The lowest listed role is the floor; any role at or above it qualifies.
/// An empty requirement list is satisfied by nobody.
pub fn satisfies(actual: Role, required: &[Role]) -> bool {
    match required.iter().copied().map(level).min() {
        Some(floor) => level(actual) >= floor,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_levels_are_strictly_ordered() {
        assert!(level(Role::Viewer) < level(Role::Admin));
        assert!(level(Role::Admin) < level(Role::Owner));
    }

    #[test]
    fn test_owner_satisfies_everything() {
        assert!(satisfies(Role::Owner, &[Role::Owner]));
        assert!(satisfies(Role::Owner, &[Role::Admin]));
        assert!(satisfies(Role::Owner, &[Role::Viewer]));
    }

    #[test]
    fn test_admin_satisfies_admin_and_viewer_only() {
        assert!(satisfies(Role::Admin, &[Role::Admin]));
        assert!(satisfies(Role::Admin, &[Role::Viewer]));
        assert!(!satisfies(Role::Admin, &[Role::Owner]));
    }

    #[test]
    fn test_viewer_satisfies_viewer_only() {
        assert!(satisfies(Role::Viewer, &[Role::Viewer]));
        assert!(!satisfies(Role::Viewer, &[Role::Admin]));
        assert!(!satisfies(Role::Viewer, &[Role::Owner]));
    }

    #[test]
    fn test_lowest_listed_role_is_the_floor() {
        // [OWNER, ADMIN] means "at least ADMIN"
        assert!(satisfies(Role::Admin, &[Role::Owner, Role::Admin]));
        assert!(!satisfies(Role::Viewer, &[Role::Owner, Role::Admin]));
    }

    #[test]
    fn test_empty_requirement_is_never_satisfied() {
        for role in Role::ALL {
            assert!(!satisfies(role, &[]));
        }
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Viewer), Just(Role::Admin), Just(Role::Owner)]
    }

    proptest! {
        #[test]
        fn prop_higher_role_satisfies_lower_floor(actual in any_role(), required in any_role()) {
            prop_assert_eq!(satisfies(actual, &[required]), level(actual) >= level(required));
        }

        #[test]
        fn prop_satisfaction_is_monotonic(
            lower in any_role(),
            higher in any_role(),
            required in proptest::collection::vec(any_role(), 1..4),
        ) {
            prop_assume!(level(higher) >= level(lower));
            if satisfies(lower, &required) {
                prop_assert!(satisfies(higher, &required));
            }
        }
    }
}
