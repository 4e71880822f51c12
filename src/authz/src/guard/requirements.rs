//! Declared access requirements per operation
//!
//! Each operation declares either acceptable roles or acceptable
//! capabilities. The registry is built once at startup and read by the
//! dispatcher; operations that declare nothing are unrestricted.

use std::collections::HashMap;

use crate::types::{PermissionAction, PermissionCheck, PermissionResource, Role};

/// What an operation requires of its caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Requirement {
    /// No restriction
    #[default]
    None,

    /// Role hierarchy floor: the lowest listed role and anything above it
    Roles(Vec<Role>),

    /// Any one of the listed capabilities
    Permissions(Vec<PermissionCheck>),
}

impl Requirement {
    /// Require at least one of `roles` (in hierarchy terms, the lowest)
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Requirement::Roles(roles.into_iter().collect())
    }

    /// Require a single capability
    pub fn permission(resource: PermissionResource, action: PermissionAction) -> Self {
        Requirement::Permissions(vec![PermissionCheck::new(resource, action)])
    }

    /// Require any one of several capabilities
    pub fn any_permission(permissions: impl IntoIterator<Item = PermissionCheck>) -> Self {
        Requirement::Permissions(permissions.into_iter().collect())
    }

    /// Whether a guard will run at all
    pub fn is_restricted(&self) -> bool {
        match self {
            Requirement::None => false,
            Requirement::Roles(roles) => !roles.is_empty(),
            Requirement::Permissions(permissions) => !permissions.is_empty(),
        }
    }
}

/// Operation id -> requirement
#[derive(Debug, Clone, Default)]
pub struct RequirementRegistry {
    entries: HashMap<String, Requirement>,
}

impl RequirementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the requirement for an operation, replacing any earlier one
    pub fn register(&mut self, operation: impl Into<String>, requirement: Requirement) -> &mut Self {
        self.entries.insert(operation.into(), requirement);
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, operation: impl Into<String>, requirement: Requirement) -> Self {
        self.register(operation, requirement);
        self
    }

    /// Requirement for an operation; undeclared operations are unrestricted
    pub fn requirement(&self, operation: &str) -> &Requirement {
        const UNRESTRICTED: &Requirement = &Requirement::None;
        self.entries.get(operation).unwrap_or(UNRESTRICTED)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_operation_is_unrestricted() {
        let registry = RequirementRegistry::new().with("tasks.create", Requirement::roles([Role::Admin]));

        assert_eq!(registry.requirement("tasks.list"), &Requirement::None);
        assert!(!registry.requirement("tasks.list").is_restricted());
        assert!(registry.requirement("tasks.create").is_restricted());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RequirementRegistry::new();
        registry
            .register("tasks.delete", Requirement::roles([Role::Owner]))
            .register(
                "tasks.delete",
                Requirement::any_permission([
                    PermissionCheck::new(PermissionResource::Task, PermissionAction::Delete),
                    PermissionCheck::new(PermissionResource::Task, PermissionAction::Manage),
                ]),
            );

        assert_eq!(registry.len(), 1);
        assert!(matches!(registry.requirement("tasks.delete"), Requirement::Permissions(p) if p.len() == 2));
    }

    #[test]
    fn test_empty_lists_are_unrestricted() {
        assert!(!Requirement::Roles(vec![]).is_restricted());
        assert!(!Requirement::Permissions(vec![]).is_restricted());
    }
}
