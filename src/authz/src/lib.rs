//! # Tenancy Authorization
//!
//! Organization-scoped access control for multi-tenant services.
//!
//! ## Features
//!
//! - **Role hierarchy** VIEWER < ADMIN < OWNER with floor semantics
//! - **Fine-grained capabilities** as (resource, action) pairs, granted per role
//! - **Per-user overrides** that grant or deny a single capability in one organization
//! - **Cached role map** with explicit invalidation
//! - **Request guards** that resolve the organization and membership before every operation
//! - **Best-effort audit trail** for successful mutations, off the request path
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tenancy_authz::{
//!     seed_defaults, EngineConfig, InMemoryStore, Membership, MembershipStore, PermissionAction,
//!     PermissionEngine, PermissionResource, Repositories, Role,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     seed_defaults(&*store).await?;
//!     store.save(Membership::new("alice", "acme", Role::Admin)).await?;
//!
//!     let engine = PermissionEngine::new(EngineConfig::default(), Repositories::from_shared(store));
//!
//!     if engine
//!         .has_permission("alice", "acme", PermissionResource::Task, PermissionAction::Delete)
//!         .await?
//!     {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod guard;
pub mod hierarchy;
pub mod seed;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use audit::{sanitize_body, AuditRecorder};
pub use config::AuthzConfig;
pub use context::{AuthContext, Method, RequestContext};
pub use dispatch::Dispatcher;
pub use engine::{CacheStats, EngineConfig, PermissionEngine};
pub use error::{AuthzError, DenyReason, Result};
pub use guard::{GuardPipeline, PermissionGuard, Requirement, RequirementRegistry, RoleGuard};
pub use seed::seed_defaults;
pub use store::{
    AuditLogStore, InMemoryStore, MembershipStore, OverrideStore, PermissionStore, Repositories,
    RolePermissionStore,
};
pub use types::{
    AuditLogEntry, EffectivePermission, Membership, OrganizationId, Permission, PermissionAction,
    PermissionCheck, PermissionId, PermissionResource, Principal, Role, RolePermission, UserId,
    UserPermissionOverride,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
