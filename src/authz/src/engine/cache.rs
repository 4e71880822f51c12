//! Role -> capability cache
//!
//! Lazily populated on first use, dropped by `invalidate`, never revalidated
//! on its own (no TTL). Concurrent rebuilds are allowed: the load is
//! deterministic, so two racers produce the same map. A generation counter
//! keeps a rebuild that started before an invalidation from installing its
//! result afterwards.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::types::{PermissionCheck, Role};

/// Capability set per role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionMap {
    grants: HashMap<Role, HashSet<PermissionCheck>>,
}

impl RolePermissionMap {
    /// Build the map from joined (role, permission) rows
    pub fn from_rows(rows: impl IntoIterator<Item = (Role, PermissionCheck)>) -> Self {
        let mut grants: HashMap<Role, HashSet<PermissionCheck>> = HashMap::new();
        for (role, check) in rows {
            grants.entry(role).or_default().insert(check);
        }
        Self { grants }
    }

    /// Whether `role` is granted `check`
    pub fn grants(&self, role: Role, check: &PermissionCheck) -> bool {
        self.grants
            .get(&role)
            .map(|set| set.contains(check))
            .unwrap_or(false)
    }

    /// Capability set of a role (empty if the role has no grants)
    pub fn for_role(&self, role: Role) -> HashSet<PermissionCheck> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cached map
    pub hits: usize,
    /// Lookups that had to rebuild the map
    pub loads: usize,
    /// Calls to `invalidate`
    pub invalidations: usize,
    /// Whether a map is currently cached
    pub populated: bool,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.loads;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Explicit get-or-populate / invalidate cache owned by the engine
#[derive(Default)]
pub struct RolePermissionCache {
    slot: RwLock<Option<Arc<RolePermissionMap>>>,
    generation: AtomicU64,
    hits: AtomicUsize,
    loads: AtomicUsize,
    invalidations: AtomicUsize,
}

impl RolePermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached map, or run `load` and cache its result.
    ///
    /// A failed load caches nothing and the error goes to the caller.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<RolePermissionMap>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RolePermissionMap>>,
    {
        let cached = self.slot.read().clone();
        if let Some(map) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(map);
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let generation = self.generation.load(Ordering::Acquire);
        let map = Arc::new(load().await?);

        let mut slot = self.slot.write();
        if self.generation.load(Ordering::Acquire) == generation && slot.is_none() {
            *slot = Some(map.clone());
        }

        Ok(map)
    }

    /// Drop the cached map; the next lookup rebuilds it
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.slot.write() = None;
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            populated: self.slot.read().is_some(),
        }
    }
}
