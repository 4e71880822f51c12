//! Operation dispatch
//!
//! Every protected operation passes through [`Dispatcher::dispatch`]:
//! the declared requirement is checked, the handler runs, and only a
//! successful handler result triggers the audit hook. The hook is detached;
//! its outcome never reaches the caller.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::audit::AuditRecorder;
use crate::context::RequestContext;
use crate::engine::PermissionEngine;
use crate::error::Result;
use crate::guard::{GuardPipeline, RequirementRegistry};

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<RequirementRegistry>,
    guards: GuardPipeline,
    audit: Option<Arc<AuditRecorder>>,
}

impl Dispatcher {
    pub fn new(registry: RequirementRegistry, engine: Arc<PermissionEngine>) -> Self {
        Self {
            registry: Arc::new(registry),
            guards: GuardPipeline::new(engine),
            audit: None,
        }
    }

    /// Attach the post-commit audit hook
    pub fn with_audit(mut self, recorder: Arc<AuditRecorder>) -> Self {
        self.audit = Some(recorder);
        self
    }

    pub fn registry(&self) -> &RequirementRegistry {
        &self.registry
    }

    /// Authorize `request` for `operation`, then run `handler`.
    ///
    /// A denied request never reaches the handler. Handler errors are
    /// returned unchanged and are not audited.
    #[instrument(skip(self, request, handler), fields(method = %request.method, path = %request.path))]
    pub async fn dispatch<T, F, Fut>(&self, operation: &str, mut request: RequestContext, handler: F) -> Result<T>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let requirement = self.registry.requirement(operation);
        self.guards.authorize(requirement, &mut request).await?;

        let output = handler(request.clone()).await?;

        if let Some(audit) = &self.audit {
            if audit.record(&request).is_some() {
                debug!("Audit scheduled for {}", operation);
            }
        }

        Ok(output)
    }
}
