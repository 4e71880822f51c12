//! Audit trail for mutating operations
//!
//! The recorder runs after an operation has succeeded. It assembles an
//! [`AuditLogEntry`] from the request and persists it on a detached task.
//! The caller never waits on the write and never sees its outcome: failures
//! are logged here and dropped, with no retry.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::AuthzConfig;
use crate::context::{audit_organization_id, RequestContext};
use crate::error::Result;
use crate::store::AuditLogStore;
use crate::types::AuditLogEntry;

/// Best-effort audit recorder
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditLogStore>,
    redacted_fields: Arc<Vec<String>>,
    enabled: bool,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditLogStore>, config: &AuthzConfig) -> Self {
        Self {
            store,
            redacted_fields: Arc::new(config.audit_redacted_fields.clone()),
            enabled: config.enable_audit,
        }
    }

    /// Whether a completed request qualifies for an audit entry:
    /// mutating verb and an authenticated principal.
    pub fn should_record(&self, request: &RequestContext) -> bool {
        self.enabled && request.method.is_mutating() && request.principal.is_some()
    }

    /// Assemble the entry for a completed request, if it qualifies
    pub fn build_entry(&self, request: &RequestContext) -> Option<AuditLogEntry> {
        if !self.should_record(request) {
            return None;
        }

        let principal = request.principal.as_ref()?;

        let params: Map<String, Value> = request
            .path_params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let mut details = Map::new();
        details.insert("body".to_string(), sanitize_body(&request.body, &self.redacted_fields));
        details.insert("params".to_string(), Value::Object(params));

        Some(AuditLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: principal.id.clone(),
            action: request.method.as_str().to_string(),
            resource: request.path.clone(),
            organization_id: audit_organization_id(request),
            details: Value::Object(details),
            timestamp: Utc::now(),
        })
    }

    /// Persist an entry for a successfully completed request on a detached task.
    ///
    /// Returns `None` when the request does not qualify, or when there is no
    /// Tokio runtime to run the write on (the entry is dropped and logged).
    /// Dropping the handle does not cancel the write.
    pub fn record(&self, request: &RequestContext) -> Option<JoinHandle<()>> {
        let entry = self.build_entry(request)?;

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(
                    "Failed to create audit log for {} {} by {}: {}",
                    entry.action, entry.resource, entry.user_id, e
                );
                return None;
            }
        };

        let store = self.store.clone();
        Some(runtime.spawn(async move {
            let (user_id, action, resource) = (entry.user_id.clone(), entry.action.clone(), entry.resource.clone());
            match store.insert(entry).await {
                Ok(stored) => debug!("Audit entry {} recorded: {} {} by {}", stored.id, action, resource, user_id),
                Err(e) => error!("Failed to create audit log for {} {} by {}: {}", action, resource, user_id, e),
            }
        }))
    }

    /// Audit entries of an organization, newest first
    pub async fn find_by_organization(&self, organization_id: &str) -> Result<Vec<AuditLogEntry>> {
        self.store.list_by_organization(organization_id).await
    }
}

/// Copy of `body` without the redacted top-level keys.
///
/// Nested values are kept as they are. A missing body becomes `{}`.
pub fn sanitize_body(body: &Value, redacted: &[String]) -> Value {
    match body {
        Value::Null => Value::Object(Map::new()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(key, _)| !redacted.iter().any(|r| r == *key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Method;
    use crate::store::InMemoryStore;
    use crate::types::Principal;
    use serde_json::json;

    fn redacted() -> Vec<String> {
        AuthzConfig::default().audit_redacted_fields
    }

    fn recorder() -> (AuditRecorder, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (AuditRecorder::new(store.clone(), &AuthzConfig::default()), store)
    }

    #[test]
    fn test_sanitize_strips_password_and_token_only() {
        let body = json!({
            "title": "Ship it",
            "password": "hunter2",
            "token": "abc",
            "meta": { "password": "nested stays", "tags": ["a", "b"] }
        });

        let clean = sanitize_body(&body, &redacted());
        assert_eq!(
            clean,
            json!({
                "title": "Ship it",
                "meta": { "password": "nested stays", "tags": ["a", "b"] }
            })
        );
    }

    #[test]
    fn test_sanitize_missing_body_is_empty_object() {
        assert_eq!(sanitize_body(&Value::Null, &redacted()), json!({}));
        assert_eq!(sanitize_body(&json!([1, 2]), &redacted()), json!([1, 2]));
    }

    #[test]
    fn test_entry_shape() {
        let (recorder, _) = recorder();
        let mut request = RequestContext::new(Method::Put, "/tasks/t1")
            .with_principal(Principal::new("u1", "u1@example.com"))
            .with_path_param("id", "t1")
            .with_body(json!({ "status": "DONE", "token": "secret" }));
        request.auth.organization_id = Some("o1".to_string());

        let entry = recorder.build_entry(&request).unwrap();
        assert_eq!(entry.user_id, "u1");
        assert_eq!(entry.action, "PUT");
        assert_eq!(entry.resource, "/tasks/t1");
        assert_eq!(entry.organization_id.as_deref(), Some("o1"));
        assert_eq!(
            entry.details,
            json!({ "body": { "status": "DONE" }, "params": { "id": "t1" } })
        );
    }

    #[test]
    fn test_reads_and_anonymous_requests_do_not_qualify() {
        let (recorder, _) = recorder();

        let read = RequestContext::new(Method::Get, "/tasks").with_principal(Principal::new("u1", "u1@example.com"));
        assert!(recorder.build_entry(&read).is_none());

        let anonymous = RequestContext::new(Method::Post, "/auth/register");
        assert!(recorder.build_entry(&anonymous).is_none());
    }

    #[tokio::test]
    async fn test_disabled_recorder_records_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let config = AuthzConfig {
            enable_audit: false,
            ..Default::default()
        };
        let recorder = AuditRecorder::new(store, &config);

        let request = RequestContext::new(Method::Post, "/tasks")
            .with_principal(Principal::new("u1", "u1@example.com"))
            .with_body(json!({ "organizationId": "o1" }));
        assert!(recorder.record(&request).is_none());
    }

    #[tokio::test]
    async fn test_record_persists_in_background() {
        let (recorder, _) = recorder();
        let request = RequestContext::new(Method::Delete, "/tasks/t1")
            .with_principal(Principal::new("u1", "u1@example.com"))
            .with_query("organizationId", "o1");

        recorder.record(&request).unwrap().await.unwrap();

        let entries = recorder.find_by_organization("o1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "DELETE");
    }

    #[test]
    fn test_record_without_runtime_drops_entry() {
        let (recorder, _) = recorder();
        let request = RequestContext::new(Method::Post, "/tasks")
            .with_principal(Principal::new("u1", "u1@example.com"))
            .with_body(json!({ "organizationId": "o1" }));

        assert!(recorder.build_entry(&request).is_some());
        assert!(recorder.record(&request).is_none());
    }
}
