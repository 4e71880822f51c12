//! In-flight request context and organization extraction
//!
//! The transport layer builds a [`RequestContext`] from whatever it received.
//! Guards read it and attach what they resolved ([`AuthContext`]) for the
//! handler and the audit recorder. Nothing attached here is persisted.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::types::{OrganizationId, PermissionCheck, Principal, Role};

/// Request field naming the target organization
pub const ORGANIZATION_ID_KEY: &str = "organizationId";

/// Operation verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Verbs whose successful completion is audited
    pub fn is_mutating(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the guards resolved for this request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub organization_id: Option<OrganizationId>,

    /// Set by the role guard
    pub role: Option<Role>,

    /// Set by the permission guard: the capability that granted access
    pub matched_permission: Option<PermissionCheck>,
}

/// Request as seen by guards, handlers and the audit recorder
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,

    /// Path the request addressed, e.g. `/organizations/o1/tasks`
    pub path: String,

    /// Authenticated principal, if any
    pub principal: Option<Principal>,

    /// Route-bound parameters
    pub path_params: HashMap<String, String>,

    /// Parsed body (`Null` when there is none)
    pub body: Value,

    pub query: HashMap<String, String>,

    pub auth: AuthContext,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            principal: None,
            path_params: HashMap::new(),
            body: Value::Null,
            query: HashMap::new(),
            auth: AuthContext::default(),
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    fn body_organization_id(&self) -> Option<&str> {
        self.body.get(ORGANIZATION_ID_KEY).and_then(Value::as_str)
    }

    fn query_organization_id(&self) -> Option<&str> {
        self.query.get(ORGANIZATION_ID_KEY).map(String::as_str)
    }
}

/// Target organization of a request.
///
/// Route-bound id first, then body, then query; empty values are skipped.
/// The route must win so a caller cannot name a different organization in
/// the body than the one the path addresses.
pub fn extract_organization_id(request: &RequestContext) -> Option<OrganizationId> {
    [
        request.path_params.get(ORGANIZATION_ID_KEY).map(String::as_str),
        request.body_organization_id(),
        request.query_organization_id(),
    ]
    .into_iter()
    .flatten()
    .find(|id| !id.is_empty())
    .map(String::from)
}

/// Organization for the audit record: what a guard attached, else body/query
pub fn audit_organization_id(request: &RequestContext) -> Option<OrganizationId> {
    request.auth.organization_id.clone().or_else(|| {
        [request.body_organization_id(), request.query_organization_id()]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())
            .map(String::from)
    })
}
