//! Authorization configuration
//!
//! Environment variables:
//! - `AUTHZ_ENABLE_CACHE` - cache role grants between checks (default: true)
//! - `AUTHZ_ENABLE_AUDIT` - persist audit entries for mutations (default: true)
//! - `AUTHZ_AUDIT_REDACTED_FIELDS` - comma separated body keys stripped from
//!   audit details (default: password,token)
//! - `RUST_LOG` - log filter (default: info)

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Cache the role -> capability map
    pub enable_cache: bool,

    /// Record audit entries for successful mutations
    pub enable_audit: bool,

    /// Top-level body keys never written to the audit log
    pub audit_redacted_fields: Vec<String>,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub log_level: String,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            enable_audit: true,
            audit_redacted_fields: vec!["password".to_string(), "token".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl AuthzConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enable_cache = lookup("AUTHZ_ENABLE_CACHE")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.enable_cache);

        let enable_audit = lookup("AUTHZ_ENABLE_AUDIT")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.enable_audit);

        let audit_redacted_fields = lookup("AUTHZ_AUDIT_REDACTED_FIELDS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.audit_redacted_fields);

        let log_level = lookup("RUST_LOG")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_level);

        Self {
            enable_cache,
            enable_audit,
            audit_redacted_fields,
            log_level,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
