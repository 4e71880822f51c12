//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AuthzConfig;
use crate::error::{AuthzError, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if a global subscriber
/// is already set.
pub fn init_tracing(config: &AuthzConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| AuthzError::InvalidInput(format!("invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| AuthzError::Internal(format!("tracing already initialized: {}", e)))
}
