//! Log subscriber setup

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use posemirror_core::{MirrorError, MirrorResult};

use crate::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` overrides `config.filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> MirrorResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| MirrorError::InvalidConfig(format!("log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| MirrorError::InvalidConfig(format!("log subscriber: {}", e)))
}
