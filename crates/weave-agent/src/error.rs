//! The Agent Frontend's error type: configuration-string grammar failures,
//! layered over the same [`weave_core::InstrumentationError`] every other
//! crate boundary in this workspace rolls up into (§7).

use thiserror::Error;
use weave_core::InstrumentationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("setup '{setup}' has no handler name before ':' or '='")]
    MissingHandlerName { setup: String },

    #[error("spawner reference '{reference}' has no '.'-separated method name")]
    MalformedSpawnerReference { reference: String },

    #[error(transparent)]
    Instrumentation(#[from] InstrumentationError),
}
