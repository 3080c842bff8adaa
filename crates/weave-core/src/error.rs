//! Unified error type for the rewriter (§7).
//!
//! One phase-specific leaf enum per category, rolled up into a single
//! top-level enum; `#[error(...)]` messages name the offending entity.

use thiserror::Error;

/// Errors raised while building an Instrumentation Plan or a Handler Spec:
/// missing plan pieces, a misformed spawner reference, an unresolvable
/// handler interface. Always raised at plan-build time, never deferred to
/// transform time (§4.1, §7).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("handler interface '{interface}' could not be resolved by the ambient loader")]
    UnresolvableHandlerInterface { interface: String },

    #[error(
        "spawner reference '{owner}.{method}' has descriptor '{found}', expected '({handler_type}){handler_type}'"
    )]
    MalformedSpawnerDescriptor {
        owner: String,
        method: String,
        handler_type: String,
        found: String,
    },

    #[error("handlee '{handlee}' has no registered instrumentation in the plan")]
    MissingPlanEntry { handlee: String },

    #[error("spawner owner '{owner}' could not be resolved by the ambient loader")]
    UnresolvableSpawnerOwner { owner: String },

    #[error("spawner owner '{owner}' declares no method named '{method}'")]
    SpawnerMethodNotFound { owner: String, method: String },

    #[error("configuration string is malformed: {detail}")]
    MalformedConfiguration { detail: String },
}

/// Errors raised because the handlee's shape doesn't satisfy the contract an
/// intercepted method must meet, or because a class is instrumented twice.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("intercepted method '{signature}' is declared abstract")]
    AbstractMethodIntercepted { signature: String },

    #[error("intercepted method '{signature}' is declared static")]
    StaticMethodIntercepted { signature: String },

    #[error("intercepted method '{signature}' is native and no native-prefix policy is configured")]
    NativeMethodWithoutPrefix { signature: String },

    #[error("intercepted signature(s) not found on handlee: {}", .signatures.join(", "))]
    UnmatchedSignatures { signatures: Vec<String> },

    #[error("class '{class_name}' has already been instrumented")]
    DuplicateInstrumentation { class_name: String },
}

/// Errors surfaced by the Class-File Codec, wrapped with the class name being
/// decoded or encoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("failed to decode class '{class_name}': {detail}")]
    Decode { class_name: String, detail: String },

    #[error("failed to encode class '{class_name}': {detail}")]
    Encode { class_name: String, detail: String },
}

/// Errors surfaced by the Loader/runtime host: redefining an already-loaded
/// class outside reload mode, or a required dependency's bytes being
/// unavailable from the ambient resource store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeHostError {
    #[error("class '{class_name}' is already defined in the target domain and reload mode is disabled")]
    AlreadyDefined { class_name: String },

    #[error("ambient resource store has no bytes for required class '{class_name}'")]
    MissingAmbientResource { class_name: String },
}

/// The unified error type for the whole rewriter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    RuntimeHost(#[from] RuntimeHostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_offending_name() {
        let err = InstrumentationError::Shape(ShapeError::AbstractMethodIntercepted {
            signature: "call()V".into(),
        });
        assert_eq!(err.to_string(), "intercepted method 'call()V' is declared abstract");
    }

    #[test]
    fn unmatched_signatures_names_every_entry() {
        let err = ShapeError::UnmatchedSignatures {
            signatures: vec!["foo()V".into(), "bar(I)V".into()],
        };
        assert_eq!(err.to_string(), "intercepted signature(s) not found on handlee: foo()V, bar(I)V");
    }

    #[test]
    fn from_conversions_compose_into_top_level_error() {
        let config_err: InstrumentationError = ConfigurationError::MissingPlanEntry {
            handlee: "pkg.Foo".into(),
        }
        .into();
        assert!(matches!(config_err, InstrumentationError::Configuration(_)));
    }
}
