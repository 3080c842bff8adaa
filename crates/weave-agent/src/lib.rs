//! The Agent Frontend (§4.5): parses a configuration string into an
//! Instrumentation Plan, lazily and once, then answers class-load events by
//! transforming plan-covered classes and passing everything else through
//! unchanged.

mod config;
mod error;
mod plan;

use std::sync::{Arc, OnceLock};

use weave_core::BatchReport;
use weave_loader::AmbientResourceStore;

pub use config::SetupConfig;
pub use error::ConfigError;
pub use plan::InstrumentationPlan;

/// The runtime's class-load transform hook. Holds the configuration string
/// and an ambient byte source for handler interfaces and spawner owners;
/// builds its plan on the first `transform` call and caches it, success or
/// failure, for every call after (§4.5, §5).
pub struct AgentFrontend {
    config: String,
    store: Arc<dyn AmbientResourceStore>,
    plan: OnceLock<Result<InstrumentationPlan, ConfigError>>,
}

impl AgentFrontend {
    pub fn new(config: impl Into<String>, store: Arc<dyn AmbientResourceStore>) -> Self {
        Self { config: config.into(), store, plan: OnceLock::new() }
    }

    /// The resolved plan, building it on first access. A build failure is
    /// cached and re-returned to every subsequent caller rather than retried
    /// (§4.5 implementation note).
    pub fn plan(&self) -> Result<&InstrumentationPlan, ConfigError> {
        self.plan
            .get_or_init(|| plan::build(&self.config, self.store.as_ref()))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Transform one class-load event: if `class_name` (a dotted binary
    /// name) is in the plan, rewrite its bytes under the matching
    /// [`weave_spec::HandlerSpec`]; otherwise return them unchanged.
    pub fn transform(&self, class_name: &str, bytes: &[u8]) -> Result<Vec<u8>, ConfigError> {
        let plan = self.plan()?;
        let internal_name = weave_core::binary_name::dotted_to_internal(class_name);

        let Some(spec) = plan.spec_for(&internal_name) else {
            return Ok(bytes.to_vec());
        };

        let mut tree = weave_codec::decode(bytes, class_name)
            .map_err(|e| ConfigError::from(weave_core::InstrumentationError::from(e)))?;
        weave_engine::instrument(&mut tree, spec)?;
        let out = weave_codec::encode(&tree)
            .map_err(|e| ConfigError::from(weave_core::InstrumentationError::from(e)))?;
        Ok(out)
    }

    /// Transform a batch of class-load events, accumulating per-class
    /// failures into a [`BatchReport`] instead of aborting the whole batch
    /// on the first error (§7 batch-reporting policy).
    pub fn transform_batch(&self, classes: &[(String, Vec<u8>)]) -> (Vec<(String, Vec<u8>)>, BatchReport) {
        let mut outputs = Vec::with_capacity(classes.len());
        let mut report = BatchReport::new();

        for (class_name, bytes) in classes {
            match self.transform(class_name, bytes) {
                Ok(transformed) => outputs.push((class_name.clone(), transformed)),
                Err(ConfigError::Instrumentation(cause)) => {
                    report.record(class_name.clone(), "transform", cause);
                }
                Err(grammar_failure @ (ConfigError::MissingHandlerName { .. } | ConfigError::MalformedSpawnerReference { .. })) => {
                    report.record(
                        class_name.clone(),
                        "transform",
                        weave_core::InstrumentationError::Configuration(
                            weave_core::ConfigurationError::MalformedConfiguration {
                                detail: grammar_failure.to_string(),
                            },
                        ),
                    );
                }
            }
        }

        (outputs, report)
    }
}
