//! Builds the Instrumentation Plan (§4.5): the binary-name -> [`HandlerSpec`]
//! mapping the frontend consults on every class-load event.

use std::collections::HashMap;

use weave_core::binary_name::{descriptor_to_internal, dotted_to_internal};
use weave_core::{Annotation, AnnotationValue, ClassTree, ConfigurationError, INSTRUMENTS_ANNOTATION};
use weave_loader::AmbientResourceStore;
use weave_spec::{HandlerSpec, SpawnerRef};

use crate::config::SetupConfig;
use crate::error::ConfigError;

/// The fully resolved binary-name -> [`HandlerSpec`] mapping built once from
/// a configuration string (§4.5, §5 "read-only thereafter").
#[derive(Debug, Clone, Default)]
pub struct InstrumentationPlan {
    entries: HashMap<String, HandlerSpec>,
}

impl InstrumentationPlan {
    pub fn spec_for(&self, handlee_internal_name: &str) -> Option<&HandlerSpec> {
        self.entries.get(handlee_internal_name)
    }

    pub fn contains(&self, handlee_internal_name: &str) -> bool {
        self.entries.contains_key(handlee_internal_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn annotation_handlees(interface: &Annotation) -> Vec<String> {
    fn from_value(value: &AnnotationValue, out: &mut Vec<String>) {
        match value {
            AnnotationValue::Class(descriptor) => {
                if let Some(internal) = descriptor_to_internal(descriptor) {
                    out.push(internal.to_string());
                }
            }
            AnnotationValue::Array(items) => {
                for item in items {
                    from_value(item, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for (_, value) in &interface.values {
        from_value(value, &mut out);
    }
    out
}

fn declared_handlees(interface: &ClassTree) -> Vec<String> {
    interface
        .annotations
        .iter()
        .filter(|a| a.descriptor == INSTRUMENTS_ANNOTATION)
        .flat_map(annotation_handlees)
        .collect()
}

/// Lift a configuration-category failure into this crate's error type,
/// through the same [`weave_core::InstrumentationError`] every other
/// conversion in this module goes through.
fn config_err(e: ConfigurationError) -> ConfigError {
    ConfigError::from(weave_core::InstrumentationError::from(e))
}

fn load_tree(store: &dyn AmbientResourceStore, internal_name: &str) -> Result<ClassTree, ConfigError> {
    let bytes = store
        .bytes_for(internal_name)
        .ok_or_else(|| config_err(ConfigurationError::UnresolvableHandlerInterface { interface: internal_name.to_string() }))?;
    let tree = weave_codec::decode(&bytes, internal_name)
        .map_err(weave_core::InstrumentationError::from)?;
    Ok(tree)
}

/// Confirm `spawner`'s owning class declares a method of that name, and that
/// its descriptor matches `(handlerType) -> handlerType`, fetching the
/// owner's bytes from `store` (§4.1 "requires loading the spawner's own
/// class, which only the plan-building caller has the means to do").
fn validate_spawner(store: &dyn AmbientResourceStore, spawner: &SpawnerRef, handler_type: &str) -> Result<(), ConfigError> {
    let bytes = store
        .bytes_for(&spawner.owner)
        .ok_or_else(|| config_err(ConfigurationError::UnresolvableSpawnerOwner { owner: spawner.owner.clone() }))?;
    let owner_tree =
        weave_codec::decode(&bytes, &spawner.owner).map_err(weave_core::InstrumentationError::from)?;
    let method = owner_tree
        .methods
        .iter()
        .find(|m| m.name == spawner.method_name)
        .ok_or_else(|| {
            config_err(ConfigurationError::SpawnerMethodNotFound {
                owner: spawner.owner.clone(),
                method: spawner.method_name.clone(),
            })
        })?;
    weave_spec::validate_spawner_descriptor(spawner, handler_type, &method.descriptor).map_err(config_err)?;
    Ok(())
}

/// Resolve one `setup` clause into its [`HandlerSpec`] plus every handlee
/// binary name it governs (explicit and annotation-declared), and record
/// each into `entries`.
fn apply_setup(
    setup: &SetupConfig,
    store: &dyn AmbientResourceStore,
    entries: &mut HashMap<String, HandlerSpec>,
) -> Result<(), ConfigError> {
    let interface = load_tree(store, &setup.handler)?;

    if let Some(spawner) = &setup.spawner {
        validate_spawner(store, spawner, &setup.handler)?;
    }

    let spec = weave_spec::analyze(&interface, None, setup.spawner.clone())
        .map_err(ConfigError::from)?;

    let mut handlees = setup.handlees.clone();
    handlees.extend(declared_handlees(&interface));

    for handlee in handlees {
        entries.insert(handlee, spec.clone());
    }
    Ok(())
}

pub fn build(config: &str, store: &dyn AmbientResourceStore) -> Result<InstrumentationPlan, ConfigError> {
    let setups = crate::config::parse(config)?;
    let mut entries = HashMap::new();
    for setup in &setups {
        apply_setup(setup, store, &mut entries)?;
    }
    Ok(InstrumentationPlan { entries })
}
