//! The Handler Spec Analyzer (§4.1): turns a handler interface's
//! [`ClassTree`] into a [`HandlerSpec`] describing how handlees under that
//! interface must be rewritten.
//!
//! A pure function of its input bytes: no mutable global state, deterministic
//! output, so analyzing the same interface twice yields deep-equal specs
//! (§8 property 7).

use std::collections::BTreeSet;

use weave_core::binary_name::{camel_case, internal_to_descriptor, simple_name};
use weave_core::descriptor::{parse_method_descriptor, remove_first_arg, FieldType};
use weave_core::{AnnotationValue, ClassTree, ConfigurationError, InstrumentationError, AGENT_CAPABLE_BASELINE};

/// The strategy a dispatch method uses to guarantee it never invokes through
/// a null handler slot (§3, §9 design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullGuardPolicy {
    /// Assign the handler field (to `this`, or the spawner's result) before
    /// the constructor's super-initializer call. Fast, but can violate
    /// verifier initialization rules on modern class-file versions.
    AssignBeforeSuper,
    /// Assign immediately after the super-initializer call. Verifier-clean,
    /// but incorrect if the super-initializer itself invokes an intercepted
    /// method, since the field is still null at that point.
    AssignAfterSuper,
    /// Leave construction alone; every dispatch method checks the slot for
    /// null immediately before use. Costs one load/compare/branch per call
    /// but is robust under inheritance. The default.
    #[default]
    CheckBeforeCall,
}

/// A static method supplying a non-null default handler when none has been
/// installed (§3, §6 "Spawner ABI").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnerRef {
    /// Internal (slash) name of the class declaring the spawner method.
    pub owner: String,
    pub method_name: String,
}

impl SpawnerRef {
    pub fn new(owner: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self { owner: owner.into(), method_name: method_name.into() }
    }

    /// The expected spawner descriptor for a given handler type: `(handlerType) -> handlerType`.
    pub fn expected_descriptor(handler_type: &str) -> String {
        let d = internal_to_descriptor(handler_type);
        format!("({d}){d}")
    }
}

/// The derived contract of a handler interface (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSpec {
    /// Internal (slash) name of the handler interface.
    pub handler_type: String,
    /// `L<handler_type>;`, cached since every synthesized field/method/dispatch
    /// body needs it.
    pub handler_descriptor: String,
    /// Canonical `name(argsAfterFirst)ret` forms, one per intercepted method.
    pub intercepted_signatures: BTreeSet<String>,
    pub accessor_names: Vec<String>,
    pub mutator_names: Vec<String>,
    pub null_guard_policy: NullGuardPolicy,
    pub spawner: Option<SpawnerRef>,
    /// Native-method prefix, already filtered against the class's agent-capable
    /// baseline (§4.1: "ignored if the class version is below the baseline").
    pub native_prefix: Option<String>,
}

impl HandlerSpec {
    /// Override the default null-guard policy. Not reachable from the
    /// Agent Frontend's configuration grammar today (§4.5 has no syntax for
    /// it) but kept as an explicit builder for direct embedding and tests.
    pub fn with_null_guard_policy(mut self, policy: NullGuardPolicy) -> Self {
        self.null_guard_policy = policy;
        self
    }
}

fn is_handler_type(field_type: &FieldType, handler_type: &str) -> bool {
    matches!(field_type, FieldType::Object(name) if name == handler_type)
}

fn accessor_names_for(simple: &str, camel: &str) -> [String; 3] {
    [format!("get{simple}"), simple.to_string(), camel.to_string()]
}

fn mutator_names_for(simple: &str, camel: &str) -> [String; 3] {
    [format!("set{simple}"), simple.to_string(), camel.to_string()]
}

/// Read the `SpawnsWith(qualifiedMethod)` class-level annotation off
/// `interface`, if present, and parse it into a [`SpawnerRef`] (the trailing
/// `.`-separated segment of the qualified method name is the method name).
fn default_spawner(interface: &ClassTree) -> Option<SpawnerRef> {
    let qualified = interface.annotations.iter().find_map(|a| {
        if a.descriptor != weave_core::SPAWNS_WITH_ANNOTATION {
            return None;
        }
        a.values.iter().find_map(|(_, v)| match v {
            AnnotationValue::String(s) => Some(s.clone()),
            _ => None,
        })
    })?;
    let (owner, method_name) = qualified.rsplit_once('.')?;
    Some(SpawnerRef::new(owner.replace('.', "/"), method_name))
}

/// Analyze a handler interface's [`ClassTree`] into a [`HandlerSpec`] (§4.1).
///
/// `native_prefix` and `spawner_override` are supplied by the caller (the
/// Agent Frontend, from configuration) rather than read off the interface
/// itself, mirroring how the class version gates native-prefix honoring.
/// When `spawner_override` is `None`, the interface's own
/// `SpawnsWith` annotation (if any) supplies the default. Validating a
/// spawner's actual descriptor against `(handlerType) -> handlerType`
/// requires loading the spawner's own class, which only the plan-building
/// caller has the means to do (§4.1 "Failure modes" raises that at
/// plan-construction time, not here).
pub fn analyze(
    interface: &ClassTree,
    native_prefix: Option<&str>,
    spawner_override: Option<SpawnerRef>,
) -> Result<HandlerSpec, InstrumentationError> {
    let handler_type = interface.internal_name.clone();
    let handler_descriptor = internal_to_descriptor(&handler_type);
    let simple = simple_name(&handler_type);
    let camel = camel_case(simple);
    let accessor_candidates = accessor_names_for(simple, &camel);
    let mutator_candidates = mutator_names_for(simple, &camel);

    let mut accessor_names = Vec::new();
    let mut mutator_names = Vec::new();
    let mut intercepted_signatures = BTreeSet::new();

    for method in &interface.methods {
        let (args, ret) = parse_method_descriptor(&method.descriptor);

        let is_accessor_shape = args.is_empty() && is_handler_type(&ret, &handler_type);
        if is_accessor_shape && accessor_candidates.contains(&method.name) {
            accessor_names.push(method.name.clone());
            continue;
        }

        let is_mutator_shape =
            args.len() == 1 && is_handler_type(&args[0], &handler_type) && ret == FieldType::Void;
        if is_mutator_shape && mutator_candidates.contains(&method.name) {
            mutator_names.push(method.name.clone());
            continue;
        }

        if args.first().is_some_and(|a| is_handler_type(a, &handler_type)) {
            let signature = format!("{}{}", method.name, remove_first_arg(&method.descriptor));
            intercepted_signatures.insert(signature);
        }
    }

    let spawner = spawner_override.or_else(|| default_spawner(interface));

    let native_prefix = if interface.version >= AGENT_CAPABLE_BASELINE {
        native_prefix.map(str::to_string)
    } else {
        None
    };

    Ok(HandlerSpec {
        handler_type,
        handler_descriptor,
        intercepted_signatures,
        accessor_names,
        mutator_names,
        null_guard_policy: NullGuardPolicy::default(),
        spawner,
        native_prefix,
    })
}

/// Validate a resolved spawner method's actual descriptor against the
/// expected `(handlerType) -> handlerType` shape, returning the
/// `MalformedSpawnerDescriptor` configuration error on mismatch. Called by
/// the Agent Frontend once it has loaded the spawner's owning class.
pub fn validate_spawner_descriptor(
    spawner: &SpawnerRef,
    handler_type: &str,
    found_descriptor: &str,
) -> Result<(), ConfigurationError> {
    let expected = SpawnerRef::expected_descriptor(handler_type);
    if found_descriptor == expected {
        Ok(())
    } else {
        Err(ConfigurationError::MalformedSpawnerDescriptor {
            owner: spawner.owner.clone(),
            method: spawner.method_name.clone(),
            handler_type: handler_type.to_string(),
            found: found_descriptor.to_string(),
        })
    }
}
