//! Implants the handler pattern into compiled class files by rewriting
//! bytecode: given a handler interface and a target class, produces a class
//! file that implements that interface and routes its intercepted methods
//! through a replaceable handler slot.
//!
//! This crate re-exports the workspace's member crates; most callers only
//! need [`prelude`].

pub use weave_agent as agent;
pub use weave_codec as codec;
pub use weave_core as core;
pub use weave_deps as deps;
pub use weave_engine as engine;
pub use weave_loader as loader;
pub use weave_spec as spec;

pub mod prelude {
    pub use crate::agent::{AgentFrontend, ConfigError, InstrumentationPlan};
    pub use crate::core::{
        AccessFlags, Annotation, AnnotationValue, BatchReport, ClassTree, ConfigurationError,
        FieldNode, InstrumentationError, MethodNode, RuntimeHostError, ShapeError,
    };
    pub use crate::deps::{DependencyError, DependencyTree};
    pub use crate::engine::instrument;
    pub use crate::loader::{AmbientResourceStore, ClassLoadingDomain, Loader, LoaderError};
    pub use crate::spec::{analyze, HandlerSpec, NullGuardPolicy, SpawnerRef};
}
