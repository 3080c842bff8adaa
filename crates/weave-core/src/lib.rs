//! Core data model for the handler-pattern bytecode rewriter.
//!
//! This crate owns the mutable tree representation of a class file
//! ([`ClassTree`]), its instruction-level building blocks, binary-name and
//! descriptor utilities, and the error/diagnostics types shared by every
//! other crate in the workspace. It has no knowledge of the class-file byte
//! format (that's `weave-codec`) or of the handler pattern itself (that's
//! `weave-spec` and `weave-engine`).

pub mod access;
pub mod annotation;
pub mod binary_name;
pub mod contract;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod frame;
pub mod instruction;
pub mod method;
pub mod tree;

pub use access::AccessFlags;
pub use annotation::{Annotation, AnnotationValue};
pub use contract::{INSTRUMENTS_ANNOTATION, SPAWNS_WITH_ANNOTATION};
pub use descriptor::FieldType;
pub use diagnostics::{BatchReport, FailureEntry};
pub use error::{CodecError, ConfigurationError, InstrumentationError, RuntimeHostError, ShapeError};
pub use field::FieldNode;
pub use frame::{StackFrame, VerificationType};
pub use instruction::{InstructionList, InvokeKind, NodeId, Opcode, ReturnKind, SlotKind};
pub use method::{
    GenericAttribute, LocalVariableEntry, LocalVariableTable, MethodNode, MARKER_ATTRIBUTE_NAME,
};
pub use tree::ClassTree;

/// Class-file version at or above which the runtime understands native-method prefixing.
///
/// Mirrors the VM's "agent-capable baseline": configuring a native prefix against an
/// older class file is a silent no-op rather than an error (see `weave-spec`'s analyzer).
pub const AGENT_CAPABLE_BASELINE: u32 = 51; // "version 7" equivalent: first release with retransform-capable agents
