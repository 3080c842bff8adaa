//! The Instrumentation Engine (§4.2): turns a [`weave_spec::HandlerSpec`] into
//! concrete mutations of a handlee's [`weave_core::ClassTree`].

mod ctor_patch;
mod engine;
mod field_synth;
mod interface_install;
mod method_rewrite;
mod native_wrap;
mod slots;

pub use engine::instrument;
