//! Orchestrates a single handlee's instrumentation (§4.2): interface
//! installation, field/accessor synthesis, per-method rewrite or native
//! wrapping, and constructor patching, in that order, guarded by the
//! duplicate-instrumentation and intercepted-signature shape checks (§4.2.6).
//!
//! The engine never computes a stack-map frame from a class-loading query
//! (§4.2.7): every frame it introduces is built explicitly by the module that
//! introduces the join, from the locals already in scope at that point.

use std::collections::BTreeSet;

use weave_core::{AccessFlags, ClassTree, InstrumentationError, MethodNode, ShapeError};
use weave_spec::HandlerSpec;

use crate::{ctor_patch, field_synth, interface_install, method_rewrite, native_wrap};

/// Rewrite `handlee` in place to implement `spec`'s handler contract.
///
/// Not idempotent: a second call against an already-instrumented tree fails
/// with [`ShapeError::DuplicateInstrumentation`] rather than silently
/// double-rewriting (§4.2's explicit non-goal).
pub fn instrument(handlee: &mut ClassTree, spec: &HandlerSpec) -> Result<(), InstrumentationError> {
    if handlee.is_already_instrumented() {
        return Err(ShapeError::DuplicateInstrumentation { class_name: handlee.internal_name.clone() }.into());
    }

    interface_install::install(handlee, spec);
    let field_name = field_synth::synthesize(handlee, spec);

    let candidate_count = handlee.methods.len();
    let mut matched_signatures = BTreeSet::new();
    let mut appended = Vec::new();

    for i in 0..candidate_count {
        let key = handlee.methods[i].signature_key();
        if !spec.intercepted_signatures.contains(&key) {
            continue;
        }
        matched_signatures.insert(key.clone());

        if handlee.methods[i].is_abstract() {
            return Err(ShapeError::AbstractMethodIntercepted { signature: key }.into());
        }
        if handlee.methods[i].is_static() {
            return Err(ShapeError::StaticMethodIntercepted { signature: key }.into());
        }

        let placeholder = MethodNode::new(String::new(), "()V", AccessFlags::empty());
        let original = std::mem::replace(&mut handlee.methods[i], placeholder);

        if original.is_native() {
            match &spec.native_prefix {
                Some(prefix) => {
                    let (wrapper, renamed) = native_wrap::wrap(original, handlee, prefix);
                    handlee.methods[i] = wrapper;
                    appended.push(renamed);
                }
                None => return Err(ShapeError::NativeMethodWithoutPrefix { signature: key }.into()),
            }
        } else {
            let (dispatch, reroled) = method_rewrite::rewrite(original, handlee, &field_name, spec);
            handlee.methods[i] = dispatch;
            appended.push(reroled);
        }
    }

    let unmatched: Vec<String> =
        spec.intercepted_signatures.difference(&matched_signatures).cloned().collect();
    if !unmatched.is_empty() {
        return Err(ShapeError::UnmatchedSignatures { signatures: unmatched }.into());
    }

    handlee.methods.extend(appended);
    ctor_patch::patch_all(handlee, spec, &field_name);
    handlee.mark_instrumented();
    Ok(())
}
