//! Native-method wrapping (§4.2.4): a simpler sibling of [`crate::method_rewrite`]
//! for methods the VM itself implements. A native method can't carry dispatch
//! logic in its own body, so instead the original is renamed behind a prefix
//! and a plain, non-native wrapper takes over its old name and descriptor,
//! forwarding every call straight through via `invokespecial`.

use weave_core::descriptor::parse_method_descriptor;
use weave_core::{AccessFlags, ClassTree, InvokeKind, MethodNode, Opcode, ReturnKind};

use crate::slots::slot_kind_of;

/// Rename `original` behind `native_prefix` and build a forwarding wrapper
/// under its old name/descriptor. Returns `(wrapper, renamed_original)`.
pub fn wrap(mut original: MethodNode, handlee: &ClassTree, native_prefix: &str) -> (MethodNode, MethodNode) {
    let name = original.name.clone();
    let descriptor = original.descriptor.clone();
    let (args, ret) = parse_method_descriptor(&descriptor);
    let arg_slot_span: u16 = args.iter().map(|a| a.slot_size() as u16).sum();

    let wrapper_access = (original.access.with_public_visibility() - AccessFlags::NATIVE) | AccessFlags::FINAL;
    let mut wrapper = MethodNode::new(name, descriptor, wrapper_access);
    original.relocate_annotations_to(&mut wrapper);

    wrapper.instructions.push_back(Opcode::LoadThis);
    let mut slot = 1u16;
    for arg in &args {
        wrapper.instructions.push_back(Opcode::LoadVar { slot, kind: slot_kind_of(arg) });
        slot += arg.slot_size() as u16;
    }

    original.name = format!("{native_prefix}{}", original.name);

    wrapper.instructions.push_back(Opcode::Invoke {
        kind: InvokeKind::Special,
        owner: handlee.internal_name.clone(),
        name: original.name.clone(),
        descriptor: original.descriptor.clone(),
    });
    wrapper.instructions.push_back(Opcode::Return { kind: ReturnKind::from_field_type(&ret) });
    wrapper.max_stack = 1 + arg_slot_span.max(1);
    wrapper.max_locals = 1 + arg_slot_span;

    (wrapper, original)
}
