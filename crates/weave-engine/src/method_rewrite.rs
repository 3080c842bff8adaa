//! Per-method rewrite (§4.2.3): split an intercepted handlee method into a
//! dispatch method (keeping the original name and descriptor, the call site
//! every existing caller already targets) and a re-roled original method
//! (descriptor widened by one leading handler-typed parameter, matching the
//! handler interface's own method exactly so the dispatch method's
//! `invokeinterface` can resolve straight back into it when the handler slot
//! happens to hold `this`).

use weave_core::descriptor::{parse_method_descriptor, prepend_arg};
use weave_core::{ClassTree, FieldType, InvokeKind, MethodNode, Opcode, ReturnKind, SlotKind, StackFrame, VerificationType};
use weave_spec::{HandlerSpec, NullGuardPolicy};

use crate::slots::{locals_with_trailing, slot_kind_of};

/// The null-replacement sequence for the `CheckBeforeCall` guard: `spawner(this)`
/// when a spawner is configured, else plain `this` (§4.2.3 step 2).
fn null_replacement_ops(spec: &HandlerSpec) -> Vec<Opcode> {
    match &spec.spawner {
        Some(spawner) => vec![
            Opcode::LoadThis,
            Opcode::Invoke {
                kind: InvokeKind::Static,
                owner: spawner.owner.clone(),
                name: spawner.method_name.clone(),
                descriptor: weave_spec::SpawnerRef::expected_descriptor(&spec.handler_type),
            },
        ],
        None => vec![Opcode::LoadThis],
    }
}

/// Assigns each argument a local-variable slot starting at 1 (slot 0 is `this`),
/// widening by two for `long`/`double` arguments.
fn arg_slots(args: &[FieldType]) -> Vec<u16> {
    let mut slot = 1u16;
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        out.push(slot);
        slot += arg.slot_size() as u16;
    }
    out
}

/// Appends `this` plus every argument load, then the `invokeinterface` call
/// and return, to `dispatch`. The handler reference itself must already be on
/// the stack; callers push it (via whatever guard shape their policy needs)
/// before calling this.
fn push_interface_call(
    dispatch: &mut MethodNode,
    handler_type: &str,
    original_name: &str,
    expanded_descriptor: &str,
    args: &[FieldType],
    ret: &FieldType,
) {
    dispatch.instructions.push_back(Opcode::LoadThis);
    for (arg, slot) in args.iter().zip(arg_slots(args)) {
        dispatch.instructions.push_back(Opcode::LoadVar { slot, kind: slot_kind_of(arg) });
    }
    dispatch.instructions.push_back(Opcode::Invoke {
        kind: InvokeKind::Interface,
        owner: handler_type.to_string(),
        name: original_name.to_string(),
        descriptor: expanded_descriptor.to_string(),
    });
    dispatch.instructions.push_back(Opcode::Return { kind: ReturnKind::from_field_type(ret) });
}

/// Rewrite one intercepted method. Returns `(dispatch, reroled_original)`,
/// both to be added back to the handlee (the caller is responsible for
/// removing `original`'s old slot from `handlee.methods` first).
pub fn rewrite(mut original: MethodNode, handlee: &ClassTree, field_name: &str, spec: &HandlerSpec) -> (MethodNode, MethodNode) {
    let name = original.name.clone();
    let descriptor = original.descriptor.clone();
    let expanded = prepend_arg(&descriptor, &spec.handler_descriptor);
    let (args, ret) = parse_method_descriptor(&descriptor);
    let arg_slot_span: u16 = args.iter().map(|a| a.slot_size() as u16).sum();
    let temp_slot = 1 + arg_slot_span;

    let dispatch_access = original.access.with_public_visibility();
    let mut dispatch = MethodNode::new(name.clone(), descriptor.clone(), dispatch_access);
    original.relocate_annotations_to(&mut dispatch);

    match spec.null_guard_policy {
        NullGuardPolicy::CheckBeforeCall => {
            let after_guard = dispatch.instructions.push_back(Opcode::Label);
            dispatch.instructions.insert_before(after_guard, Opcode::LoadThis);
            dispatch.instructions.insert_before(
                after_guard,
                Opcode::GetField {
                    owner: handlee.internal_name.clone(),
                    name: field_name.to_string(),
                    descriptor: spec.handler_descriptor.clone(),
                },
            );
            dispatch
                .instructions
                .insert_before(after_guard, Opcode::StoreVar { slot: temp_slot, kind: SlotKind::Reference });
            dispatch
                .instructions
                .insert_before(after_guard, Opcode::LoadVar { slot: temp_slot, kind: SlotKind::Reference });
            dispatch.instructions.insert_before(after_guard, Opcode::IfNonNull { target: after_guard });
            for op in null_replacement_ops(spec) {
                dispatch.instructions.insert_before(after_guard, op);
            }
            dispatch
                .instructions
                .insert_before(after_guard, Opcode::StoreVar { slot: temp_slot, kind: SlotKind::Reference });

            dispatch.instructions.push_back(Opcode::Frame(StackFrame::full(
                locals_with_trailing(&handlee.internal_name, &args, &spec.handler_type),
                vec![],
            )));
            dispatch.instructions.push_back(Opcode::LoadVar { slot: temp_slot, kind: SlotKind::Reference });
            push_interface_call(&mut dispatch, &spec.handler_type, &name, &expanded, &args, &ret);
            dispatch.max_locals = temp_slot + 1;
        }
        NullGuardPolicy::AssignBeforeSuper | NullGuardPolicy::AssignAfterSuper => {
            dispatch.instructions.push_back(Opcode::LoadThis);
            dispatch.instructions.push_back(Opcode::GetField {
                owner: handlee.internal_name.clone(),
                name: field_name.to_string(),
                descriptor: spec.handler_descriptor.clone(),
            });
            push_interface_call(&mut dispatch, &spec.handler_type, &name, &expanded, &args, &ret);
            dispatch.max_locals = arg_slot_span + 1;
        }
    }
    dispatch.max_stack = 2 + arg_slot_span.max(1);

    original.descriptor = expanded;
    original.access = original.access.with_public_visibility();
    let ids: Vec<_> = original.instructions.iter().map(|(id, _)| id).collect();
    for id in ids {
        if let Some(op) = original.instructions.get_mut(id) {
            if let Some(slot) = op.slot_mut() {
                *slot += 1;
            }
            if let Opcode::Frame(frame) = op {
                frame.insert_local_at_zero(VerificationType::Object(spec.handler_type.clone()));
            }
        }
    }
    let method_length = original.instructions.len();
    original.locals.shift_for_new_parameter("$handler", &spec.handler_descriptor, method_length);
    original.max_locals += 1;

    (dispatch, original)
}
