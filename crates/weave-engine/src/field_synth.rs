//! Handler field and accessor/mutator synthesis (§4.2.2).

use weave_core::{AccessFlags, FieldNode, MethodNode, Opcode, ReturnKind, SlotKind};
use weave_spec::HandlerSpec;

use weave_core::ClassTree;

fn derive_base_name(name: &str) -> String {
    for prefix in ["set", "get"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return weave_core::binary_name::camel_case(rest);
            }
        }
    }
    if name.len() > 2 {
        if let Some(rest) = name.strip_prefix("is") {
            if !rest.is_empty() {
                return weave_core::binary_name::camel_case(rest);
            }
        }
    }
    weave_core::binary_name::camel_case(name)
}

fn derive_field_base(handlee: &ClassTree, spec: &HandlerSpec) -> String {
    if spec.mutator_names.len() == 1 {
        return derive_base_name(&spec.mutator_names[0]);
    }
    if spec.accessor_names.len() == 1 {
        return derive_base_name(&spec.accessor_names[0]);
    }
    let _ = handlee;
    format!("${}$", spec.handler_type.replace(['.', '/'], "_"))
}

fn build_accessor(handlee: &ClassTree, spec: &HandlerSpec, name: &str, field_name: &str) -> MethodNode {
    let descriptor = format!("(){}", spec.handler_descriptor);
    let mut method = MethodNode::new(name, descriptor, AccessFlags::PUBLIC);
    method.instructions.push_back(Opcode::LoadThis);
    method.instructions.push_back(Opcode::GetField {
        owner: handlee.internal_name.clone(),
        name: field_name.to_string(),
        descriptor: spec.handler_descriptor.clone(),
    });
    method.instructions.push_back(Opcode::Return { kind: ReturnKind::Reference });
    method.max_stack = 1;
    method.max_locals = 1;
    method
}

/// Builds the null-to-self mutator: `if (arg == null) arg = this; this.field = arg;`.
fn build_mutator(handlee: &ClassTree, spec: &HandlerSpec, name: &str, field_name: &str) -> MethodNode {
    let descriptor = format!("({})V", spec.handler_descriptor);
    let mut method = MethodNode::new(name, descriptor, AccessFlags::PUBLIC);
    const ARG_SLOT: u16 = 1;

    let after_guard = method.instructions.push_back(Opcode::Label);
    method
        .instructions
        .insert_before(after_guard, Opcode::LoadVar { slot: ARG_SLOT, kind: SlotKind::Reference });
    method.instructions.insert_before(after_guard, Opcode::IfNonNull { target: after_guard });
    method.instructions.insert_before(after_guard, Opcode::LoadThis);
    method
        .instructions
        .insert_before(after_guard, Opcode::StoreVar { slot: ARG_SLOT, kind: SlotKind::Reference });

    method.instructions.push_back(Opcode::Frame(weave_core::StackFrame::full(
        vec![
            weave_core::VerificationType::Object(handlee.internal_name.clone()),
            weave_core::VerificationType::Object(spec.handler_type.clone()),
        ],
        vec![],
    )));
    method.instructions.push_back(Opcode::LoadThis);
    method
        .instructions
        .push_back(Opcode::LoadVar { slot: ARG_SLOT, kind: SlotKind::Reference });
    method.instructions.push_back(Opcode::PutField {
        owner: handlee.internal_name.clone(),
        name: field_name.to_string(),
        descriptor: spec.handler_descriptor.clone(),
    });
    method.instructions.push_back(Opcode::Return { kind: ReturnKind::Void });
    method.max_stack = 2;
    method.max_locals = 2;
    method
}

/// Synthesize the handler field and every missing accessor/mutator (§4.2.2),
/// returning the field's derived name.
pub fn synthesize(handlee: &mut ClassTree, spec: &HandlerSpec) -> String {
    let field_name = handlee.unique_field_name(&derive_field_base(handlee, spec));
    handlee
        .fields
        .push(FieldNode::new(field_name.clone(), spec.handler_descriptor.clone(), AccessFlags::handler_field()));

    let accessor_descriptor = format!("(){}", spec.handler_descriptor);
    for accessor in &spec.accessor_names {
        if handlee.find_method(accessor, &accessor_descriptor).is_none() {
            let method = build_accessor(handlee, spec, accessor, &field_name);
            handlee.methods.push(method);
        }
    }

    let mutator_descriptor = format!("({})V", spec.handler_descriptor);
    for mutator in &spec.mutator_names {
        if handlee.find_method(mutator, &mutator_descriptor).is_none() {
            let method = build_mutator(handlee, spec, mutator, &field_name);
            handlee.methods.push(method);
        }
    }

    field_name
}
