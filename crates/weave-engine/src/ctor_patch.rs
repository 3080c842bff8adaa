//! Constructor patching (§4.2.5): install a non-null handler slot value
//! around each constructor's super-initializer call, for the two null-guard
//! policies that front-load the assignment instead of checking at each
//! dispatch site.
//!
//! `CheckBeforeCall` (the default) patches nothing here; its guard lives
//! entirely in the dispatch method built by [`crate::method_rewrite`].

use weave_core::{ClassTree, InvokeKind, MethodNode, NodeId, Opcode};
use weave_spec::{HandlerSpec, NullGuardPolicy};

/// Find this constructor's own super/this-delegating `<init>` invocation: the
/// sole `invokespecial ... <init>` whose receiver type is not the handlee
/// itself (a same-class call means another constructor already delegates the
/// assignment, so this constructor is skipped).
fn super_init_call(method: &MethodNode, handlee: &str) -> Option<NodeId> {
    method.instructions.find(|op| {
        matches!(op, Opcode::Invoke { kind: InvokeKind::Special, name, owner, .. } if name == "<init>" && owner != handlee)
    })
}

fn putfield(handlee: &str, spec: &HandlerSpec, field_name: &str) -> Opcode {
    Opcode::PutField {
        owner: handlee.to_string(),
        name: field_name.to_string(),
        descriptor: spec.handler_descriptor.clone(),
    }
}

/// `this.field = this` (§4.2.5: the unconditional self-assignment emitted
/// ahead of the super call under `AssignBeforeSuper`).
fn self_assign_ops(handlee: &str, spec: &HandlerSpec, field_name: &str) -> Vec<Opcode> {
    vec![Opcode::LoadThis, Opcode::LoadThis, putfield(handlee, spec, field_name)]
}

/// `this.field = spawner(this)` — the spawner-backed assignment used after
/// the super call under `AssignBeforeSuper` (additionally, when a spawner is
/// configured) and as the sole assignment under `AssignAfterSuper`.
fn spawner_assign_ops(handlee: &str, spec: &HandlerSpec, field_name: &str, spawner: &weave_spec::SpawnerRef) -> Vec<Opcode> {
    vec![
        Opcode::LoadThis,
        Opcode::LoadThis,
        Opcode::Invoke {
            kind: InvokeKind::Static,
            owner: spawner.owner.clone(),
            name: spawner.method_name.clone(),
            descriptor: weave_spec::SpawnerRef::expected_descriptor(&spec.handler_type),
        },
        putfield(handlee, spec, field_name),
    ]
}

fn insert_after_cursor(ctor: &mut MethodNode, anchor: NodeId, ops: Vec<Opcode>) {
    let mut cursor = anchor;
    for op in ops {
        cursor = ctor.instructions.insert_after(cursor, op);
    }
}

fn stack_bump(spec: &HandlerSpec) -> u16 {
    if spec.spawner.is_some() {
        2
    } else {
        1
    }
}

/// Patch every constructor of `handlee` per `spec.null_guard_policy`.
pub fn patch_all(handlee: &mut ClassTree, spec: &HandlerSpec, field_name: &str) {
    if matches!(spec.null_guard_policy, NullGuardPolicy::CheckBeforeCall) {
        return;
    }
    let handlee_name = handlee.internal_name.clone();
    for ctor in handlee.constructors_mut() {
        let Some(super_call) = super_init_call(ctor, &handlee_name) else { continue };
        match spec.null_guard_policy {
            NullGuardPolicy::AssignBeforeSuper => {
                for op in self_assign_ops(&handlee_name, spec, field_name) {
                    ctor.instructions.insert_before(super_call, op);
                }
                if let Some(spawner) = &spec.spawner {
                    insert_after_cursor(ctor, super_call, spawner_assign_ops(&handlee_name, spec, field_name, spawner));
                }
            }
            NullGuardPolicy::AssignAfterSuper => {
                let ops = match &spec.spawner {
                    Some(spawner) => spawner_assign_ops(&handlee_name, spec, field_name, spawner),
                    None => self_assign_ops(&handlee_name, spec, field_name),
                };
                insert_after_cursor(ctor, super_call, ops);
            }
            NullGuardPolicy::CheckBeforeCall => unreachable!(),
        }
        ctor.max_stack += stack_bump(spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::AccessFlags;

    fn handlee_with_ctor(super_owner: &str) -> ClassTree {
        let mut tree = ClassTree::new("pkg/Handlee", 52, AccessFlags::PUBLIC);
        let mut ctor = MethodNode::new("<init>", "()V", AccessFlags::PUBLIC);
        ctor.instructions.push_back(Opcode::LoadThis);
        ctor.instructions.push_back(Opcode::Invoke {
            kind: InvokeKind::Special,
            owner: super_owner.to_string(),
            name: "<init>".to_string(),
            descriptor: "()V".to_string(),
        });
        ctor.instructions.push_back(Opcode::Return { kind: weave_core::ReturnKind::Void });
        ctor.max_stack = 1;
        tree.methods.push(ctor);
        tree
    }

    fn spec(policy: NullGuardPolicy) -> HandlerSpec {
        let iface = ClassTree::new("pkg/Counter", 52, AccessFlags::PUBLIC | AccessFlags::INTERFACE);
        weave_spec::analyze(&iface, None, None).unwrap().with_null_guard_policy(policy)
    }

    #[test]
    fn check_before_call_leaves_constructors_untouched() {
        let mut handlee = handlee_with_ctor("java/lang/Object");
        let before = handlee.find_method("<init>", "()V").unwrap().instructions.opcodes();
        patch_all(&mut handlee, &spec(NullGuardPolicy::CheckBeforeCall), "counter");
        let after = handlee.find_method("<init>", "()V").unwrap().instructions.opcodes();
        assert_eq!(before, after);
    }

    #[test]
    fn assign_before_super_injects_ahead_of_init_call() {
        let mut handlee = handlee_with_ctor("java/lang/Object");
        patch_all(&mut handlee, &spec(NullGuardPolicy::AssignBeforeSuper), "counter");
        let ctor = handlee.find_method("<init>", "()V").unwrap();
        let opcodes = ctor.instructions.opcodes();
        // LoadThis, [LoadThis, LoadThis, PutField], Invoke, Return
        assert_eq!(opcodes[0], Opcode::LoadThis);
        assert_eq!(opcodes[1], Opcode::LoadThis);
        assert_eq!(opcodes[2], Opcode::LoadThis);
        assert!(matches!(opcodes[3], Opcode::PutField { .. }));
        assert!(matches!(opcodes[4], Opcode::Invoke { kind: InvokeKind::Special, .. }));
        assert_eq!(ctor.max_stack, 2);
    }

    #[test]
    fn assign_after_super_preserves_forward_order() {
        let mut handlee = handlee_with_ctor("java/lang/Object");
        patch_all(&mut handlee, &spec(NullGuardPolicy::AssignAfterSuper), "counter");
        let ctor = handlee.find_method("<init>", "()V").unwrap();
        let opcodes = ctor.instructions.opcodes();
        assert!(matches!(opcodes[1], Opcode::Invoke { kind: InvokeKind::Special, .. }));
        assert_eq!(opcodes[2], Opcode::LoadThis);
        assert_eq!(opcodes[3], Opcode::LoadThis);
        assert!(matches!(opcodes[4], Opcode::PutField { .. }));
        assert_eq!(opcodes[5], Opcode::Return { kind: weave_core::ReturnKind::Void });
    }

    #[test]
    fn delegating_constructor_is_skipped() {
        let mut handlee = handlee_with_ctor("pkg/Handlee");
        let before = handlee.find_method("<init>", "()V").unwrap().instructions.opcodes();
        patch_all(&mut handlee, &spec(NullGuardPolicy::AssignAfterSuper), "counter");
        let after = handlee.find_method("<init>", "()V").unwrap().instructions.opcodes();
        assert_eq!(before, after);
    }

    #[test]
    fn spawner_configured_doubles_stack_bump_and_invokes_spawner() {
        let mut handlee = handlee_with_ctor("java/lang/Object");
        let mut spec = spec(NullGuardPolicy::AssignAfterSuper);
        spec.spawner = Some(weave_spec::SpawnerRef::new("pkg/Factory", "spawn"));
        patch_all(&mut handlee, &spec, "counter");
        let ctor = handlee.find_method("<init>", "()V").unwrap();
        assert_eq!(ctor.max_stack, 3);
        let found = ctor.instructions.opcodes().into_iter().any(|op| {
            matches!(op, Opcode::Invoke { kind: InvokeKind::Static, owner, name, .. }
                if owner == "pkg/Factory" && name == "spawn")
        });
        assert!(found);
    }

    #[test]
    fn assign_before_super_with_spawner_injects_self_assign_ahead_and_spawner_assign_after() {
        let mut handlee = handlee_with_ctor("java/lang/Object");
        let mut spec = spec(NullGuardPolicy::AssignBeforeSuper);
        spec.spawner = Some(weave_spec::SpawnerRef::new("pkg/Factory", "spawn"));
        patch_all(&mut handlee, &spec, "counter");
        let ctor = handlee.find_method("<init>", "()V").unwrap();
        let opcodes = ctor.instructions.opcodes();

        let super_call_index = opcodes
            .iter()
            .position(|op| matches!(op, Opcode::Invoke { kind: InvokeKind::Special, .. }))
            .unwrap();
        let put_field_indices: Vec<_> = opcodes
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, Opcode::PutField { .. }))
            .map(|(i, _)| i)
            .collect();
        let spawner_call_index = opcodes
            .iter()
            .position(|op| matches!(op, Opcode::Invoke { kind: InvokeKind::Static, .. }))
            .unwrap();

        assert_eq!(put_field_indices.len(), 2, "self-assign before super plus spawner-assign after super");
        assert!(put_field_indices[0] < super_call_index, "self-assign happens ahead of the super call");
        assert!(super_call_index < spawner_call_index, "spawner call happens after the super call");
        assert!(super_call_index < put_field_indices[1], "spawner-assign field write happens after the super call");
    }
}
