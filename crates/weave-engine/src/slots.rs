//! Shared slot/verification-type helpers used by both the per-method rewrite
//! and native-wrapping paths, which both walk a descriptor's argument list
//! and assign operand-stack/local-variable slots the same way.

use weave_core::{FieldType, SlotKind, VerificationType};

/// Which load/store opcode family a descriptor's field type occupies.
pub fn slot_kind_of(field_type: &FieldType) -> SlotKind {
    match field_type {
        FieldType::Long => SlotKind::Long,
        FieldType::Float => SlotKind::Float,
        FieldType::Double => SlotKind::Double,
        FieldType::Object(_) | FieldType::Array(_) => SlotKind::Reference,
        FieldType::Byte | FieldType::Char | FieldType::Short | FieldType::Boolean | FieldType::Int => SlotKind::Int,
        FieldType::Void => SlotKind::Int, // unreachable as an argument type
    }
}

/// The stack-map verification type a descriptor's field type corresponds to.
pub fn verification_type_of(field_type: &FieldType) -> VerificationType {
    match field_type {
        FieldType::Long => VerificationType::Long,
        FieldType::Float => VerificationType::Float,
        FieldType::Double => VerificationType::Double,
        FieldType::Object(name) => VerificationType::Object(name.clone()),
        FieldType::Array(_) => VerificationType::Object(field_type.to_descriptor()),
        FieldType::Void => VerificationType::Top,
        FieldType::Byte | FieldType::Char | FieldType::Short | FieldType::Boolean | FieldType::Int => {
            VerificationType::Integer
        }
    }
}

/// Build the locals list for a full frame spanning `this` (of type
/// `receiver`), each of `args` in slot order (wide types contributing a
/// `Top` filler for their second slot), and a trailing local of type
/// `trailing`. Used by both the dispatch method's post-guard join frame and
/// by any method-rewrite caller needing the same shape.
pub fn locals_with_trailing(receiver: &str, args: &[FieldType], trailing: &str) -> Vec<VerificationType> {
    let mut locals = vec![VerificationType::Object(receiver.to_string())];
    for arg in args {
        locals.push(verification_type_of(arg));
        if arg.slot_size() == 2 {
            locals.push(VerificationType::Top);
        }
    }
    locals.push(VerificationType::Object(trailing.to_string()));
    locals
}
