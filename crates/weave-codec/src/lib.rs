//! The Class-File Codec: bytes ⇄ [`ClassTree`].
//!
//! This component is assumed correct and off-the-shelf; the rest of the
//! workspace treats it as a given contract. In a production deployment this
//! crate's job would be filled by a real class-file library; here it is a compact,
//! self-contained binary format that round-trips every field of the data
//! model in `weave-core` (so the engine can be exercised and tested without
//! an external dependency that does not exist for this made-up wire format),
//! written the same way a flat bytecode buffer is typically filled: a flat
//! byte buffer written via big-endian `write_u16`/`write_u32` calls.
//!
//! The encoder never attempts to compute stack-map frames: it only ever
//! serializes the [`StackFrame`] markers already present on the tree, which
//! satisfies §4.2.7's "callers must encode with zero frame-computation
//! flags" requirement by construction — there is no code path in this crate
//! that loads or inspects any class other than the one being encoded.

mod reader;
mod writer;

use reader::{ClassReader, ReadError};
use writer::ClassWriter;
use weave_core::{
    AccessFlags, Annotation, AnnotationValue, ClassTree, CodecError, FieldNode, GenericAttribute,
    InstructionList, InvokeKind, LocalVariableEntry, LocalVariableTable, MethodNode, NodeId, Opcode,
    ReturnKind, SlotKind, StackFrame, VerificationType,
};

/// Decode `bytes` into a [`ClassTree`]. `class_name_hint` is used only to
/// enrich the error message if decoding fails partway through.
pub fn decode(bytes: &[u8], class_name_hint: &str) -> Result<ClassTree, CodecError> {
    let mut r = ClassReader::new(bytes);
    decode_class(&mut r).map_err(|e| CodecError::Decode {
        class_name: class_name_hint.to_string(),
        detail: e.0,
    })
}

/// Encode `tree` to bytes. Encoding never fails in this codec's model (every
/// field of [`ClassTree`] is representable); the `Result` is kept for
/// interface symmetry with `decode` and so callers using a different
/// (real) codec implementation behind the same contract compile unchanged.
pub fn encode(tree: &ClassTree) -> Result<Vec<u8>, CodecError> {
    let mut w = ClassWriter::new();
    encode_class(tree, &mut w);
    Ok(w.into_bytes())
}

// ===========================================================================
// Class
// ===========================================================================

fn encode_class(tree: &ClassTree, w: &mut ClassWriter) {
    w.write_u32(0xC1A5_F11E); // magic
    w.write_u32(tree.version);
    w.write_str(&tree.internal_name);
    w.write_u16(tree.access.bits());
    match &tree.super_name {
        Some(name) => {
            w.write_bool(true);
            w.write_str(name);
        }
        None => w.write_bool(false),
    }
    w.write_u16(tree.interfaces.len() as u16);
    for iface in &tree.interfaces {
        w.write_str(iface);
    }
    w.write_u16(tree.fields.len() as u16);
    for field in &tree.fields {
        encode_field(field, w);
    }
    w.write_u16(tree.methods.len() as u16);
    for method in &tree.methods {
        encode_method(method, w);
    }
    w.write_u16(tree.annotations.len() as u16);
    for ann in &tree.annotations {
        encode_annotation(ann, w);
    }
    w.write_u16(tree.class_attributes.len() as u16);
    for attr in &tree.class_attributes {
        encode_attribute(attr, w);
    }
}

fn decode_class(r: &mut ClassReader) -> Result<ClassTree, ReadError> {
    let magic = r.read_u32()?;
    if magic != 0xC1A5_F11E {
        return Err(ReadError(format!("bad magic number {magic:#010x}")));
    }
    let version = r.read_u32()?;
    let internal_name = r.read_str()?;
    let access = AccessFlags::from_bits_truncate(r.read_u16()?);
    let super_name = if r.read_bool()? { Some(r.read_str()?) } else { None };

    let mut tree = ClassTree::new(internal_name, version, access);
    tree.super_name = super_name;

    let iface_count = r.read_u16()?;
    for _ in 0..iface_count {
        tree.interfaces.push(r.read_str()?);
    }
    let field_count = r.read_u16()?;
    for _ in 0..field_count {
        tree.fields.push(decode_field(r)?);
    }
    let method_count = r.read_u16()?;
    for _ in 0..method_count {
        tree.methods.push(decode_method(r)?);
    }
    let ann_count = r.read_u16()?;
    for _ in 0..ann_count {
        tree.annotations.push(decode_annotation(r)?);
    }
    let attr_count = r.read_u16()?;
    for _ in 0..attr_count {
        tree.class_attributes.push(decode_attribute(r)?);
    }
    Ok(tree)
}

// ===========================================================================
// Fields
// ===========================================================================

fn encode_field(field: &FieldNode, w: &mut ClassWriter) {
    w.write_str(&field.name);
    w.write_str(&field.descriptor);
    w.write_u16(field.access.bits());
    w.write_u16(field.visible_annotations.len() as u16);
    for ann in &field.visible_annotations {
        encode_annotation(ann, w);
    }
    w.write_u16(field.invisible_annotations.len() as u16);
    for ann in &field.invisible_annotations {
        encode_annotation(ann, w);
    }
}

fn decode_field(r: &mut ClassReader) -> Result<FieldNode, ReadError> {
    let name = r.read_str()?;
    let descriptor = r.read_str()?;
    let access = AccessFlags::from_bits_truncate(r.read_u16()?);
    let mut field = FieldNode::new(name, descriptor, access);
    let visible_count = r.read_u16()?;
    for _ in 0..visible_count {
        field.visible_annotations.push(decode_annotation(r)?);
    }
    let invisible_count = r.read_u16()?;
    for _ in 0..invisible_count {
        field.invisible_annotations.push(decode_annotation(r)?);
    }
    Ok(field)
}

// ===========================================================================
// Methods
// ===========================================================================

fn encode_method(method: &MethodNode, w: &mut ClassWriter) {
    w.write_str(&method.name);
    w.write_str(&method.descriptor);
    w.write_u16(method.access.bits());
    match &method.signature {
        Some(sig) => {
            w.write_bool(true);
            w.write_str(sig);
        }
        None => w.write_bool(false),
    }
    w.write_u16(method.exceptions.len() as u16);
    for exc in &method.exceptions {
        w.write_str(exc);
    }
    w.write_u16(method.max_stack);
    w.write_u16(method.max_locals);
    encode_instructions(&method.instructions, w);
    encode_locals(&method.locals, w);

    w.write_u16(method.visible_annotations.len() as u16);
    for ann in &method.visible_annotations {
        encode_annotation(ann, w);
    }
    w.write_u16(method.invisible_annotations.len() as u16);
    for ann in &method.invisible_annotations {
        encode_annotation(ann, w);
    }
    w.write_u16(method.visible_parameter_annotations.len() as u16);
    for group in &method.visible_parameter_annotations {
        w.write_u16(group.len() as u16);
        for ann in group {
            encode_annotation(ann, w);
        }
    }
    w.write_u16(method.invisible_parameter_annotations.len() as u16);
    for group in &method.invisible_parameter_annotations {
        w.write_u16(group.len() as u16);
        for ann in group {
            encode_annotation(ann, w);
        }
    }
    match &method.default_value {
        Some(v) => {
            w.write_bool(true);
            encode_value(v, w);
        }
        None => w.write_bool(false),
    }
    w.write_u16(method.attributes.len() as u16);
    for attr in &method.attributes {
        encode_attribute(attr, w);
    }
}

fn decode_method(r: &mut ClassReader) -> Result<MethodNode, ReadError> {
    let name = r.read_str()?;
    let descriptor = r.read_str()?;
    let access = AccessFlags::from_bits_truncate(r.read_u16()?);
    let mut method = MethodNode::new(name, descriptor, access);
    method.signature = if r.read_bool()? { Some(r.read_str()?) } else { None };
    let exc_count = r.read_u16()?;
    for _ in 0..exc_count {
        method.exceptions.push(r.read_str()?);
    }
    method.max_stack = r.read_u16()?;
    method.max_locals = r.read_u16()?;
    method.instructions = decode_instructions(r)?;
    method.locals = decode_locals(r)?;

    let visible_count = r.read_u16()?;
    for _ in 0..visible_count {
        method.visible_annotations.push(decode_annotation(r)?);
    }
    let invisible_count = r.read_u16()?;
    for _ in 0..invisible_count {
        method.invisible_annotations.push(decode_annotation(r)?);
    }
    let visible_param_groups = r.read_u16()?;
    for _ in 0..visible_param_groups {
        let n = r.read_u16()?;
        let mut group = Vec::with_capacity(n as usize);
        for _ in 0..n {
            group.push(decode_annotation(r)?);
        }
        method.visible_parameter_annotations.push(group);
    }
    let invisible_param_groups = r.read_u16()?;
    for _ in 0..invisible_param_groups {
        let n = r.read_u16()?;
        let mut group = Vec::with_capacity(n as usize);
        for _ in 0..n {
            group.push(decode_annotation(r)?);
        }
        method.invisible_parameter_annotations.push(group);
    }
    method.default_value = if r.read_bool()? { Some(decode_value(r)?) } else { None };
    let attr_count = r.read_u16()?;
    for _ in 0..attr_count {
        method.attributes.push(decode_attribute(r)?);
    }
    Ok(method)
}

fn encode_locals(locals: &LocalVariableTable, w: &mut ClassWriter) {
    w.write_u16(locals.entries.len() as u16);
    for entry in &locals.entries {
        w.write_str(&entry.name);
        w.write_str(&entry.descriptor);
        w.write_u16(entry.slot);
        w.write_u32(entry.start as u32);
        w.write_u32(entry.length as u32);
    }
}

fn decode_locals(r: &mut ClassReader) -> Result<LocalVariableTable, ReadError> {
    let count = r.read_u16()?;
    let mut table = LocalVariableTable::default();
    for _ in 0..count {
        table.entries.push(LocalVariableEntry {
            name: r.read_str()?,
            descriptor: r.read_str()?,
            slot: r.read_u16()?,
            start: r.read_u32()? as usize,
            length: r.read_u32()? as usize,
        });
    }
    Ok(table)
}

fn encode_attribute(attr: &GenericAttribute, w: &mut ClassWriter) {
    w.write_str(&attr.name);
    w.write_bytes(&attr.data);
}

fn decode_attribute(r: &mut ClassReader) -> Result<GenericAttribute, ReadError> {
    Ok(GenericAttribute {
        name: r.read_str()?,
        data: r.read_bytes()?,
    })
}

// ===========================================================================
// Annotations
// ===========================================================================

fn encode_annotation(ann: &Annotation, w: &mut ClassWriter) {
    w.write_str(&ann.descriptor);
    w.write_u16(ann.values.len() as u16);
    for (name, value) in &ann.values {
        w.write_str(name);
        encode_value(value, w);
    }
}

fn decode_annotation(r: &mut ClassReader) -> Result<Annotation, ReadError> {
    let descriptor = r.read_str()?;
    let count = r.read_u16()?;
    let mut ann = Annotation::new(descriptor);
    for _ in 0..count {
        let name = r.read_str()?;
        let value = decode_value(r)?;
        ann.values.push((name, value));
    }
    Ok(ann)
}

fn encode_value(value: &AnnotationValue, w: &mut ClassWriter) {
    match value {
        AnnotationValue::Boolean(b) => {
            w.write_u8(0);
            w.write_bool(*b);
        }
        AnnotationValue::Byte(b) => {
            w.write_u8(1);
            w.write_u8(*b as u8);
        }
        AnnotationValue::Char(c) => {
            w.write_u8(2);
            w.write_u16(*c);
        }
        AnnotationValue::Short(s) => {
            w.write_u8(3);
            w.write_i16(*s);
        }
        AnnotationValue::Int(i) => {
            w.write_u8(4);
            w.write_i32(*i);
        }
        AnnotationValue::Long(l) => {
            w.write_u8(5);
            w.write_i64(*l);
        }
        AnnotationValue::Float(f) => {
            w.write_u8(6);
            w.write_f32(*f);
        }
        AnnotationValue::Double(d) => {
            w.write_u8(7);
            w.write_f64(*d);
        }
        AnnotationValue::String(s) => {
            w.write_u8(8);
            w.write_str(s);
        }
        AnnotationValue::Enum { type_descriptor, const_name } => {
            w.write_u8(9);
            w.write_str(type_descriptor);
            w.write_str(const_name);
        }
        AnnotationValue::Class(internal_name) => {
            w.write_u8(10);
            w.write_str(internal_name);
        }
        AnnotationValue::Annotation(inner) => {
            w.write_u8(11);
            encode_annotation(inner, w);
        }
        AnnotationValue::Array(items) => {
            w.write_u8(12);
            w.write_u16(items.len() as u16);
            for item in items {
                encode_value(item, w);
            }
        }
    }
}

fn decode_value(r: &mut ClassReader) -> Result<AnnotationValue, ReadError> {
    Ok(match r.read_u8()? {
        0 => AnnotationValue::Boolean(r.read_bool()?),
        1 => AnnotationValue::Byte(r.read_u8()? as i8),
        2 => AnnotationValue::Char(r.read_u16()?),
        3 => AnnotationValue::Short(r.read_i16()?),
        4 => AnnotationValue::Int(r.read_i32()?),
        5 => AnnotationValue::Long(r.read_i64()?),
        6 => AnnotationValue::Float(r.read_f32()?),
        7 => AnnotationValue::Double(r.read_f64()?),
        8 => AnnotationValue::String(r.read_str()?),
        9 => AnnotationValue::Enum {
            type_descriptor: r.read_str()?,
            const_name: r.read_str()?,
        },
        10 => AnnotationValue::Class(r.read_str()?),
        11 => AnnotationValue::Annotation(Box::new(decode_annotation(r)?)),
        12 => {
            let n = r.read_u16()?;
            let mut items = Vec::with_capacity(n as usize);
            for _ in 0..n {
                items.push(decode_value(r)?);
            }
            AnnotationValue::Array(items)
        }
        other => return Err(ReadError(format!("invalid annotation value tag {other}"))),
    })
}

// ===========================================================================
// Instructions
// ===========================================================================

fn slot_kind_tag(kind: SlotKind) -> u8 {
    match kind {
        SlotKind::Int => 0,
        SlotKind::Long => 1,
        SlotKind::Float => 2,
        SlotKind::Double => 3,
        SlotKind::Reference => 4,
    }
}

fn slot_kind_from_tag(tag: u8) -> Result<SlotKind, ReadError> {
    Ok(match tag {
        0 => SlotKind::Int,
        1 => SlotKind::Long,
        2 => SlotKind::Float,
        3 => SlotKind::Double,
        4 => SlotKind::Reference,
        other => return Err(ReadError(format!("invalid slot kind tag {other}"))),
    })
}

fn return_kind_tag(kind: ReturnKind) -> u8 {
    match kind {
        ReturnKind::Int => 0,
        ReturnKind::Long => 1,
        ReturnKind::Float => 2,
        ReturnKind::Double => 3,
        ReturnKind::Reference => 4,
        ReturnKind::Void => 5,
    }
}

fn return_kind_from_tag(tag: u8) -> Result<ReturnKind, ReadError> {
    Ok(match tag {
        0 => ReturnKind::Int,
        1 => ReturnKind::Long,
        2 => ReturnKind::Float,
        3 => ReturnKind::Double,
        4 => ReturnKind::Reference,
        5 => ReturnKind::Void,
        other => return Err(ReadError(format!("invalid return kind tag {other}"))),
    })
}

fn invoke_kind_tag(kind: InvokeKind) -> u8 {
    match kind {
        InvokeKind::Virtual => 0,
        InvokeKind::Interface => 1,
        InvokeKind::Special => 2,
        InvokeKind::Static => 3,
    }
}

fn invoke_kind_from_tag(tag: u8) -> Result<InvokeKind, ReadError> {
    Ok(match tag {
        0 => InvokeKind::Virtual,
        1 => InvokeKind::Interface,
        2 => InvokeKind::Special,
        3 => InvokeKind::Static,
        other => return Err(ReadError(format!("invalid invoke kind tag {other}"))),
    })
}

fn encode_verification_type(vt: &VerificationType, w: &mut ClassWriter) {
    match vt {
        VerificationType::Top => w.write_u8(0),
        VerificationType::Integer => w.write_u8(1),
        VerificationType::Float => w.write_u8(2),
        VerificationType::Long => w.write_u8(3),
        VerificationType::Double => w.write_u8(4),
        VerificationType::Null => w.write_u8(5),
        VerificationType::UninitializedThis => w.write_u8(6),
        VerificationType::Object(internal_name) => {
            w.write_u8(7);
            w.write_str(internal_name);
        }
        VerificationType::Uninitialized(offset) => {
            w.write_u8(8);
            w.write_u32(*offset);
        }
    }
}

fn decode_verification_type(r: &mut ClassReader) -> Result<VerificationType, ReadError> {
    Ok(match r.read_u8()? {
        0 => VerificationType::Top,
        1 => VerificationType::Integer,
        2 => VerificationType::Float,
        3 => VerificationType::Long,
        4 => VerificationType::Double,
        5 => VerificationType::Null,
        6 => VerificationType::UninitializedThis,
        7 => VerificationType::Object(r.read_str()?),
        8 => VerificationType::Uninitialized(r.read_u32()?),
        other => return Err(ReadError(format!("invalid verification type tag {other}"))),
    })
}

fn encode_frame(frame: &StackFrame, w: &mut ClassWriter) {
    match frame {
        StackFrame::Same => w.write_u8(0),
        StackFrame::SameLocals1StackItem(vt) => {
            w.write_u8(1);
            encode_verification_type(vt, w);
        }
        StackFrame::Chop { count } => {
            w.write_u8(2);
            w.write_u8(*count);
        }
        StackFrame::Append { locals } => {
            w.write_u8(3);
            w.write_u16(locals.len() as u16);
            for l in locals {
                encode_verification_type(l, w);
            }
        }
        StackFrame::Full { locals, stack } => {
            w.write_u8(4);
            w.write_u16(locals.len() as u16);
            for l in locals {
                encode_verification_type(l, w);
            }
            w.write_u16(stack.len() as u16);
            for s in stack {
                encode_verification_type(s, w);
            }
        }
    }
}

fn decode_frame(r: &mut ClassReader) -> Result<StackFrame, ReadError> {
    Ok(match r.read_u8()? {
        0 => StackFrame::Same,
        1 => StackFrame::SameLocals1StackItem(decode_verification_type(r)?),
        2 => StackFrame::Chop { count: r.read_u8()? },
        3 => {
            let n = r.read_u16()?;
            let mut locals = Vec::with_capacity(n as usize);
            for _ in 0..n {
                locals.push(decode_verification_type(r)?);
            }
            StackFrame::Append { locals }
        }
        4 => {
            let local_count = r.read_u16()?;
            let mut locals = Vec::with_capacity(local_count as usize);
            for _ in 0..local_count {
                locals.push(decode_verification_type(r)?);
            }
            let stack_count = r.read_u16()?;
            let mut stack = Vec::with_capacity(stack_count as usize);
            for _ in 0..stack_count {
                stack.push(decode_verification_type(r)?);
            }
            StackFrame::Full { locals, stack }
        }
        other => return Err(ReadError(format!("invalid stack frame tag {other}"))),
    })
}

/// Opcodes decoded in a form that defers resolving jump targets, since a
/// forward jump's target node does not exist yet when the jump instruction
/// itself is read. `u32` fields here are *positions* in instruction order,
/// resolved to real [`NodeId`]s in a second pass once every node exists.
enum PendingOpcode {
    Direct(Opcode),
    Goto(u32),
    IfNull(u32),
    IfNonNull(u32),
}

fn encode_instructions(list: &InstructionList, w: &mut ClassWriter) {
    let mut position_of = rustc_hash_map();
    for (i, (id, _)) in list.iter().enumerate() {
        position_of.insert(id, i as u32);
    }

    w.write_u32(list.len() as u32);
    for (_, op) in list.iter() {
        encode_opcode(op, &position_of, w);
    }
}

fn rustc_hash_map() -> std::collections::HashMap<NodeId, u32> {
    std::collections::HashMap::new()
}

fn encode_opcode(op: &Opcode, position_of: &std::collections::HashMap<NodeId, u32>, w: &mut ClassWriter) {
    match op {
        Opcode::Nop => w.write_u8(0),
        Opcode::PushNull => w.write_u8(1),
        Opcode::LoadThis => w.write_u8(2),
        Opcode::LoadVar { slot, kind } => {
            w.write_u8(3);
            w.write_u16(*slot);
            w.write_u8(slot_kind_tag(*kind));
        }
        Opcode::StoreVar { slot, kind } => {
            w.write_u8(4);
            w.write_u16(*slot);
            w.write_u8(slot_kind_tag(*kind));
        }
        Opcode::IncVar { slot, amount } => {
            w.write_u8(5);
            w.write_u16(*slot);
            w.write_i16(*amount);
        }
        Opcode::GetField { owner, name, descriptor } => {
            w.write_u8(6);
            w.write_str(owner);
            w.write_str(name);
            w.write_str(descriptor);
        }
        Opcode::PutField { owner, name, descriptor } => {
            w.write_u8(7);
            w.write_str(owner);
            w.write_str(name);
            w.write_str(descriptor);
        }
        Opcode::GetStatic { owner, name, descriptor } => {
            w.write_u8(8);
            w.write_str(owner);
            w.write_str(name);
            w.write_str(descriptor);
        }
        Opcode::PutStatic { owner, name, descriptor } => {
            w.write_u8(9);
            w.write_str(owner);
            w.write_str(name);
            w.write_str(descriptor);
        }
        Opcode::Invoke { kind, owner, name, descriptor } => {
            w.write_u8(10);
            w.write_u8(invoke_kind_tag(*kind));
            w.write_str(owner);
            w.write_str(name);
            w.write_str(descriptor);
        }
        Opcode::New { internal_name } => {
            w.write_u8(11);
            w.write_str(internal_name);
        }
        Opcode::Dup => w.write_u8(12),
        Opcode::Pop => w.write_u8(13),
        Opcode::CheckCast { internal_name } => {
            w.write_u8(14);
            w.write_str(internal_name);
        }
        Opcode::Label => w.write_u8(15),
        Opcode::Goto { target } => {
            w.write_u8(16);
            w.write_u32(position_of[target]);
        }
        Opcode::IfNull { target } => {
            w.write_u8(17);
            w.write_u32(position_of[target]);
        }
        Opcode::IfNonNull { target } => {
            w.write_u8(18);
            w.write_u32(position_of[target]);
        }
        Opcode::Return { kind } => {
            w.write_u8(19);
            w.write_u8(return_kind_tag(*kind));
        }
        Opcode::Frame(frame) => {
            w.write_u8(20);
            encode_frame(frame, w);
        }
        Opcode::Opaque { opcode, operands } => {
            w.write_u8(21);
            w.write_u8(*opcode);
            w.write_bytes(operands);
        }
    }
}

fn decode_pending_opcode(r: &mut ClassReader) -> Result<PendingOpcode, ReadError> {
    Ok(match r.read_u8()? {
        0 => PendingOpcode::Direct(Opcode::Nop),
        1 => PendingOpcode::Direct(Opcode::PushNull),
        2 => PendingOpcode::Direct(Opcode::LoadThis),
        3 => PendingOpcode::Direct(Opcode::LoadVar {
            slot: r.read_u16()?,
            kind: slot_kind_from_tag(r.read_u8()?)?,
        }),
        4 => PendingOpcode::Direct(Opcode::StoreVar {
            slot: r.read_u16()?,
            kind: slot_kind_from_tag(r.read_u8()?)?,
        }),
        5 => PendingOpcode::Direct(Opcode::IncVar {
            slot: r.read_u16()?,
            amount: r.read_i16()?,
        }),
        6 => PendingOpcode::Direct(Opcode::GetField {
            owner: r.read_str()?,
            name: r.read_str()?,
            descriptor: r.read_str()?,
        }),
        7 => PendingOpcode::Direct(Opcode::PutField {
            owner: r.read_str()?,
            name: r.read_str()?,
            descriptor: r.read_str()?,
        }),
        8 => PendingOpcode::Direct(Opcode::GetStatic {
            owner: r.read_str()?,
            name: r.read_str()?,
            descriptor: r.read_str()?,
        }),
        9 => PendingOpcode::Direct(Opcode::PutStatic {
            owner: r.read_str()?,
            name: r.read_str()?,
            descriptor: r.read_str()?,
        }),
        10 => PendingOpcode::Direct(Opcode::Invoke {
            kind: invoke_kind_from_tag(r.read_u8()?)?,
            owner: r.read_str()?,
            name: r.read_str()?,
            descriptor: r.read_str()?,
        }),
        11 => PendingOpcode::Direct(Opcode::New { internal_name: r.read_str()? }),
        12 => PendingOpcode::Direct(Opcode::Dup),
        13 => PendingOpcode::Direct(Opcode::Pop),
        14 => PendingOpcode::Direct(Opcode::CheckCast { internal_name: r.read_str()? }),
        15 => PendingOpcode::Direct(Opcode::Label),
        16 => PendingOpcode::Goto(r.read_u32()?),
        17 => PendingOpcode::IfNull(r.read_u32()?),
        18 => PendingOpcode::IfNonNull(r.read_u32()?),
        19 => PendingOpcode::Direct(Opcode::Return { kind: return_kind_from_tag(r.read_u8()?)? }),
        20 => PendingOpcode::Direct(Opcode::Frame(decode_frame(r)?)),
        21 => PendingOpcode::Direct(Opcode::Opaque {
            opcode: r.read_u8()?,
            operands: r.read_bytes()?,
        }),
        other => return Err(ReadError(format!("invalid opcode tag {other}"))),
    })
}

fn decode_instructions(r: &mut ClassReader) -> Result<InstructionList, ReadError> {
    let count = r.read_u32()?;
    let mut pending = Vec::with_capacity(count as usize);
    for _ in 0..count {
        pending.push(decode_pending_opcode(r)?);
    }

    let mut list = InstructionList::new();
    let mut positions = Vec::with_capacity(count as usize);
    for _ in 0..count {
        positions.push(list.push_back(Opcode::Nop));
    }

    for (i, op) in pending.into_iter().enumerate() {
        let id = positions[i];
        let resolved = match op {
            PendingOpcode::Direct(op) => op,
            PendingOpcode::Goto(target) => Opcode::Goto { target: positions[target as usize] },
            PendingOpcode::IfNull(target) => Opcode::IfNull { target: positions[target as usize] },
            PendingOpcode::IfNonNull(target) => Opcode::IfNonNull { target: positions[target as usize] },
        };
        *list.get_mut(id).expect("node just allocated") = resolved;
    }

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ClassTree {
        let mut tree = ClassTree::new("pkg/Handlee", 52, AccessFlags::PUBLIC | AccessFlags::SUPER);
        tree.super_name = Some("java/lang/Object".to_string());
        tree.add_interface_if_absent("pkg/Marker");

        let mut field = FieldNode::new("count", "I", AccessFlags::PRIVATE);
        field.visible_annotations.push(Annotation::new("Lpkg/Anno;").with_value("x", AnnotationValue::Int(1)));
        tree.fields.push(field);

        let mut method = MethodNode::new("call", "(I)I", AccessFlags::PUBLIC);
        let label = method.instructions.push_back(Opcode::Label);
        method.instructions.push_back(Opcode::LoadThis);
        method
            .instructions
            .push_back(Opcode::LoadVar { slot: 1, kind: SlotKind::Int });
        method.instructions.push_back(Opcode::IfNonNull { target: label });
        method.instructions.push_back(Opcode::Return { kind: ReturnKind::Int });
        method.instructions.push_back(Opcode::Frame(StackFrame::full(
            vec![VerificationType::Object("pkg/Handlee".into()), VerificationType::Integer],
            vec![],
        )));
        method.max_stack = 2;
        method.max_locals = 2;
        tree.methods.push(method);

        tree.mark_instrumented();
        tree
    }

    #[test]
    fn round_trips_full_tree() {
        let tree = sample_tree();
        let bytes = encode(&tree).unwrap();
        let decoded = decode(&bytes, "pkg.Handlee").unwrap();
        assert_eq!(tree, decoded);
    }

    #[test]
    fn round_trips_forward_jump_targets() {
        let tree = sample_tree();
        let bytes = encode(&tree).unwrap();
        let decoded = decode(&bytes, "pkg.Handlee").unwrap();
        let method = decoded.find_method("call", "(I)I").unwrap();
        let jump = method
            .instructions
            .iter()
            .find_map(|(_, op)| match op {
                Opcode::IfNonNull { target } => Some(*target),
                _ => None,
            })
            .unwrap();
        assert_eq!(method.instructions.get(jump), Some(&Opcode::Label));
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let err = decode(&[0, 0, 0, 0], "pkg.Foo").unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let tree = sample_tree();
        let mut bytes = encode(&tree).unwrap();
        bytes.truncate(bytes.len() - 4);
        let err = decode(&bytes, "pkg.Handlee").unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }
}
