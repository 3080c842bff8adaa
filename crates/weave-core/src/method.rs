//! A single method (or constructor) member of a [`crate::ClassTree`].

use crate::{AccessFlags, Annotation, AnnotationValue, InstructionList};

/// Name of the synthetic attribute the engine writes on a handlee's first
/// successful instrumentation and checks for on entry, so that
/// re-instrumenting an already-instrumented class fails fast (§4.2's "not
/// idempotent" contract) instead of silently double-rewriting.
pub const MARKER_ATTRIBUTE_NAME: &str = "HandlerInstrumented";

/// A debug-info entry in a method's local-variable table.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableEntry {
    pub name: String,
    pub descriptor: String,
    pub slot: u16,
    /// Instruction range, in list order, over which this entry is valid.
    pub start: usize,
    pub length: usize,
}

/// A method's local-variable debug table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalVariableTable {
    pub entries: Vec<LocalVariableEntry>,
}

impl LocalVariableTable {
    /// Shift every existing entry's slot by +1 and insert a fresh entry for the
    /// new leading parameter at slot 1, spanning the method's full instruction
    /// range (§4.2.3: "shift existing indices by +1 and insert an entry for
    /// the new parameter at index 1 over the full method range").
    pub fn shift_for_new_parameter(&mut self, param_name: &str, param_descriptor: &str, method_length: usize) {
        for entry in &mut self.entries {
            entry.slot += 1;
        }
        self.entries.push(LocalVariableEntry {
            name: param_name.to_string(),
            descriptor: param_descriptor.to_string(),
            slot: 1,
            start: 0,
            length: method_length,
        });
    }
}

/// A generic (unparsed) class-file attribute the engine is not in the
/// business of interpreting, only relocating verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericAttribute {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodNode {
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub instructions: InstructionList,
    pub locals: LocalVariableTable,
    pub max_stack: u16,
    pub max_locals: u16,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
    pub visible_parameter_annotations: Vec<Vec<Annotation>>,
    pub invisible_parameter_annotations: Vec<Vec<Annotation>>,
    pub default_value: Option<AnnotationValue>,
    pub attributes: Vec<GenericAttribute>,
}

impl MethodNode {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            access,
            signature: None,
            exceptions: Vec::new(),
            instructions: InstructionList::new(),
            locals: LocalVariableTable::default(),
            max_stack: 0,
            max_locals: 0,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
            visible_parameter_annotations: Vec::new(),
            invisible_parameter_annotations: Vec::new(),
            default_value: None,
            attributes: Vec::new(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_abstract(&self) -> bool {
        self.access.contains(AccessFlags::ABSTRACT)
    }

    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }

    pub fn is_native(&self) -> bool {
        self.access.contains(AccessFlags::NATIVE)
    }

    /// The canonical intercepted-signature form `name(args)ret` for this
    /// method, matching the form the Handler Spec Analyzer derives from a
    /// handler-interface method (§3, §4.1).
    pub fn signature_key(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }

    /// Move every method-level attribute and annotation (default value,
    /// visible/invisible annotations, visible/invisible parameter
    /// annotations, generic attributes) from `self` onto `dispatch`, leaving
    /// `self` with none (§4.2.3, §8 property 5).
    pub fn relocate_annotations_to(&mut self, dispatch: &mut MethodNode) {
        dispatch.visible_annotations = std::mem::take(&mut self.visible_annotations);
        dispatch.invisible_annotations = std::mem::take(&mut self.invisible_annotations);
        dispatch.visible_parameter_annotations = std::mem::take(&mut self.visible_parameter_annotations);
        dispatch.invisible_parameter_annotations = std::mem::take(&mut self.invisible_parameter_annotations);
        dispatch.default_value = self.default_value.take();
        dispatch.attributes = std::mem::take(&mut self.attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_key_matches_analyzer_form() {
        let method = MethodNode::new("call", "(I)Z", AccessFlags::PUBLIC);
        assert_eq!(method.signature_key(), "call(I)Z");
    }

    #[test]
    fn relocate_annotations_moves_everything_and_clears_source() {
        let mut original = MethodNode::new("call", "(I)Z", AccessFlags::PUBLIC);
        original.visible_annotations.push(Annotation::new("Lpkg/Anno;"));
        original.default_value = Some(AnnotationValue::Int(1));
        original.attributes.push(GenericAttribute { name: "X".into(), data: vec![1, 2] });

        let mut dispatch = MethodNode::new("call", "(I)Z", AccessFlags::PUBLIC);
        original.relocate_annotations_to(&mut dispatch);

        assert!(original.visible_annotations.is_empty());
        assert!(original.default_value.is_none());
        assert!(original.attributes.is_empty());
        assert_eq!(dispatch.visible_annotations.len(), 1);
        assert_eq!(dispatch.default_value, Some(AnnotationValue::Int(1)));
        assert_eq!(dispatch.attributes.len(), 1);
    }

    #[test]
    fn local_variable_table_shift_inserts_new_param() {
        let mut table = LocalVariableTable::default();
        table.entries.push(LocalVariableEntry {
            name: "x".into(),
            descriptor: "I".into(),
            slot: 1,
            start: 0,
            length: 10,
        });
        table.shift_for_new_parameter("handler", "Lpkg/Handler;", 10);

        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.entries[0].slot, 2);
        assert_eq!(table.entries[1].slot, 1);
        assert_eq!(table.entries[1].name, "handler");
    }

    #[test]
    fn method_kind_predicates() {
        let mut method = MethodNode::new("foo", "()V", AccessFlags::ABSTRACT | AccessFlags::STATIC);
        assert!(method.is_abstract());
        assert!(method.is_static());
        method.access = AccessFlags::NATIVE;
        assert!(method.is_native());
        assert!(!MethodNode::new("<init>", "()V", AccessFlags::PUBLIC).is_abstract());
    }

    #[test]
    fn is_constructor_checks_init_name() {
        assert!(MethodNode::new("<init>", "()V", AccessFlags::PUBLIC).is_constructor());
        assert!(!MethodNode::new("init", "()V", AccessFlags::PUBLIC).is_constructor());
    }
}
