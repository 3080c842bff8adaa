//! [`ClassTree`]: the mutable, in-memory representation of a decoded class file.

use crate::method::MARKER_ATTRIBUTE_NAME;
use crate::{AccessFlags, Annotation, FieldNode, GenericAttribute, MethodNode};

/// A mutable representation of a compiled class.
///
/// Created once by the codec's decode step, mutated only by the
/// Instrumentation Engine, encoded exactly once, then treated as immutable
/// (§3 lifecycles).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTree {
    /// Internal (slash-separated) binary name, e.g. `pkg/Outer$Inner`.
    pub internal_name: String,
    /// Class-file format version.
    pub version: u32,
    pub access: AccessFlags,
    pub super_name: Option<String>,
    /// Implemented interfaces, in declaration order, unique by value (§3 invariant 1).
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    pub annotations: Vec<Annotation>,
    /// Class-level generic attributes, including the synthetic
    /// instrumented-marker attribute (see [`MARKER_ATTRIBUTE_NAME`]).
    pub class_attributes: Vec<GenericAttribute>,
}

impl ClassTree {
    pub fn new(internal_name: impl Into<String>, version: u32, access: AccessFlags) -> Self {
        Self {
            internal_name: internal_name.into(),
            version,
            access,
            super_name: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            class_attributes: Vec::new(),
        }
    }

    /// Add `interface_internal_name` to the implemented-interface list if not
    /// already present (§4.2.1). Idempotent by construction.
    pub fn add_interface_if_absent(&mut self, interface_internal_name: &str) {
        if !self.interfaces.iter().any(|i| i == interface_internal_name) {
            self.interfaces.push(interface_internal_name.to_string());
        }
    }

    pub fn implements(&self, interface_internal_name: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface_internal_name)
    }

    pub fn has_field_named(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Produce a field name derived from `base` that does not collide with any
    /// existing field, by appending `_` until unique (§4.2.2).
    pub fn unique_field_name(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        while self.has_field_named(&candidate) {
            candidate.push('_');
        }
        candidate
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodNode> {
        self.methods.iter().find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn find_method_mut(&mut self, name: &str, descriptor: &str) -> Option<&mut MethodNode> {
        self.methods.iter_mut().find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodNode> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    pub fn constructors_mut(&mut self) -> impl Iterator<Item = &mut MethodNode> {
        self.methods.iter_mut().filter(|m| m.is_constructor())
    }

    /// Whether this tree already carries the engine's instrumented-marker
    /// attribute, i.e. has already been through `instrument()` once.
    pub fn is_already_instrumented(&self) -> bool {
        self.attributes_iter().any(|a| a.name == MARKER_ATTRIBUTE_NAME)
    }

    /// Stamp the instrumented-marker attribute so a second `instrument()` call
    /// on this tree is rejected (§4.2 "not idempotent"). Stored on the class
    /// itself via a dedicated synthetic class-level attribute vector.
    pub fn mark_instrumented(&mut self) {
        self.class_attributes.push(GenericAttribute {
            name: MARKER_ATTRIBUTE_NAME.to_string(),
            data: Vec::new(),
        });
    }

    fn attributes_iter(&self) -> impl Iterator<Item = &GenericAttribute> {
        self.class_attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassTree {
        ClassTree::new("pkg/Handlee", 52, AccessFlags::PUBLIC | AccessFlags::SUPER)
    }

    #[test]
    fn add_interface_is_idempotent() {
        let mut tree = sample();
        tree.add_interface_if_absent("pkg/Handler");
        tree.add_interface_if_absent("pkg/Handler");
        assert_eq!(tree.interfaces, vec!["pkg/Handler".to_string()]);
    }

    #[test]
    fn unique_field_name_appends_underscore_on_collision() {
        let mut tree = sample();
        tree.fields.push(FieldNode::new("handler", "Lpkg/Handler;", AccessFlags::PRIVATE));
        assert_eq!(tree.unique_field_name("handler"), "handler_");
        tree.fields.push(FieldNode::new("handler_", "I", AccessFlags::PRIVATE));
        assert_eq!(tree.unique_field_name("handler"), "handler__");
    }

    #[test]
    fn mark_instrumented_is_observable() {
        let mut tree = sample();
        assert!(!tree.is_already_instrumented());
        tree.mark_instrumented();
        assert!(tree.is_already_instrumented());
    }

    #[test]
    fn find_method_matches_name_and_descriptor() {
        let mut tree = sample();
        tree.methods.push(MethodNode::new("call", "(I)Z", AccessFlags::PUBLIC));
        assert!(tree.find_method("call", "(I)Z").is_some());
        assert!(tree.find_method("call", "(J)Z").is_none());
    }
}
