//! A single field member of a [`crate::ClassTree`].

use crate::{AccessFlags, Annotation};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
}

impl FieldNode {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            access,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_has_no_annotations() {
        let field = FieldNode::new("handler", "Lpkg/Handler;", AccessFlags::handler_field());
        assert!(field.visible_annotations.is_empty());
        assert_eq!(field.access, AccessFlags::handler_field());
    }
}
