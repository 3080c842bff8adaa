//! Method and field descriptor parsing/formatting.
//!
//! Descriptors follow the VM's standard encoding: primitive letters
//! (`B C D F I J S Z`), `V` for void, `L<internal-name>;` for objects,
//! a leading `[` per array dimension, and a method descriptor of the form
//! `(<arg-descriptors>)<return-descriptor>`.

use std::fmt;

/// A single field (value) type as it appears in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Number of local-variable/stack slots this type occupies: 2 for `long`/`double`, else 1.
    /// `Void` occupies 0 (it never appears as an argument, only as a return type).
    pub fn slot_size(&self) -> u8 {
        match self {
            FieldType::Long | FieldType::Double => 2,
            FieldType::Void => 0,
            _ => 1,
        }
    }

    /// Whether this type is a primitive integer-like type represented on the VM
    /// operand stack as a 32-bit int (byte/char/short/boolean/int).
    pub fn is_int_like(&self) -> bool {
        matches!(
            self,
            FieldType::Byte | FieldType::Char | FieldType::Short | FieldType::Boolean | FieldType::Int
        )
    }

    /// Render this type back to its descriptor spelling.
    pub fn to_descriptor(&self) -> String {
        match self {
            FieldType::Byte => "B".to_string(),
            FieldType::Char => "C".to_string(),
            FieldType::Double => "D".to_string(),
            FieldType::Float => "F".to_string(),
            FieldType::Int => "I".to_string(),
            FieldType::Long => "J".to_string(),
            FieldType::Short => "S".to_string(),
            FieldType::Boolean => "Z".to_string(),
            FieldType::Void => "V".to_string(),
            FieldType::Object(internal) => format!("L{internal};"),
            FieldType::Array(elem) => format!("[{}", elem.to_descriptor()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_descriptor())
    }
}

/// Parse a single field-type descriptor starting at `bytes[*pos]`, advancing `pos`
/// past the consumed characters. Panics on a malformed descriptor: descriptors
/// reaching this parser are assumed to already have passed the codec's decode step.
fn parse_field_type(bytes: &[u8], pos: &mut usize) -> FieldType {
    let ty = match bytes[*pos] {
        b'B' => {
            *pos += 1;
            FieldType::Byte
        }
        b'C' => {
            *pos += 1;
            FieldType::Char
        }
        b'D' => {
            *pos += 1;
            FieldType::Double
        }
        b'F' => {
            *pos += 1;
            FieldType::Float
        }
        b'I' => {
            *pos += 1;
            FieldType::Int
        }
        b'J' => {
            *pos += 1;
            FieldType::Long
        }
        b'S' => {
            *pos += 1;
            FieldType::Short
        }
        b'Z' => {
            *pos += 1;
            FieldType::Boolean
        }
        b'V' => {
            *pos += 1;
            FieldType::Void
        }
        b'L' => {
            let start = *pos + 1;
            let end = bytes[start..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| start + i)
                .expect("unterminated object descriptor");
            let internal = std::str::from_utf8(&bytes[start..end]).unwrap().to_string();
            *pos = end + 1;
            FieldType::Object(internal)
        }
        b'[' => {
            *pos += 1;
            FieldType::Array(Box::new(parse_field_type(bytes, pos)))
        }
        other => panic!("invalid descriptor byte: {}", other as char),
    };
    ty
}

/// Parse a single field-type descriptor, e.g. `"I"`, `"Lfoo/Bar;"`, `"[[I"`.
pub fn parse_type(descriptor: &str) -> FieldType {
    let bytes = descriptor.as_bytes();
    let mut pos = 0;
    parse_field_type(bytes, &mut pos)
}

/// Parse a method descriptor `(<args>)<ret>` into its argument types and return type.
pub fn parse_method_descriptor(descriptor: &str) -> (Vec<FieldType>, FieldType) {
    let bytes = descriptor.as_bytes();
    assert_eq!(bytes[0], b'(', "method descriptor must start with '('");
    let mut pos = 1;
    let mut args = Vec::new();
    while bytes[pos] != b')' {
        args.push(parse_field_type(bytes, &mut pos));
    }
    pos += 1; // skip ')'
    let ret = parse_field_type(bytes, &mut pos);
    (args, ret)
}

/// Format argument types and a return type back into a method descriptor string.
pub fn format_method_descriptor(args: &[FieldType], ret: &FieldType) -> String {
    let mut out = String::from("(");
    for arg in args {
        out.push_str(&arg.to_descriptor());
    }
    out.push(')');
    out.push_str(&ret.to_descriptor());
    out
}

/// The `(<args>)` substring of a method descriptor, without parentheses.
pub fn args_substring(descriptor: &str) -> &str {
    let close = descriptor.find(')').expect("method descriptor missing ')'");
    &descriptor[1..close]
}

/// The return-type substring of a method descriptor (after the closing paren).
pub fn return_substring(descriptor: &str) -> &str {
    let close = descriptor.find(')').expect("method descriptor missing ')'");
    &descriptor[close + 1..]
}

/// Prepend `extra_arg` (a single field-type descriptor, e.g. `Lpkg/Handler;`) as the
/// new first argument of `descriptor`.
pub fn prepend_arg(descriptor: &str, extra_arg: &str) -> String {
    let close = descriptor.find(')').expect("method descriptor missing ')'");
    format!("({extra_arg}{})", &descriptor[1..close]) + &descriptor[close + 1..]
}

/// Remove the first argument from a method descriptor, returning the remaining
/// descriptor (args tail + return type unchanged). Used by the Handler Spec
/// Analyzer to compute the canonical intercepted-signature form
/// `name(argsAfterFirst)ret` from a handler-interface method whose first
/// parameter is the handler type itself.
pub fn remove_first_arg(descriptor: &str) -> String {
    let (args, ret) = parse_method_descriptor(descriptor);
    format_method_descriptor(&args[1..], &ret)
}
