//! Stack-map-frame markers.
//!
//! The engine never computes frames from scratch (§4.2.7): every join it
//! introduces gets an explicit `StackFrame::Full` marker listing the locals
//! and stack contents in effect at that point, so the codec can be told to
//! skip frame computation entirely (which would otherwise require loading
//! not-yet-defined classes to resolve common supertypes).

/// A single verification-type entry within a stack frame's locals or stack list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Long,
    Double,
    Null,
    UninitializedThis,
    Object(String),
    /// An uninitialized object awaiting its constructor call, identified by the
    /// offset of the `new` instruction that created it.
    Uninitialized(u32),
}

/// A stack-map-frame marker attached to an [`crate::Opcode::Frame`] node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackFrame {
    /// No locals or stack changes since the previous frame.
    Same,
    /// No change to locals; exactly one value on the stack.
    SameLocals1StackItem(VerificationType),
    /// `count` trailing locals removed from the previous frame, empty stack.
    Chop { count: u8 },
    /// `locals` appended to the previous frame's locals, empty stack.
    Append { locals: Vec<VerificationType> },
    /// Complete, explicit locals and stack list. This is the only frame kind
    /// the engine emits for joins it introduces (§4.2.7); `Same`/`Chop`/`Append`
    /// only ever arise from frames the codec decoded from a pre-existing class.
    Full {
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl StackFrame {
    /// Build a full frame, the engine's sole emission shape.
    pub fn full(locals: Vec<VerificationType>, stack: Vec<VerificationType>) -> Self {
        StackFrame::Full { locals, stack }
    }

    /// Insert `verification_type` at position 0 of a full frame's local list, as
    /// required when a pre-existing method gains a new leading parameter
    /// (§3 invariant 5). No-op for any non-`Full` frame kind: those only
    /// appear on methods the engine does not rewrite.
    pub fn insert_local_at_zero(&mut self, verification_type: VerificationType) {
        if let StackFrame::Full { locals, .. } = self {
            locals.insert(0, verification_type);
        }
    }

    /// The number of locals this frame lists, if it is a `Full` frame.
    pub fn local_count(&self) -> Option<usize> {
        match self {
            StackFrame::Full { locals, .. } => Some(locals.len()),
            _ => None,
        }
    }
}
