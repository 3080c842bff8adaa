//! Descriptors of the two class-level annotations the runtime recognizes as
//! part of its external interface (§6): shared between `weave-spec` (reads
//! the spawner default) and `weave-agent` (reads the handlee default) so
//! neither crate has to invent its own spelling.

/// `Instruments(types…)`: declares a handler interface's default handlee set.
pub const INSTRUMENTS_ANNOTATION: &str = "Lweave/runtime/Instruments;";

/// `SpawnsWith(qualifiedMethod)`: declares a handler interface's default spawner.
pub const SPAWNS_WITH_ANNOTATION: &str = "Lweave/runtime/SpawnsWith;";
