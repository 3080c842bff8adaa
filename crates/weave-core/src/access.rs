//! Class/field/method access-flag bitset.
//!
//! Values follow the VM's standard access-flag bit assignments so that a
//! round-trip through the codec preserves the raw `u16` unchanged.

use bitflags::bitflags;

bitflags! {
    /// Access and modifier flags shared by classes, fields, and methods.
    /// Not every flag is meaningful on every kind of entry (e.g. `NATIVE`
    /// only applies to methods); callers are expected to only set relevant bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u16 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SUPER        = 0x0020;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE     = 0x0040;
        const BRIDGE       = 0x0040;
        const TRANSIENT    = 0x0080;
        const VARARGS      = 0x0080;
        const NATIVE       = 0x0100;
        const INTERFACE    = 0x0200;
        const ABSTRACT     = 0x0400;
        const STRICT       = 0x0800;
        const SYNTHETIC    = 0x1000;
        const ANNOTATION   = 0x2000;
        const ENUM         = 0x4000;
    }
}

impl AccessFlags {
    /// The standard flag set for a synthesized handler-slot field: public,
    /// transient, volatile, synthetic (§4.2.2).
    pub fn handler_field() -> Self {
        AccessFlags::PUBLIC | AccessFlags::TRANSIENT | AccessFlags::VOLATILE | AccessFlags::SYNTHETIC
    }

    /// Demote any protected/private visibility to public, leaving all other bits
    /// untouched. Used when promoting an original method's visibility (§4.2.3)
    /// and when creating dispatch methods (always public, never protected/private).
    pub fn with_public_visibility(self) -> Self {
        (self - AccessFlags::PRIVATE - AccessFlags::PROTECTED) | AccessFlags::PUBLIC
    }
}
