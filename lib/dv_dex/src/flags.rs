//! Dalvik method access flags.
//!
//! The bit values are fixed by the dex format; only the flags the verifier
//! inspects get named helpers.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_SYNCHRONIZED          = 0x00020;
        const ACC_BRIDGE                = 0x00040;
        const ACC_VARARGS               = 0x00080;
        const ACC_NATIVE                = 0x00100;
        const ACC_ABSTRACT              = 0x00400;
        const ACC_STRICT                = 0x00800;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_CONSTRUCTOR           = 0x10000;
        const ACC_DECLARED_SYNCHRONIZED = 0x20000;
    }
}

impl MethodFlags {
    #[inline]
    #[must_use]
    pub const fn is_static(self) -> bool {
        self.contains(Self::ACC_STATIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_constructor(self) -> bool {
        self.contains(Self::ACC_CONSTRUCTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_helpers() {
        let flags = MethodFlags::ACC_PUBLIC | MethodFlags::ACC_STATIC;
        assert!(flags.is_static());
        assert!(!flags.is_constructor());
        assert!((flags | MethodFlags::ACC_CONSTRUCTOR).is_constructor());
    }
}
