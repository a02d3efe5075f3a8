use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Declaration modifiers.
    ///
    /// The low 16 bits use the class-file `access_flags` encoding so binary
    /// stubs convert with [`Modifiers::from_access_flags`]. Flags above that
    /// only exist in source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        /// `ACC_BRIDGE` on methods (`ACC_VOLATILE` on fields).
        const BRIDGE = 0x0040;
        /// `ACC_VARARGS` on methods (`ACC_TRANSIENT` on fields).
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICTFP = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;

        const DEFAULT = 1 << 16;
        const SEALED = 1 << 17;
        const NON_SEALED = 1 << 18;
        const RECORD = 1 << 19;
        const DEPRECATED = 1 << 20;
    }
}

impl Modifiers {
    pub const ACCESS_MASK: Modifiers = Modifiers::PUBLIC
        .union(Modifiers::PRIVATE)
        .union(Modifiers::PROTECTED);

    pub fn from_access_flags(flags: u16) -> Self {
        Modifiers::from_bits_truncate(u32::from(flags))
    }

    pub fn access(self) -> Modifiers {
        self & Self::ACCESS_MASK
    }

    pub fn is_package_private(self) -> bool {
        self.access().is_empty()
    }
}
