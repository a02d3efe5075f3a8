use std::fmt;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_raw(raw: usize) -> Self {
                let raw = u32::try_from(raw).unwrap_or(u32::MAX);
                $name(raw)
            }

            #[must_use]
            pub fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

arena_id!(TypeId);
arena_id!(MethodId);
arena_id!(FieldId);
