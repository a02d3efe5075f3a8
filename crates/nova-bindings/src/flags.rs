use bitflags::bitflags;

bitflags! {
    /// Markers on bindings. Bits are only ever added (see
    /// [`crate::Environment::add_type_tag_bits`]); nothing clears them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TagBits: u32 {
        /// Supertypes or type variable bounds failed to resolve, or the
        /// hierarchy is cyclic. Suppresses follow-up errors.
        const HIERARCHY_HAS_PROBLEMS = 1 << 0;
        /// A type in the signature could not be found on the class path.
        const HAS_MISSING_TYPE = 1 << 1;
        /// The type mentions a type variable (or is a generic declaration), so
        /// substitution may change it.
        const HAS_TYPE_VARIABLE = 1 << 2;
        const HAS_WILDCARD = 1 << 3;
        const HAS_CAPTURE = 1 << 4;
        const HAS_INFERENCE_VARIABLE = 1 << 5;
        const IS_MEMBER_TYPE = 1 << 6;
        const IS_LOCAL_TYPE = 1 << 7;
        const IS_ANONYMOUS_TYPE = 1 << 8;
        /// Sealed/permits and supertype collision checks already ran.
        const HIERARCHY_CHECKED = 1 << 9;
        /// Duplicate members were found and removed.
        const HAS_DUPLICATES = 1 << 10;
    }
}

impl TagBits {
    /// Bits that propagate from a component type to types built from it.
    pub const CONTAINMENT_MASK: TagBits = TagBits::HAS_TYPE_VARIABLE
        .union(TagBits::HAS_WILDCARD)
        .union(TagBits::HAS_CAPTURE)
        .union(TagBits::HAS_INFERENCE_VARIABLE)
        .union(TagBits::HAS_MISSING_TYPE);
}
