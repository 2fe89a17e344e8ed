use bitflags::bitflags;

bitflags! {
    /// Classification of a number descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NumberFlags: u32 {
        /// Signed integer or float.
        const IS_SIGNED = 1 << 0;
        /// Unsigned integer or `bool`.
        const IS_UNSIGNED = 1 << 1;
        /// Integer or `bool`.
        const IS_INTEGRAL = 1 << 2;
        /// `f32` or `f64`.
        const IS_FLOATING_POINT = 1 << 3;
        /// `bool`; never widened to or from another number.
        const IS_BOOLEAN = 1 << 4;
    }
}

bitflags! {
    /// Flags of an array descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArrayFlags: u32 {
        /// The extent is part of the type.
        const IS_BOUNDED = 1 << 0;
    }
}

bitflags! {
    /// Flags of a pointer descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PointerFlags: u32 {
        /// `*const T`: the pointee may not be mutated through it.
        const IS_READONLY = 1 << 0;
    }
}

bitflags! {
    /// Flags of a reference descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReferenceFlags: u32 {
        /// Shared reference: the referent may not be mutated through it.
        const IS_READONLY = 1 << 0;
        /// Does not borrow its referent ([`crate::RefWrapper`],
        /// [`crate::RefWrapperMut`]); only read through
        /// [`crate::UValue::deref_unchecked`].
        const IS_DETACHED = 1 << 1;
    }
}

bitflags! {
    /// Flags of a class descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        /// Zero-sized.
        const IS_EMPTY = 1 << 0;
        /// Supports dereferencing through [`crate::UValue::deref_value`].
        const IS_POINTER_LIKE = 1 << 1;
        /// Supports indexing through [`crate::UValue::index_value`].
        const IS_ARRAY_LIKE = 1 << 2;
        /// Instantiated from a generic type; see `ClassType::argument_types`.
        const IS_GENERIC = 1 << 3;
    }
}

bitflags! {
    /// Qualifier flags of a method descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        /// Takes `&self`; callable through a const instance.
        const IS_CONST = 1 << 0;
    }
}

bitflags! {
    /// Flags of a member descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u32 {
        /// No mutable accessor was registered.
        const IS_READONLY = 1 << 0;
    }
}
