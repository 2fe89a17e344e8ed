use crate::{AnyType, ArrayFlags, PointerFlags, ReferenceFlags};

/// Array descriptor payload.
pub struct ArrayDef {
    pub(crate) flags: ArrayFlags,
    pub(crate) extent: usize,
    pub(crate) data_type: AnyType,
}

super::type_view! {
    /// Descriptor of a fixed-size array `[T; N]`.
    ArrayType, Array, ArrayDef, as_array, is_array
}

impl ArrayType {
    /// Array flags.
    pub fn flags(self) -> ArrayFlags {
        self.def.flags
    }

    /// Number of elements.
    pub fn extent(self) -> usize {
        self.def.extent
    }

    /// Descriptor of the element type.
    pub fn data_type(self) -> AnyType {
        self.def.data_type
    }
}

/// Pointer descriptor payload.
pub struct PointerDef {
    pub(crate) flags: PointerFlags,
    pub(crate) data_type: AnyType,
}

super::type_view! {
    /// Descriptor of a raw pointer, `*const T` or `*mut T`.
    PointerType, Pointer, PointerDef, as_pointer, is_pointer
}

impl PointerType {
    /// Pointer flags.
    pub fn flags(self) -> PointerFlags {
        self.def.flags
    }

    /// `*const T`.
    pub fn is_readonly(self) -> bool {
        self.def.flags.contains(PointerFlags::IS_READONLY)
    }

    /// Descriptor of the pointee.
    pub fn data_type(self) -> AnyType {
        self.def.data_type
    }
}

/// Reference descriptor payload.
pub struct ReferenceDef {
    pub(crate) flags: ReferenceFlags,
    pub(crate) data_type: AnyType,
}

super::type_view! {
    /// Descriptor of a reference: `&'static T`, `&'static mut T`, [`crate::RefWrapper`] or
    /// [`crate::RefWrapperMut`].
    ReferenceType, Reference, ReferenceDef, as_reference, is_reference
}

impl ReferenceType {
    /// Reference flags.
    pub fn flags(self) -> ReferenceFlags {
        self.def.flags
    }

    /// Shared reference.
    pub fn is_readonly(self) -> bool {
        self.def.flags.contains(ReferenceFlags::IS_READONLY)
    }

    /// A [`crate::RefWrapper`] or [`crate::RefWrapperMut`], which does not
    /// keep its referent alive.
    pub fn is_detached(self) -> bool {
        self.def.flags.contains(ReferenceFlags::IS_DETACHED)
    }

    /// Descriptor of the referent.
    pub fn data_type(self) -> AnyType {
        self.def.data_type
    }
}
