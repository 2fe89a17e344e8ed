//! Type descriptors.
//!
//! Every reflected type resolves to exactly one [`AnyType`] per
//! [`crate::TypeRegistry`]. Descriptors are built once, leaked, and shared as
//! `&'static` data for the rest of the process, the same way static shapes
//! are shared. Typed views ([`ClassType`], [`NumberType`], ...) are cheap
//! `Copy` handles that are only constructed for descriptors of their kind.

use core::alloc::Layout;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::TypeId;

mod number;
pub use number::*;

mod indirect;
pub use indirect::*;

mod class;
pub use class::*;

mod enums;
pub use enums::*;

mod callable;
pub use callable::*;

/// The kind a descriptor is classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKind {
    /// `()`
    Void,
    /// Integers, floats and `bool`.
    Number,
    /// `[T; N]`
    Array,
    /// `*const T` and `*mut T`.
    Pointer,
    /// `&'static T` and reference wrappers.
    Reference,
    /// Fieldless enums.
    Enum,
    /// Structs, strings, collections and smart pointers.
    Class,
    /// Free function signatures.
    Function,
    /// Method signatures, owned by a type.
    Method,
    /// Member (field accessor) signatures, owned by a type.
    Member,
    /// Constructor signatures, owned by a type.
    Constructor,
    /// Destructor signatures, owned by a type.
    Destructor,
}

/// Kind-specific part of a descriptor, produced by [`crate::Reflect::describe`].
pub enum TypeDef {
    /// See [`TypeKind::Void`].
    Void,
    /// See [`TypeKind::Number`].
    Number(NumberDef),
    /// See [`TypeKind::Array`].
    Array(ArrayDef),
    /// See [`TypeKind::Pointer`].
    Pointer(PointerDef),
    /// See [`TypeKind::Reference`].
    Reference(ReferenceDef),
    /// See [`TypeKind::Enum`].
    Enum(EnumDef),
    /// See [`TypeKind::Class`].
    Class(ClassDef),
    /// See [`TypeKind::Function`].
    Function(FunctionDef),
    /// See [`TypeKind::Method`].
    Method(MethodDef),
    /// See [`TypeKind::Member`].
    Member(MemberDef),
    /// See [`TypeKind::Constructor`].
    Constructor(ConstructorDef),
    /// See [`TypeKind::Destructor`].
    Destructor(DestructorDef),
}

impl TypeDef {
    /// The kind this definition classifies its type as.
    pub const fn kind(&self) -> TypeKind {
        match self {
            TypeDef::Void => TypeKind::Void,
            TypeDef::Number(_) => TypeKind::Number,
            TypeDef::Array(_) => TypeKind::Array,
            TypeDef::Pointer(_) => TypeKind::Pointer,
            TypeDef::Reference(_) => TypeKind::Reference,
            TypeDef::Enum(_) => TypeKind::Enum,
            TypeDef::Class(_) => TypeKind::Class,
            TypeDef::Function(_) => TypeKind::Function,
            TypeDef::Method(_) => TypeKind::Method,
            TypeDef::Member(_) => TypeKind::Member,
            TypeDef::Constructor(_) => TypeKind::Constructor,
            TypeDef::Destructor(_) => TypeKind::Destructor,
        }
    }
}

/// A resolved descriptor. Owned by its registry for the life of the process.
pub struct TypeData {
    pub(crate) id: TypeId,
    pub(crate) native: core::any::TypeId,
    pub(crate) name: &'static str,
    pub(crate) layout: Layout,
    pub(crate) def: TypeDef,
}

/// A descriptor of any kind.
///
/// Equality, ordering and hashing go through the [`TypeId`].
#[derive(Clone, Copy)]
pub struct AnyType(pub(crate) &'static TypeData);

impl AnyType {
    /// The identity of the described type.
    pub fn id(self) -> TypeId {
        self.0.id
    }

    /// The kind of the described type.
    pub fn kind(self) -> TypeKind {
        self.0.def.kind()
    }

    /// The Rust name of the described type.
    pub fn name(self) -> &'static str {
        self.0.name
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        self.0.layout.size()
    }

    /// Alignment in bytes.
    pub fn align(self) -> usize {
        self.0.layout.align()
    }

    /// Size and alignment.
    pub fn layout(self) -> Layout {
        self.0.layout
    }

    /// Returns `true` if this descriptor describes `T`.
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.0.native == core::any::TypeId::of::<T>()
    }

    /// The kind-specific definition.
    pub fn def(self) -> &'static TypeDef {
        &self.0.def
    }

    /// Returns `true` for `()`.
    pub fn is_void(self) -> bool {
        matches!(self.0.def, TypeDef::Void)
    }

    /// Views this descriptor as `()`.
    pub fn as_void(self) -> Option<VoidType> {
        self.is_void().then_some(VoidType(self.0))
    }
}

impl PartialEq for AnyType {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for AnyType {}

impl PartialOrd for AnyType {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnyType {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl Hash for AnyType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for AnyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({}, {})", self.kind(), self.0.name, self.0.id)
    }
}

impl fmt::Display for AnyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

/// Descriptor of `()`.
#[derive(Clone, Copy)]
pub struct VoidType(&'static TypeData);

impl VoidType {
    /// The identity of `()`.
    pub fn id(self) -> TypeId {
        self.0.id
    }

    /// Widens the view back to [`AnyType`].
    pub fn as_any(self) -> AnyType {
        AnyType(self.0)
    }
}

impl From<VoidType> for AnyType {
    fn from(view: VoidType) -> Self {
        AnyType(view.0)
    }
}

impl fmt::Debug for VoidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_any(), f)
    }
}

/// Declares a typed view over one [`TypeDef`] variant.
macro_rules! type_view {
    ($(#[$meta:meta])* $view:ident, $variant:ident, $def:ty, $as_fn:ident, $is_fn:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $view {
            data: &'static $crate::TypeData,
            def: &'static $def,
        }

        impl $view {
            /// The identity of the described type.
            pub fn id(self) -> $crate::TypeId {
                self.data.id
            }

            /// The Rust name of the described type.
            pub fn name(self) -> &'static str {
                self.data.name
            }

            /// Widens the view back to [`AnyType`](crate::AnyType).
            pub fn as_any(self) -> $crate::AnyType {
                $crate::AnyType(self.data)
            }

            #[allow(dead_code)]
            pub(crate) fn def(self) -> &'static $def {
                self.def
            }
        }

        impl $crate::AnyType {
            #[doc = concat!("Views this descriptor as a [`", stringify!($view), "`].")]
            pub fn $as_fn(self) -> Option<$view> {
                match &self.0.def {
                    $crate::TypeDef::$variant(def) => Some($view { data: self.0, def }),
                    _ => None,
                }
            }

            #[doc = concat!("Returns `true` if this descriptor is a [`", stringify!($view), "`].")]
            pub fn $is_fn(self) -> bool {
                matches!(self.0.def, $crate::TypeDef::$variant(_))
            }
        }

        impl From<$view> for $crate::AnyType {
            fn from(view: $view) -> Self {
                $crate::AnyType(view.data)
            }
        }

        impl PartialEq for $view {
            fn eq(&self, other: &Self) -> bool {
                self.data.id == other.data.id
            }
        }

        impl Eq for $view {}

        impl PartialEq<$crate::AnyType> for $view {
            fn eq(&self, other: &$crate::AnyType) -> bool {
                self.data.id == other.0.id
            }
        }

        impl PartialOrd for $view {
            fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $view {
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                self.data.id.cmp(&other.data.id)
            }
        }

        impl core::hash::Hash for $view {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.data.id.hash(state);
            }
        }

        impl core::fmt::Debug for $view {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Debug::fmt(&self.as_any(), f)
            }
        }

        impl core::fmt::Display for $view {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.data.name)
            }
        }
    };
}
pub(crate) use type_view;
