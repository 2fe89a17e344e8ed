//! Indices identify registered entities.
//!
//! An index pairs the entity's descriptor with its name (where it has one).
//! Handles compare, order and hash by their index; classes and scopes key
//! their maps by it, so overloads sharing a name are told apart by their
//! descriptor.

use core::fmt;

use crate::{
    AnyType, ConstructorType, DestructorType, EnumType, FunctionType, MemberType, MethodType,
    PointerType,
};

macro_rules! named_index {
    ($(#[$meta:meta])* $index:ident, $ty:ty) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $index {
            ty: $ty,
            name: String,
        }

        impl $index {
            pub(crate) fn new(ty: $ty, name: impl Into<String>) -> Self {
                $index {
                    ty,
                    name: name.into(),
                }
            }

            /// Descriptor of the entity.
            pub fn get_type(&self) -> $ty {
                self.ty
            }

            /// Name the entity was registered under.
            pub fn get_name(&self) -> &str {
                &self.name
            }
        }

        impl fmt::Debug for $index {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?}: {})", stringify!($index), self.name, self.ty)
            }
        }
    };
}

macro_rules! unnamed_index {
    ($(#[$meta:meta])* $index:ident, $ty:ty) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $index {
            ty: $ty,
        }

        impl $index {
            pub(crate) fn new(ty: $ty) -> Self {
                $index { ty }
            }

            /// Descriptor of the entity.
            pub fn get_type(&self) -> $ty {
                self.ty
            }
        }

        impl fmt::Debug for $index {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($index), self.ty)
            }
        }
    };
}

unnamed_index! {
    /// Identifies a constructor by its signature.
    ConstructorIndex, ConstructorType
}

unnamed_index! {
    /// Identifies a destructor by its class.
    DestructorIndex, DestructorType
}

named_index! {
    /// Identifies an enum constant.
    EvalueIndex, EnumType
}

named_index! {
    /// Identifies a function overload.
    FunctionIndex, FunctionType
}

named_index! {
    /// Identifies a member.
    MemberIndex, MemberType
}

named_index! {
    /// Identifies a method overload.
    MethodIndex, MethodType
}

named_index! {
    /// Identifies a variable by name and pointer type.
    VariableIndex, PointerType
}

/// Identifies a parameter of a function, method or constructor.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArgumentIndex {
    ty: AnyType,
    position: usize,
}

impl ArgumentIndex {
    pub(crate) fn new(ty: AnyType, position: usize) -> Self {
        ArgumentIndex { ty, position }
    }

    /// Descriptor of the parameter type.
    pub fn get_type(&self) -> AnyType {
        self.ty
    }

    /// Zero-based position.
    pub fn get_position(&self) -> usize {
        self.position
    }
}

impl fmt::Debug for ArgumentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgumentIndex(#{}: {})", self.position, self.ty)
    }
}

/// Identifies a scope by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeIndex {
    name: String,
}

impl ScopeIndex {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        ScopeIndex { name: name.into() }
    }

    /// Name of the scope.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}
