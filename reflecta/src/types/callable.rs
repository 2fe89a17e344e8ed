use crate::{AnyType, MemberFlags, MethodFlags};

/// Function signature payload.
pub struct FunctionDef {
    pub(crate) return_type: AnyType,
    pub(crate) argument_types: Vec<AnyType>,
}

super::type_view! {
    /// Descriptor of a free function signature, `fn(A, B) -> R`.
    FunctionType, Function, FunctionDef, as_function, is_function
}

impl FunctionType {
    /// Number of parameters.
    pub fn arity(self) -> usize {
        self.def.argument_types.len()
    }

    /// Descriptor of the return type; `()` for functions without one.
    pub fn return_type(self) -> AnyType {
        self.def.return_type
    }

    /// Descriptor of the parameter at `position`.
    pub fn argument_type(self, position: usize) -> Option<AnyType> {
        self.def.argument_types.get(position).copied()
    }

    /// Descriptors of all parameters, in order.
    pub fn argument_types(self) -> &'static [AnyType] {
        &self.def.argument_types
    }
}

/// Method signature payload.
pub struct MethodDef {
    pub(crate) flags: MethodFlags,
    pub(crate) owner_type: AnyType,
    pub(crate) return_type: AnyType,
    pub(crate) argument_types: Vec<AnyType>,
}

super::type_view! {
    /// Descriptor of a method signature: receiver type, receiver constness,
    /// parameters and return type.
    MethodType, Method, MethodDef, as_method, is_method
}

impl MethodType {
    /// Qualifier flags.
    pub fn flags(self) -> MethodFlags {
        self.def.flags
    }

    /// Takes `&self`.
    pub fn is_const(self) -> bool {
        self.def.flags.contains(MethodFlags::IS_CONST)
    }

    /// Descriptor of the receiver type.
    pub fn owner_type(self) -> AnyType {
        self.def.owner_type
    }

    /// Number of parameters, not counting the receiver.
    pub fn arity(self) -> usize {
        self.def.argument_types.len()
    }

    /// Descriptor of the return type.
    pub fn return_type(self) -> AnyType {
        self.def.return_type
    }

    /// Descriptor of the parameter at `position`.
    pub fn argument_type(self, position: usize) -> Option<AnyType> {
        self.def.argument_types.get(position).copied()
    }

    /// Descriptors of all parameters, in order.
    pub fn argument_types(self) -> &'static [AnyType] {
        &self.def.argument_types
    }
}

/// Member signature payload.
pub struct MemberDef {
    pub(crate) flags: MemberFlags,
    pub(crate) owner_type: AnyType,
    pub(crate) value_type: AnyType,
}

super::type_view! {
    /// Descriptor of a member accessor pair.
    MemberType, Member, MemberDef, as_member, is_member
}

impl MemberType {
    /// Member flags.
    pub fn flags(self) -> MemberFlags {
        self.def.flags
    }

    /// No mutable accessor.
    pub fn is_readonly(self) -> bool {
        self.def.flags.contains(MemberFlags::IS_READONLY)
    }

    /// Descriptor of the owning type.
    pub fn owner_type(self) -> AnyType {
        self.def.owner_type
    }

    /// Descriptor of the member's value type.
    pub fn value_type(self) -> AnyType {
        self.def.value_type
    }
}

/// Constructor signature payload.
pub struct ConstructorDef {
    pub(crate) owner_type: AnyType,
    pub(crate) argument_types: Vec<AnyType>,
}

super::type_view! {
    /// Descriptor of a constructor: the constructed type and its parameters.
    ConstructorType, Constructor, ConstructorDef, as_constructor, is_constructor
}

impl ConstructorType {
    /// Descriptor of the constructed type.
    pub fn owner_type(self) -> AnyType {
        self.def.owner_type
    }

    /// Number of parameters.
    pub fn arity(self) -> usize {
        self.def.argument_types.len()
    }

    /// Descriptor of the parameter at `position`.
    pub fn argument_type(self, position: usize) -> Option<AnyType> {
        self.def.argument_types.get(position).copied()
    }

    /// Descriptors of all parameters, in order.
    pub fn argument_types(self) -> &'static [AnyType] {
        &self.def.argument_types
    }
}

/// Destructor payload.
pub struct DestructorDef {
    pub(crate) owner_type: AnyType,
}

super::type_view! {
    /// Descriptor of a destructor.
    DestructorType, Destructor, DestructorDef, as_destructor, is_destructor
}

impl DestructorType {
    /// Descriptor of the destroyed type.
    pub fn owner_type(self) -> AnyType {
        self.def.owner_type
    }
}
