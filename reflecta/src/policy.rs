//! Return and access policies, and the options entities are bound with.
//!
//! A policy is chosen once per entity when its handle is built and compiled
//! into the entity's closures; it is never consulted again at call time.

use alloc::sync::Arc;

use crate::{Metadata, RefWrapper, RefWrapperMut, Reflect, RegistrationError, SharedValue, UValue};

/// What a function or method call yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReturnPolicy {
    /// A copy of the returned value. The return type must be clonable.
    #[default]
    AsCopy,
    /// Nothing: the returned value is dropped and an empty value yielded.
    DiscardReturn,
    /// For functions returning references: a pointer to the referent
    /// instead of a copy.
    ReturnReferenceAsPointer,
}

/// Return policy of free and associated functions.
pub type FunctionPolicy = ReturnPolicy;

/// Return policy of methods.
pub type MethodPolicy = ReturnPolicy;

/// What reading a member or variable yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    /// A copy of the value. The value type must be clonable.
    #[default]
    AsCopy,
    /// A `*const V`, or a `*mut V` when accessed mutably.
    AsPointer,
    /// A [`RefWrapper`], or a [`RefWrapperMut`] when accessed mutably.
    AsReferenceWrapper,
}

/// Access policy of members.
pub type MemberPolicy = AccessPolicy;

/// Access policy of variables.
pub type VariablePolicy = AccessPolicy;

/// What constructing an object yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConstructorPolicy {
    /// The object itself. The class must be clonable.
    #[default]
    AsObject,
    /// A `*mut C` to a boxed object, released with [`crate::Destructor::destroy`].
    AsRawPointer,
    /// An `Arc<C>`.
    AsSharedPointer,
}

/// Entities without a policy (destructors, evalues, scopes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoPolicy;

/// Name and metadata of one parameter.
#[derive(Debug, Clone, Default)]
pub(crate) struct ArgumentInfo {
    pub(crate) name: String,
    pub(crate) metadata: Metadata,
}

/// Options an entity is bound with: a policy, metadata, and parameter
/// names.
///
/// ```
/// use reflecta::{BindOpts, FunctionPolicy};
///
/// let opts = BindOpts::new()
///     .policy(FunctionPolicy::DiscardReturn)
///     .unwrap()
///     .argument("lhs")
///     .argument("rhs");
/// assert!(opts.policy(FunctionPolicy::AsCopy).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindOpts<P> {
    pub(crate) policy: Option<P>,
    pub(crate) metadata: Metadata,
    pub(crate) arguments: Vec<ArgumentInfo>,
}

impl<P: Copy + Default> BindOpts<P> {
    /// Default policy, no metadata, no names.
    pub fn new() -> Self {
        BindOpts {
            policy: None,
            metadata: Metadata::new(),
            arguments: Vec::new(),
        }
    }

    /// Sets the policy. Only one policy may be set.
    pub fn policy(mut self, policy: P) -> Result<Self, RegistrationError> {
        if self.policy.is_some() {
            return Err(RegistrationError::PolicyAlreadySet);
        }
        self.policy = Some(policy);
        Ok(self)
    }

    /// Attaches a metadata entry to the entity.
    pub fn metadata(mut self, key: impl Into<String>, value: SharedValue) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Names the next parameter.
    pub fn argument(self, name: impl Into<String>) -> Self {
        self.argument_with(name, Metadata::new())
    }

    /// Names the next parameter and attaches metadata to it.
    pub fn argument_with(mut self, name: impl Into<String>, metadata: Metadata) -> Self {
        self.arguments.push(ArgumentInfo {
            name: name.into(),
            metadata,
        });
        self
    }

    pub(crate) fn chosen_policy(&self) -> P {
        self.policy.unwrap_or_default()
    }
}

fn type_name<T>() -> &'static str {
    core::any::type_name::<T>()
}

fn mismatch<T>(policy: &'static str) -> RegistrationError {
    RegistrationError::PolicyMismatch {
        policy,
        type_name: type_name::<T>(),
    }
}

fn is_void<T: 'static>() -> bool {
    core::any::TypeId::of::<T>() == core::any::TypeId::of::<()>()
}

fn discard<R>(value: R) -> UValue {
    drop(value);
    UValue::empty()
}

fn copy_out<R: Reflect>(value: R) -> UValue {
    UValue::adopt(value)
}

fn address_out<R: Reflect>(value: R) -> UValue {
    match R::OPS.address_of {
        Some(address_of) => unsafe { address_of((&value as *const R).cast()) },
        None => UValue::empty(),
    }
}

/// Turns a call's return value into the value the caller receives.
pub(crate) type ReturnFn<R> = fn(R) -> UValue;

/// [`ReturnFn`] of methods. Borrowed returns arrive as pointers into the
/// receiver, which must still be alive when this runs.
pub(crate) type MethodReturnFn<R> = unsafe fn(R) -> UValue;

unsafe fn copy_borrowed<R: Reflect>(ptr: *const R) -> UValue {
    unsafe { UValue::clone_from_ptr::<R>(ptr) }.unwrap_or_default()
}

unsafe fn copy_borrowed_mut<R: Reflect>(ptr: *mut R) -> UValue {
    unsafe { copy_borrowed::<R>(ptr) }
}

fn pointer_out<P: Reflect + Clone>(ptr: P) -> UValue {
    UValue::new(ptr)
}

impl ReturnPolicy {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ReturnPolicy::AsCopy => "as_copy",
            ReturnPolicy::DiscardReturn => "discard_return",
            ReturnPolicy::ReturnReferenceAsPointer => "return_reference_as_pointer",
        }
    }

    /// Compiles the policy for return type `R`.
    pub(crate) fn compile<R: Reflect>(self) -> Result<ReturnFn<R>, RegistrationError> {
        match self {
            ReturnPolicy::DiscardReturn => Ok(discard::<R>),
            ReturnPolicy::AsCopy if is_void::<R>() => Ok(discard::<R>),
            ReturnPolicy::AsCopy if R::OPS.clone_into.is_some() => Ok(copy_out::<R>),
            ReturnPolicy::ReturnReferenceAsPointer if R::OPS.address_of.is_some() => {
                Ok(address_out::<R>)
            }
            _ => Err(mismatch::<R>(self.name())),
        }
    }

    /// Compiles the policy for methods returning `&R` borrowed from the
    /// receiver.
    pub(crate) fn compile_borrowed<R: Reflect>(
        self,
    ) -> Result<MethodReturnFn<*const R>, RegistrationError> {
        match self {
            ReturnPolicy::DiscardReturn => Ok(discard::<*const R>),
            ReturnPolicy::AsCopy if R::OPS.clone_into.is_some() => Ok(copy_borrowed::<R>),
            ReturnPolicy::ReturnReferenceAsPointer => Ok(pointer_out::<*const R>),
            ReturnPolicy::AsCopy => Err(mismatch::<&R>(self.name())),
        }
    }

    /// Compiles the policy for methods returning `&mut R` borrowed from the
    /// receiver.
    pub(crate) fn compile_borrowed_mut<R: Reflect>(
        self,
    ) -> Result<MethodReturnFn<*mut R>, RegistrationError> {
        match self {
            ReturnPolicy::DiscardReturn => Ok(discard::<*mut R>),
            ReturnPolicy::AsCopy if R::OPS.clone_into.is_some() => Ok(copy_borrowed_mut::<R>),
            ReturnPolicy::ReturnReferenceAsPointer => Ok(pointer_out::<*mut R>),
            ReturnPolicy::AsCopy => Err(mismatch::<&mut R>(self.name())),
        }
    }
}

/// Turns a borrowed member or variable into the value the caller receives.
#[derive(Clone, Copy)]
pub(crate) struct AccessFns {
    pub(crate) shared: unsafe fn(*const u8) -> UValue,
    pub(crate) exclusive: unsafe fn(*mut u8) -> UValue,
}

unsafe fn copy_shared<V: Reflect>(ptr: *const u8) -> UValue {
    match V::OPS.clone_into {
        Some(_) => unsafe { UValue::clone_from_ptr::<V>(ptr.cast()) }.unwrap_or_default(),
        None => UValue::empty(),
    }
}

unsafe fn copy_exclusive<V: Reflect>(ptr: *mut u8) -> UValue {
    unsafe { copy_shared::<V>(ptr) }
}

unsafe fn pointer_shared<V: Reflect>(ptr: *const u8) -> UValue {
    UValue::new(ptr.cast::<V>())
}

unsafe fn pointer_exclusive<V: Reflect>(ptr: *mut u8) -> UValue {
    UValue::new(ptr.cast::<V>())
}

unsafe fn wrapper_shared<V: Reflect>(ptr: *const u8) -> UValue {
    UValue::new(RefWrapper::new(unsafe { &*ptr.cast::<V>() }))
}

unsafe fn wrapper_exclusive<V: Reflect>(ptr: *mut u8) -> UValue {
    UValue::new(RefWrapperMut::new(unsafe { &mut *ptr.cast::<V>() }))
}

impl AccessPolicy {
    pub(crate) fn name(self) -> &'static str {
        match self {
            AccessPolicy::AsCopy => "as_copy",
            AccessPolicy::AsPointer => "as_pointer",
            AccessPolicy::AsReferenceWrapper => "as_reference_wrapper",
        }
    }

    /// Compiles the policy for value type `V`.
    pub(crate) fn compile<V: Reflect>(self) -> Result<AccessFns, RegistrationError> {
        match self {
            AccessPolicy::AsCopy if V::OPS.clone_into.is_some() => Ok(AccessFns {
                shared: copy_shared::<V>,
                exclusive: copy_exclusive::<V>,
            }),
            AccessPolicy::AsCopy => Err(mismatch::<V>(self.name())),
            AccessPolicy::AsPointer => Ok(AccessFns {
                shared: pointer_shared::<V>,
                exclusive: pointer_exclusive::<V>,
            }),
            AccessPolicy::AsReferenceWrapper => Ok(AccessFns {
                shared: wrapper_shared::<V>,
                exclusive: wrapper_exclusive::<V>,
            }),
        }
    }
}

/// Turns a freshly constructed object into the value the caller receives.
pub(crate) type ConstructFn<C> = fn(C) -> UValue;

fn as_object<C: Reflect>(object: C) -> UValue {
    UValue::adopt(object)
}

fn as_raw_pointer<C: Reflect>(object: C) -> UValue {
    UValue::new(Box::into_raw(Box::new(object)))
}

fn as_shared_pointer<C: Reflect>(object: C) -> UValue {
    UValue::new(Arc::new(object))
}

impl ConstructorPolicy {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ConstructorPolicy::AsObject => "as_object",
            ConstructorPolicy::AsRawPointer => "as_raw_pointer",
            ConstructorPolicy::AsSharedPointer => "as_shared_pointer",
        }
    }

    /// Compiles the policy for class `C`.
    pub(crate) fn compile<C: Reflect>(self) -> Result<ConstructFn<C>, RegistrationError> {
        match self {
            ConstructorPolicy::AsObject if C::OPS.clone_into.is_some() => Ok(as_object::<C>),
            ConstructorPolicy::AsObject => Err(mismatch::<C>(self.name())),
            ConstructorPolicy::AsRawPointer => Ok(as_raw_pointer::<C>),
            ConstructorPolicy::AsSharedPointer => Ok(as_shared_pointer::<C>),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;
    crate::reflect_class!(Opaque);

    #[test]
    fn copy_requires_a_clone_op() {
        assert!(ReturnPolicy::AsCopy.compile::<i32>().is_ok());
        assert_eq!(
            ReturnPolicy::AsCopy.compile::<Opaque>().err(),
            Some(RegistrationError::PolicyMismatch {
                policy: "as_copy",
                type_name: core::any::type_name::<Opaque>(),
            })
        );
        assert!(ReturnPolicy::DiscardReturn.compile::<Opaque>().is_ok());
    }

    #[test]
    fn void_returns_are_always_empty() {
        let copy = ReturnPolicy::AsCopy.compile::<()>().unwrap();
        assert!(!copy(()).is_valid());
    }

    #[test]
    fn reference_as_pointer_needs_a_reference() {
        static VALUE: i32 = 7;
        assert!(ReturnPolicy::ReturnReferenceAsPointer.compile::<i32>().is_err());

        let address = ReturnPolicy::ReturnReferenceAsPointer
            .compile::<&'static i32>()
            .unwrap();
        let pointer = address(&VALUE);
        assert_eq!(*pointer.get_as::<*const i32>().unwrap(), &VALUE as *const i32);
    }

    #[test]
    fn a_second_policy_is_rejected() {
        let opts = BindOpts::<ConstructorPolicy>::new()
            .policy(ConstructorPolicy::AsRawPointer)
            .unwrap();
        assert_eq!(opts.chosen_policy(), ConstructorPolicy::AsRawPointer);
        assert_eq!(
            opts.policy(ConstructorPolicy::AsObject).err(),
            Some(RegistrationError::PolicyAlreadySet)
        );
    }
}
