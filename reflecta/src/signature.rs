//! Signatures of callable entities and the adapters that erase them.
//!
//! Function signatures are plain `fn` pointer types. Methods, members,
//! constructors and destructors are described by zero-sized marker types
//! carrying their owner and parameters. [`IntoFunction`] and [`IntoMethod`]
//! are implemented per arity for closures and `fn` items, and perform the
//! actual call once every argument has been converted.
//!
//! A parameter declared as `&T` is registered as `&'static T` but the
//! callable must accept any lifetime (`for<'a> Fn(&'a T)`): it is handed a
//! borrow of the argument that ends with the call. Methods returning a
//! borrow of their receiver (`fn(&self) -> &R`) are registered as
//! returning `&'static R` and yield `*const R` to the return policy.

use core::marker::PhantomData;

use crate::policy::MethodReturnFn;
use crate::{
    AnyType, ArgTypes, ConstructorDef, DestructorDef, Error, FunctionDef, MemberDef, MemberFlags,
    MethodDef, MethodFlags, MethodPolicy, Reflect, RegistrationError, Result, TypeDef,
    TypeRegistry, UArg, ValueOps,
};

/// Method receivers: [`Shared`] (`&self`) or [`Exclusive`] (`&mut self`).
pub trait Receiver: 'static {
    /// Flags recorded on the method descriptor.
    const FLAGS: MethodFlags;
}

/// `&self` receiver.
pub enum Shared {}

/// `&mut self` receiver.
pub enum Exclusive {}

/// Marks methods returning a borrow of their receiver.
pub enum Borrowed {}

impl Receiver for Shared {
    const FLAGS: MethodFlags = MethodFlags::IS_CONST;
}

impl Receiver for Exclusive {
    const FLAGS: MethodFlags = MethodFlags::empty();
}

/// Member accessors: [`ReadOnly`] or [`ReadWrite`].
pub trait Access: 'static {
    /// Flags recorded on the member descriptor.
    const FLAGS: MemberFlags;
}

/// Getter only.
pub enum ReadOnly {}

/// Getter and setter.
pub enum ReadWrite {}

impl Access for ReadOnly {
    const FLAGS: MemberFlags = MemberFlags::IS_READONLY;
}

impl Access for ReadWrite {
    const FLAGS: MemberFlags = MemberFlags::empty();
}

/// Signature of a method of `C` taking `Args` and returning `R`.
pub struct MethodSig<C, Args, R, Q>(PhantomData<fn() -> (C, Args, R, Q)>);

impl<C: Reflect, Args: ArgTypes + 'static, R: Reflect, Q: Receiver> Reflect
    for MethodSig<C, Args, R, Q>
{
    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Method(MethodDef {
            flags: Q::FLAGS,
            owner_type: registry.resolve::<C>(),
            return_type: registry.resolve::<R>(),
            argument_types: Args::types(registry),
        })
    }
}

/// Signature of a member of `C` holding a `V`.
pub struct MemberSig<C, V, A>(PhantomData<fn() -> (C, V, A)>);

impl<C: Reflect, V: Reflect, A: Access> Reflect for MemberSig<C, V, A> {
    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Member(MemberDef {
            flags: A::FLAGS,
            owner_type: registry.resolve::<C>(),
            value_type: registry.resolve::<V>(),
        })
    }
}

/// Signature of a constructor of `C` taking `Args`.
pub struct ConstructorSig<C, Args>(PhantomData<fn() -> (C, Args)>);

impl<C: Reflect, Args: ArgTypes + 'static> Reflect for ConstructorSig<C, Args> {
    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Constructor(ConstructorDef {
            owner_type: registry.resolve::<C>(),
            argument_types: Args::types(registry),
        })
    }
}

/// Signature of the destructor of `C`.
pub struct DestructorSig<C>(PhantomData<fn() -> C>);

impl<C: Reflect> Reflect for DestructorSig<C> {
    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Destructor(DestructorDef {
            owner_type: registry.resolve::<C>(),
        })
    }
}

/// Callables usable as functions and constructors.
///
/// `Args` is the parameter tuple; it only exists to tell the per-arity
/// implementations apart and is inferred at the registration site.
pub trait IntoFunction<Args>: Send + Sync + 'static {
    /// The return type.
    type Return: Reflect;

    /// The parameter types, as a tuple.
    type Params: ArgTypes + 'static;

    /// The `fn` pointer type with the same signature.
    type Signature: Reflect;

    /// Converts `args` to the parameter types in `params` and calls.
    ///
    /// Fails without calling when an argument is missing or cannot be
    /// converted.
    fn call(&self, params: &[AnyType], args: &[UArg<'_>]) -> Result<Self::Return>;
}

/// Callables usable as methods of [`Self::Owner`].
///
/// `Marker` tells the receiver kind, arity and whether the return value
/// borrows the receiver apart. It is inferred at the registration site.
pub trait IntoMethod<Marker>: Send + Sync + 'static {
    /// The receiver type.
    type Owner: Reflect;

    /// The return type as recorded on the descriptor.
    type Return: Reflect;

    /// What [`Self::call`] yields: the return value, or the address of a
    /// borrowed one.
    type Output: 'static;

    /// The parameter types, as a tuple.
    type Params: ArgTypes + 'static;

    /// The receiver kind.
    type Receiver: Receiver;

    /// Compiles `policy` for [`Self::Output`].
    fn compile_return(policy: MethodPolicy) -> Result<MethodReturnFn<Self::Output>, RegistrationError>;

    /// Converts `args` to the parameter types in `params` and calls with the
    /// object at `object` as receiver.
    ///
    /// # Safety
    ///
    /// `object` must point to a live [`Self::Owner`], valid for writes when
    /// the receiver is [`Exclusive`].
    unsafe fn call(
        &self,
        object: *mut u8,
        params: &[AnyType],
        args: &[UArg<'_>],
    ) -> Result<Self::Output>;
}

fn check_arity(expected: usize, args: &[UArg<'_>]) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::ArityMismatch {
            expected,
            actual: args.len(),
        })
    }
}

fn cast_param<'a, T: Reflect + Clone>(
    params: &[AnyType],
    args: &'a [UArg<'_>],
    position: usize,
) -> Result<T::Param<'a>> {
    params
        .get(position)
        .and_then(|&param| args.get(position)?.cast_with::<T>(param))
        .map(T::into_param)
        .ok_or(Error::ArgumentTypeMismatch { position })
}

macro_rules! count {
    () => { 0 };
    ($head:ident $($tail:ident)*) => { 1 + count!($($tail)*) };
}

macro_rules! impl_signatures {
    ($(($($arg:ident $idx:tt),*))*) => {$(
        impl<R: Reflect, $($arg: Reflect),*> Reflect for fn($($arg),*) -> R {
            const OPS: ValueOps = ValueOps::new()
                .with_clone::<fn($($arg),*) -> R>()
                .with_debug::<fn($($arg),*) -> R>();

            crate::__reflect_by_value!();

            fn describe(registry: &TypeRegistry) -> TypeDef {
                TypeDef::Function(FunctionDef {
                    return_type: registry.resolve::<R>(),
                    argument_types: vec![$(registry.resolve::<$arg>()),*],
                })
            }
        }

        impl<F, R, $($arg),*> IntoFunction<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R
                + for<'a> Fn($(<$arg as Reflect>::Param<'a>),*) -> R
                + Send
                + Sync
                + 'static,
            R: Reflect,
            $($arg: Reflect + Clone,)*
        {
            type Return = R;
            type Params = ($($arg,)*);
            type Signature = fn($($arg),*) -> R;

            #[allow(unused_variables)]
            fn call(&self, params: &[AnyType], args: &[UArg<'_>]) -> Result<R> {
                #[allow(non_snake_case)]
                fn call_inner<R, $($arg),*>(f: &impl Fn($($arg),*) -> R, $($arg: $arg),*) -> R {
                    f($($arg),*)
                }

                check_arity(count!($($arg)*), args)?;
                Ok(call_inner(self, $(cast_param::<$arg>(params, args, $idx)?),*))
            }
        }

        impl<F, C, R, $($arg),*> IntoMethod<(Shared, C, ($($arg,)*))> for F
        where
            F: Fn(&C, $($arg),*) -> R
                + for<'a> Fn(&C, $(<$arg as Reflect>::Param<'a>),*) -> R
                + Send
                + Sync
                + 'static,
            C: Reflect,
            R: Reflect,
            $($arg: Reflect + Clone,)*
        {
            type Owner = C;
            type Return = R;
            type Output = R;
            type Params = ($($arg,)*);
            type Receiver = Shared;

            fn compile_return(policy: MethodPolicy) -> Result<MethodReturnFn<R>, RegistrationError> {
                Ok(policy.compile::<R>()?)
            }

            #[allow(unused_variables)]
            unsafe fn call(&self, object: *mut u8, params: &[AnyType], args: &[UArg<'_>]) -> Result<R> {
                #[allow(non_snake_case)]
                fn call_inner<C, R, $($arg),*>(f: &impl Fn(&C, $($arg),*) -> R, object: &C, $($arg: $arg),*) -> R {
                    f(object, $($arg),*)
                }

                check_arity(count!($($arg)*), args)?;
                $( #[allow(non_snake_case)] let $arg = cast_param::<$arg>(params, args, $idx)?; )*
                let object = unsafe { &*object.cast::<C>() };
                Ok(call_inner(self, object, $($arg),*))
            }
        }

        impl<F, C, R, $($arg),*> IntoMethod<(Exclusive, C, ($($arg,)*))> for F
        where
            F: Fn(&mut C, $($arg),*) -> R
                + for<'a> Fn(&mut C, $(<$arg as Reflect>::Param<'a>),*) -> R
                + Send
                + Sync
                + 'static,
            C: Reflect,
            R: Reflect,
            $($arg: Reflect + Clone,)*
        {
            type Owner = C;
            type Return = R;
            type Output = R;
            type Params = ($($arg,)*);
            type Receiver = Exclusive;

            fn compile_return(policy: MethodPolicy) -> Result<MethodReturnFn<R>, RegistrationError> {
                Ok(policy.compile::<R>()?)
            }

            #[allow(unused_variables)]
            unsafe fn call(&self, object: *mut u8, params: &[AnyType], args: &[UArg<'_>]) -> Result<R> {
                #[allow(non_snake_case)]
                fn call_inner<C, R, $($arg),*>(f: &impl Fn(&mut C, $($arg),*) -> R, object: &mut C, $($arg: $arg),*) -> R {
                    f(object, $($arg),*)
                }

                check_arity(count!($($arg)*), args)?;
                // arguments are converted before the receiver is borrowed mutably
                $( #[allow(non_snake_case)] let $arg = cast_param::<$arg>(params, args, $idx)?; )*
                let object = unsafe { &mut *object.cast::<C>() };
                Ok(call_inner(self, object, $($arg),*))
            }
        }

        impl<F, C, R, $($arg),*> IntoMethod<(Shared, Borrowed, C, R, ($($arg,)*))> for F
        where
            F: for<'c> Fn(&'c C, $($arg),*) -> &'c R
                + for<'c, 'a> Fn(&'c C, $(<$arg as Reflect>::Param<'a>),*) -> &'c R
                + Send
                + Sync
                + 'static,
            C: Reflect,
            R: Reflect,
            $($arg: Reflect + Clone,)*
        {
            type Owner = C;
            type Return = &'static R;
            type Output = *const R;
            type Params = ($($arg,)*);
            type Receiver = Shared;

            fn compile_return(policy: MethodPolicy) -> Result<MethodReturnFn<*const R>, RegistrationError> {
                policy.compile_borrowed::<R>()
            }

            #[allow(unused_variables)]
            unsafe fn call(&self, object: *mut u8, params: &[AnyType], args: &[UArg<'_>]) -> Result<*const R> {
                #[allow(non_snake_case)]
                fn call_inner<'c, C, R, $($arg),*>(f: &impl Fn(&'c C, $($arg),*) -> &'c R, object: &'c C, $($arg: $arg),*) -> &'c R {
                    f(object, $($arg),*)
                }

                check_arity(count!($($arg)*), args)?;
                $( #[allow(non_snake_case)] let $arg = cast_param::<$arg>(params, args, $idx)?; )*
                let object = unsafe { &*object.cast::<C>() };
                Ok(call_inner(self, object, $($arg),*))
            }
        }

        impl<F, C, R, $($arg),*> IntoMethod<(Exclusive, Borrowed, C, R, ($($arg,)*))> for F
        where
            F: for<'c> Fn(&'c mut C, $($arg),*) -> &'c mut R
                + for<'c, 'a> Fn(&'c mut C, $(<$arg as Reflect>::Param<'a>),*) -> &'c mut R
                + Send
                + Sync
                + 'static,
            C: Reflect,
            R: Reflect,
            $($arg: Reflect + Clone,)*
        {
            type Owner = C;
            type Return = &'static mut R;
            type Output = *mut R;
            type Params = ($($arg,)*);
            type Receiver = Exclusive;

            fn compile_return(policy: MethodPolicy) -> Result<MethodReturnFn<*mut R>, RegistrationError> {
                policy.compile_borrowed_mut::<R>()
            }

            #[allow(unused_variables)]
            unsafe fn call(&self, object: *mut u8, params: &[AnyType], args: &[UArg<'_>]) -> Result<*mut R> {
                #[allow(non_snake_case)]
                fn call_inner<'c, C, R, $($arg),*>(f: &impl Fn(&'c mut C, $($arg),*) -> &'c mut R, object: &'c mut C, $($arg: $arg),*) -> &'c mut R {
                    f(object, $($arg),*)
                }

                check_arity(count!($($arg)*), args)?;
                $( #[allow(non_snake_case)] let $arg = cast_param::<$arg>(params, args, $idx)?; )*
                let object = unsafe { &mut *object.cast::<C>() };
                Ok(call_inner(self, object, $($arg),*))
            }
        }
    )*};
}

impl_signatures! {
    ()
    (A0 0)
    (A0 0, A1 1)
    (A0 0, A1 1, A2 2)
    (A0 0, A1 1, A2 2, A3 3)
    (A0 0, A1 1, A2 2, A3 3, A4 4)
    (A0 0, A1 1, A2 2, A3 3, A4 4, A5 5)
}
