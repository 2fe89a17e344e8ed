//! Argument adapters.
//!
//! A [`UArgBase`] describes an argument by type only and answers whether it
//! could be passed to a parameter. A [`UArg`] additionally points at a live
//! argument and performs the conversion. Arguments are always received by
//! value: the parameter gets a copy, a widened number, a copied-out
//! referent, a converted pointer or the copied base part of a class.

use core::marker::PhantomData;

use smallvec::SmallVec;

use crate::cast::plan_value_cast;
use crate::{AnyType, Error, Reflect, Result, TypeRegistry, UValue};

/// How an argument or instance was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Through a shared reference.
    Const,
    /// Through a mutable reference.
    Mut,
    /// By value.
    Owned,
}

impl RefKind {
    /// Returns `true` for [`RefKind::Const`].
    pub fn is_const(self) -> bool {
        matches!(self, RefKind::Const)
    }
}

/// Type-only description of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UArgBase {
    ty: Option<AnyType>,
    kind: RefKind,
}

impl UArgBase {
    /// An argument of type `ty` supplied as `kind`.
    pub fn new(ty: AnyType, kind: RefKind) -> Self {
        UArgBase { ty: Some(ty), kind }
    }

    /// Describes an empty [`UValue`]; it converts to nothing.
    pub fn empty() -> Self {
        UArgBase {
            ty: None,
            kind: RefKind::Owned,
        }
    }

    /// The argument's type, `None` for an empty value.
    pub fn get_type(&self) -> Option<AnyType> {
        self.ty
    }

    /// How the argument was supplied.
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// Returns `true` if the argument can be passed to a parameter of type
    /// `T`.
    pub fn can_cast_to<T: Reflect>(&self, registry: &TypeRegistry) -> bool {
        self.can_cast_to_type(registry.resolve::<T>())
    }

    /// Returns `true` if the argument can be passed to a parameter of type
    /// `to`.
    pub fn can_cast_to_type(&self, to: AnyType) -> bool {
        self.ty.is_some_and(|from| plan_value_cast(from, to).is_some())
    }
}

/// A live argument.
pub struct UArg<'a> {
    base: UArgBase,
    data: *const u8,
    _marker: PhantomData<&'a ()>,
}

impl<'a> UArg<'a> {
    /// The type-only part.
    pub fn base(&self) -> &UArgBase {
        &self.base
    }

    /// Address of the argument, null for an empty value.
    pub fn data(&self) -> *const u8 {
        self.data
    }

    /// Converts the argument to `T`, or returns `None` if it cannot be
    /// passed to a `T` parameter.
    pub fn cast<T: Reflect + Clone>(&self, registry: &TypeRegistry) -> Option<T> {
        self.cast_with(registry.resolve::<T>())
    }

    /// Like [`Self::cast`], with the descriptor of `T` already resolved.
    pub(crate) fn cast_with<T: Reflect + Clone>(&self, to: AnyType) -> Option<T> {
        debug_assert!(to.is::<T>());
        let plan = plan_value_cast(self.base.ty?, to)?;
        Some(unsafe { plan.execute::<T>(self.data) })
    }
}

/// Where an argument comes from.
pub(crate) enum Source<'a> {
    Borrowed {
        data: *const u8,
        kind: RefKind,
        resolve: fn(&TypeRegistry) -> AnyType,
        _marker: PhantomData<&'a ()>,
    },
    Value(&'a UValue),
    ValueMut(&'a mut UValue),
    Owned(UValue),
}

impl<'a> Source<'a> {
    pub(crate) fn borrowed<T: Reflect>(value: &'a T, kind: RefKind) -> Self {
        Source::Borrowed {
            data: (value as *const T).cast(),
            kind,
            resolve: TypeRegistry::resolve::<T>,
            _marker: PhantomData,
        }
    }

    pub(crate) fn borrowed_mut<T: Reflect>(value: &'a mut T) -> Self {
        Source::Borrowed {
            data: (value as *mut T).cast_const().cast(),
            kind: RefKind::Mut,
            resolve: TypeRegistry::resolve::<T>,
            _marker: PhantomData,
        }
    }

    fn value_type(value: &UValue, registry: &TypeRegistry) -> Option<AnyType> {
        value.get_type(registry)
    }

    pub(crate) fn get_type(&self, registry: &TypeRegistry) -> Option<AnyType> {
        match self {
            Source::Borrowed { resolve, .. } => Some(resolve(registry)),
            Source::Value(value) => Self::value_type(value, registry),
            Source::ValueMut(value) => Self::value_type(value, registry),
            Source::Owned(value) => Self::value_type(value, registry),
        }
    }

    pub(crate) fn kind(&self) -> RefKind {
        match self {
            Source::Borrowed { kind, .. } => *kind,
            Source::Value(_) => RefKind::Const,
            Source::ValueMut(_) => RefKind::Mut,
            Source::Owned(_) => RefKind::Owned,
        }
    }

    pub(crate) fn data(&self) -> *const u8 {
        match self {
            Source::Borrowed { data, .. } => *data,
            Source::Value(value) => value.data(),
            Source::ValueMut(value) => value.data(),
            Source::Owned(value) => value.data(),
        }
    }

    /// Mutable address; null unless the source grants mutable access.
    pub(crate) fn data_mut(&mut self) -> *mut u8 {
        match self {
            Source::Borrowed {
                data,
                kind: RefKind::Mut | RefKind::Owned,
                ..
            } => data.cast_mut(),
            Source::Borrowed { .. } | Source::Value(_) => core::ptr::null_mut(),
            Source::ValueMut(value) => value.data_mut(),
            Source::Owned(value) => value.data_mut(),
        }
    }
}

/// One argument supplied to a call.
pub struct ArgSource<'a>(pub(crate) Source<'a>);

impl<'a> ArgSource<'a> {
    /// Type-only description.
    pub fn base(&self, registry: &TypeRegistry) -> UArgBase {
        match self.0.get_type(registry) {
            Some(ty) => UArgBase::new(ty, self.0.kind()),
            None => UArgBase::empty(),
        }
    }

    /// Live adapter borrowing this source.
    pub fn uarg(&self, registry: &TypeRegistry) -> UArg<'_> {
        UArg {
            base: self.base(registry),
            data: self.0.data(),
            _marker: PhantomData,
        }
    }
}

/// Argument lists are short; most fit inline.
pub type ArgSources<'a> = SmallVec<[ArgSource<'a>; 4]>;

/// Values that can be passed as one argument.
pub trait IntoUArg<'a> {
    /// Wraps `self`.
    fn into_source(self) -> ArgSource<'a>;
}

impl<'a, T: Reflect> IntoUArg<'a> for &'a T {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::borrowed(self, RefKind::Const))
    }
}

impl<'a, T: Reflect> IntoUArg<'a> for &'a mut T {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::borrowed_mut(self))
    }
}

impl<'a> IntoUArg<'a> for &'a UValue {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::Value(self))
    }
}

impl<'a> IntoUArg<'a> for &'a mut UValue {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::ValueMut(self))
    }
}

impl<'a> IntoUArg<'a> for UValue {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::Owned(self))
    }
}

impl<'a> IntoUArg<'a> for ArgSource<'a> {
    fn into_source(self) -> ArgSource<'a> {
        self
    }
}

macro_rules! impl_into_uarg_by_value {
    ($($ty:ty),* $(,)?) => {$(
        impl<'a> IntoUArg<'a> for $ty {
            fn into_source(self) -> ArgSource<'a> {
                ArgSource(Source::Owned(UValue::new(self)))
            }
        }
    )*};
}

impl_into_uarg_by_value!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String,
);

impl<'a, T: Reflect> IntoUArg<'a> for *const T {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::Owned(UValue::new(self)))
    }
}

impl<'a, T: Reflect> IntoUArg<'a> for *mut T {
    fn into_source(self) -> ArgSource<'a> {
        ArgSource(Source::Owned(UValue::new(self)))
    }
}

/// Argument lists: tuples of up to six [`IntoUArg`]s, or dynamic lists of
/// [`UValue`]s.
pub trait IntoArgs<'a> {
    /// Wraps every argument.
    fn into_sources(self) -> ArgSources<'a>;
}

impl<'a> IntoArgs<'a> for &'a [UValue] {
    fn into_sources(self) -> ArgSources<'a> {
        self.iter()
            .map(|value| ArgSource(Source::Value(value)))
            .collect()
    }
}

impl<'a> IntoArgs<'a> for Vec<UValue> {
    fn into_sources(self) -> ArgSources<'a> {
        self.into_iter()
            .map(|value| ArgSource(Source::Owned(value)))
            .collect()
    }
}

impl<'a> IntoArgs<'a> for ArgSources<'a> {
    fn into_sources(self) -> ArgSources<'a> {
        self
    }
}

/// Type-only argument lists: tuples of up to six reflected types.
pub trait ArgTypes {
    /// Descriptors of the element types, in order.
    fn types(registry: &TypeRegistry) -> Vec<AnyType>;

    /// Type-only descriptions of the elements, as if passed by value.
    fn bases(registry: &TypeRegistry) -> SmallVec<[UArgBase; 4]> {
        Self::types(registry)
            .into_iter()
            .map(|ty| UArgBase::new(ty, RefKind::Owned))
            .collect()
    }
}

macro_rules! impl_args_for_tuples {
    ($(($($name:ident),*))*) => {$(
        impl<'a, $($name: IntoUArg<'a>),*> IntoArgs<'a> for ($($name,)*) {
            #[allow(non_snake_case)]
            fn into_sources(self) -> ArgSources<'a> {
                let ($($name,)*) = self;
                #[allow(unused_mut)]
                let mut sources = ArgSources::new();
                $( sources.push($name.into_source()); )*
                sources
            }
        }

        impl<$($name: Reflect),*> ArgTypes for ($($name,)*) {
            #[allow(unused_variables)]
            fn types(registry: &TypeRegistry) -> Vec<AnyType> {
                vec![$(registry.resolve::<$name>()),*]
            }
        }
    )*};
}

impl_args_for_tuples! {
    ()
    (A0)
    (A0, A1)
    (A0, A1, A2)
    (A0, A1, A2, A3)
    (A0, A1, A2, A3, A4)
    (A0, A1, A2, A3, A4, A5)
}

/// Checks arguments against parameter types: arity first, then each
/// position in order.
pub(crate) fn check_arguments(params: &[AnyType], args: &[UArgBase]) -> Result<()> {
    if args.len() != params.len() {
        return Err(Error::ArityMismatch {
            expected: params.len(),
            actual: args.len(),
        });
    }
    for (position, (arg, &param)) in args.iter().zip(params).enumerate() {
        if !arg.can_cast_to_type(param) {
            return Err(Error::ArgumentTypeMismatch { position });
        }
    }
    Ok(())
}

/// Type-only descriptions of live sources.
pub(crate) fn source_bases(sources: &[ArgSource<'_>], registry: &TypeRegistry) -> SmallVec<[UArgBase; 4]> {
    sources.iter().map(|source| source.base(registry)).collect()
}

/// Live adapters over sources.
pub(crate) fn source_uargs<'s>(sources: &'s [ArgSource<'_>], registry: &TypeRegistry) -> SmallVec<[UArg<'s>; 4]> {
    sources.iter().map(|source| source.uarg(registry)).collect()
}
