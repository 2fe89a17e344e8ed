//! [`Reflect`] implementations for primitives, pointers, references and
//! standard containers, plus the macros user types implement it with.

use alloc::sync::Arc;
use core::fmt;
use core::mem::{MaybeUninit, size_of};
use core::ptr::NonNull;

use crate::{
    ArrayDef, ArrayFlags, ClassDef, Error, FmtFn, Number, NumberDef, NumberFlags, Numeric,
    PointerDef, PointerFlags, Reflect, ReferenceDef, ReferenceFlags, Result, Sealed, TypeDef,
    TypeRegistry, UValue, ValueOps,
};

macro_rules! impl_numeric {
    ($($ty:ty => $variant:ident, $flags:expr;)*) => {$(
        impl Sealed for $ty {}

        impl Reflect for $ty {
            const OPS: ValueOps = ValueOps::new()
                .with_clone::<$ty>()
                .with_eq::<$ty>()
                .with_ord::<$ty>()
                .with_debug::<$ty>()
                .with_display::<$ty>()
                .with_parse::<$ty>();

            crate::__reflect_by_value!();

            fn describe(_registry: &TypeRegistry) -> TypeDef {
                TypeDef::Number(NumberDef::of::<$ty>())
            }
        }

        impl Numeric for $ty {
            const FLAGS: NumberFlags = $flags;

            fn to_number(self) -> Number {
                Number::$variant(self as _)
            }

            fn from_number(number: Number) -> Self {
                match number {
                    Number::Signed(value) => value as $ty,
                    Number::Unsigned(value) => value as $ty,
                    Number::Float(value) => value as $ty,
                }
            }
        }
    )*};
}

const SIGNED_INT: NumberFlags = NumberFlags::IS_SIGNED.union(NumberFlags::IS_INTEGRAL);
const UNSIGNED_INT: NumberFlags = NumberFlags::IS_UNSIGNED.union(NumberFlags::IS_INTEGRAL);
const FLOAT: NumberFlags = NumberFlags::IS_SIGNED.union(NumberFlags::IS_FLOATING_POINT);

impl_numeric! {
    i8 => Signed, SIGNED_INT;
    i16 => Signed, SIGNED_INT;
    i32 => Signed, SIGNED_INT;
    i64 => Signed, SIGNED_INT;
    isize => Signed, SIGNED_INT;
    u8 => Unsigned, UNSIGNED_INT;
    u16 => Unsigned, UNSIGNED_INT;
    u32 => Unsigned, UNSIGNED_INT;
    u64 => Unsigned, UNSIGNED_INT;
    usize => Unsigned, UNSIGNED_INT;
    f32 => Float, FLOAT;
    f64 => Float, FLOAT;
}

impl Sealed for bool {}

impl Reflect for bool {
    const OPS: ValueOps = ValueOps::new()
        .with_clone::<bool>()
        .with_eq::<bool>()
        .with_ord::<bool>()
        .with_debug::<bool>()
        .with_display::<bool>()
        .with_parse::<bool>();

    crate::__reflect_by_value!();

    fn describe(_registry: &TypeRegistry) -> TypeDef {
        TypeDef::Number(NumberDef::of::<bool>())
    }
}

impl Numeric for bool {
    const FLAGS: NumberFlags = UNSIGNED_INT.union(NumberFlags::IS_BOOLEAN);

    fn to_number(self) -> Number {
        Number::Unsigned(self as u64)
    }

    fn from_number(number: Number) -> Self {
        match number {
            Number::Signed(value) => value != 0,
            Number::Unsigned(value) => value != 0,
            Number::Float(value) => value != 0.0,
        }
    }
}

impl Reflect for () {
    const OPS: ValueOps = ValueOps::new()
        .with_clone::<()>()
        .with_eq::<()>()
        .with_ord::<()>()
        .with_debug::<()>();

    crate::__reflect_by_value!();

    fn describe(_registry: &TypeRegistry) -> TypeDef {
        TypeDef::Void
    }
}

impl Reflect for String {
    const OPS: ValueOps = ValueOps::new()
        .with_clone::<String>()
        .with_eq::<String>()
        .with_ord::<String>()
        .with_debug::<String>()
        .with_display::<String>()
        .with_parse::<String>();

    crate::__reflect_by_value!();

    fn describe(_registry: &TypeRegistry) -> TypeDef {
        TypeDef::Class(ClassDef::new::<String>())
    }
}

/// Copies out the target of a thin pointer stored at `ptr`.
unsafe fn deref_thin<T: Reflect>(ptr: *const u8) -> Result<UValue> {
    let target = unsafe { ptr.cast::<*const T>().read() };
    if target.is_null() {
        return Err(Error::BadUValueAccess);
    }
    unsafe { UValue::clone_from_ptr::<T>(target) }
}

/// Wraps the thin pointer stored at `ptr` into a `*const T` value.
unsafe fn address_of_const<T: Reflect>(ptr: *const u8) -> UValue {
    UValue::new(unsafe { ptr.cast::<*const T>().read() })
}

/// Wraps the thin pointer stored at `ptr` into a `*mut T` value.
unsafe fn address_of_mut<T: Reflect>(ptr: *const u8) -> UValue {
    UValue::new(unsafe { ptr.cast::<*mut T>().read() })
}

unsafe fn referent_eq<T: Reflect>(left: *const u8, right: *const u8) -> bool {
    let (left, right) = unsafe { (left.cast::<*const u8>().read(), right.cast::<*const u8>().read()) };
    match T::OPS.partial_eq {
        Some(eq) => unsafe { eq(left, right) },
        None => false,
    }
}

unsafe fn referent_cmp<T: Reflect>(left: *const u8, right: *const u8) -> Option<core::cmp::Ordering> {
    let (left, right) = unsafe { (left.cast::<*const u8>().read(), right.cast::<*const u8>().read()) };
    T::OPS.partial_cmp.and_then(|cmp| unsafe { cmp(left, right) })
}

unsafe fn referent_debug<T: Reflect>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let target = unsafe { ptr.cast::<*const u8>().read() };
    match T::OPS.debug {
        Some(debug) => {
            f.write_str("&")?;
            unsafe { debug(target, f) }
        }
        None => write!(f, "&⟨{}⟩", core::any::type_name::<T>()),
    }
}

unsafe fn referent_display<T: Reflect>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let target = unsafe { ptr.cast::<*const u8>().read() };
    match T::OPS.display {
        Some(display) => unsafe { display(target, f) },
        None => write!(f, "⟨{}⟩", core::any::type_name::<T>()),
    }
}

/// Operations of reference-like types whose layout is a thin pointer to `T`.
const fn reference_ops<R: Clone, T: Reflect>(address_of: crate::AddressOfFn) -> ValueOps {
    let mut ops = ValueOps::new().with_clone::<R>();
    ops.debug = Some(referent_debug::<T>);
    ops.address_of = Some(address_of);
    if T::OPS.partial_eq.is_some() {
        ops.partial_eq = Some(referent_eq::<T>);
    }
    if T::OPS.partial_cmp.is_some() {
        ops.partial_cmp = Some(referent_cmp::<T>);
    }
    if T::OPS.display.is_some() {
        ops.display = Some(referent_display::<T>);
    }
    if T::OPS.clone_into.is_some() {
        ops.deref = Some(deref_thin::<T>);
    }
    ops
}

/// Operations of raw pointers to `T`.
const fn pointer_ops<P, T>() -> ValueOps
where
    P: Clone + PartialEq + PartialOrd + fmt::Debug,
    T: Reflect,
{
    let mut ops = ValueOps::new()
        .with_clone::<P>()
        .with_eq::<P>()
        .with_ord::<P>()
        .with_debug::<P>();
    if T::OPS.clone_into.is_some() {
        ops.deref_alias = Some(deref_thin::<T>);
    }
    ops
}

unsafe fn alias_debug<T: Reflect>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let target = unsafe { ptr.cast::<*const T>().read() };
    write!(f, "&{target:p}")
}

/// Operations of the reference wrappers. Nothing here reads the referent,
/// which may be gone by the time the wrapper is used.
const fn alias_ops<R: Clone, T: Reflect>(address_of: crate::AddressOfFn) -> ValueOps {
    let mut ops = ValueOps::new().with_clone::<R>();
    ops.debug = Some(alias_debug::<T>);
    ops.address_of = Some(address_of);
    if T::OPS.clone_into.is_some() {
        ops.deref_alias = Some(deref_thin::<T>);
    }
    ops
}

impl<T: Reflect> Reflect for *const T {
    const OPS: ValueOps = pointer_ops::<*const T, T>();

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Pointer(PointerDef {
            flags: PointerFlags::IS_READONLY,
            data_type: registry.resolve::<T>(),
        })
    }
}

impl<T: Reflect> Reflect for *mut T {
    const OPS: ValueOps = pointer_ops::<*mut T, T>();

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Pointer(PointerDef {
            flags: PointerFlags::empty(),
            data_type: registry.resolve::<T>(),
        })
    }
}

impl<T: Reflect> Reflect for &'static T {
    const OPS: ValueOps = reference_ops::<&'static T, T>(address_of_const::<T>);

    type Param<'a> = &'a T;

    fn into_param<'a>(self) -> &'a T {
        self
    }

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Reference(ReferenceDef {
            flags: ReferenceFlags::IS_READONLY,
            data_type: registry.resolve::<T>(),
        })
    }
}

/// Only describes `&mut self` borrows returned by methods; it is not
/// clonable, so no callable takes it as a parameter.
impl<T: Reflect> Reflect for &'static mut T {
    const OPS: ValueOps = {
        let mut ops = ValueOps::new();
        ops.debug = Some(alias_debug::<T>);
        ops.address_of = Some(address_of_mut::<T>);
        ops
    };

    type Param<'a> = &'a mut T;

    fn into_param<'a>(self) -> &'a mut T {
        self
    }

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Reference(ReferenceDef {
            flags: ReferenceFlags::empty(),
            data_type: registry.resolve::<T>(),
        })
    }
}

/// A shared reference to a member or variable, produced by the
/// [`crate::MemberPolicy::AsReferenceWrapper`] policy.
///
/// It does not borrow: the referent must outlive every use of the wrapper.
#[repr(transparent)]
pub struct RefWrapper<T>(NonNull<T>);

/// A mutable reference to a member or variable, produced by the
/// [`crate::MemberPolicy::AsReferenceWrapper`] policy on a mutable instance.
///
/// It does not borrow: the referent must outlive every use of the wrapper.
#[repr(transparent)]
pub struct RefWrapperMut<T>(NonNull<T>);

impl<T> RefWrapper<T> {
    /// Wraps a reference to `target`.
    pub fn new(target: &T) -> Self {
        RefWrapper(NonNull::from(target))
    }

    /// The address of the referent.
    pub fn as_ptr(&self) -> *const T {
        self.0.as_ptr()
    }

    /// Borrows the referent.
    ///
    /// # Safety
    ///
    /// The referent must still be alive and not mutably borrowed.
    pub unsafe fn get(&self) -> &T {
        unsafe { self.0.as_ref() }
    }
}

impl<T> RefWrapperMut<T> {
    /// Wraps a mutable reference to `target`.
    pub fn new(target: &mut T) -> Self {
        RefWrapperMut(NonNull::from(target))
    }

    /// The address of the referent.
    pub fn as_ptr(&self) -> *mut T {
        self.0.as_ptr()
    }

    /// Mutably borrows the referent.
    ///
    /// # Safety
    ///
    /// The referent must still be alive and not borrowed elsewhere.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut T {
        unsafe { &mut *self.0.as_ptr() }
    }
}

impl<T> Clone for RefWrapper<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RefWrapper<T> {}

impl<T> Clone for RefWrapperMut<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RefWrapperMut<T> {}

impl<T: Reflect> Reflect for RefWrapper<T> {
    const OPS: ValueOps = alias_ops::<RefWrapper<T>, T>(address_of_const::<T>);

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Reference(ReferenceDef {
            flags: ReferenceFlags::IS_READONLY.union(ReferenceFlags::IS_DETACHED),
            data_type: registry.resolve::<T>(),
        })
    }
}

impl<T: Reflect> Reflect for RefWrapperMut<T> {
    const OPS: ValueOps = alias_ops::<RefWrapperMut<T>, T>(address_of_mut::<T>);

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Reference(ReferenceDef {
            flags: ReferenceFlags::IS_DETACHED,
            data_type: registry.resolve::<T>(),
        })
    }
}

/// Formats `len` consecutive `T`s starting at `ptr` through `T`'s debug op.
struct ErasedList {
    ptr: *const u8,
    len: usize,
    stride: usize,
    debug: FmtFn,
}

impl fmt::Debug for ErasedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Element(*const u8, FmtFn);
        impl fmt::Debug for Element {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                unsafe { (self.1)(self.0, f) }
            }
        }

        f.debug_list()
            .entries((0..self.len).map(|i| Element(self.ptr.wrapping_add(i * self.stride), self.debug)))
            .finish()
    }
}

unsafe fn slice_eq<T: Reflect>(left: &[T], right: &[T]) -> bool {
    let Some(eq) = T::OPS.partial_eq else {
        return false;
    };
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| unsafe { eq((l as *const T).cast(), (r as *const T).cast()) })
}

unsafe fn slice_debug<T: Reflect>(items: &[T], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match T::OPS.debug {
        Some(debug) => fmt::Debug::fmt(
            &ErasedList {
                ptr: items.as_ptr().cast(),
                len: items.len(),
                stride: size_of::<T>(),
                debug,
            },
            f,
        ),
        None => write!(f, "[⟨{}⟩; {}]", core::any::type_name::<T>(), items.len()),
    }
}

/// Clones `item` with a clone op of `T`.
unsafe fn clone_with<T>(clone: crate::CloneIntoFn, item: &T) -> T {
    let mut slot = MaybeUninit::<T>::uninit();
    unsafe {
        clone((item as *const T).cast(), slot.as_mut_ptr().cast());
        slot.assume_init()
    }
}

fn element_clone<T: Reflect>() -> crate::CloneIntoFn {
    match T::OPS.clone_into {
        Some(clone) => clone,
        None => unreachable!("container clone ops are only installed for cloneable elements"),
    }
}

unsafe fn array_clone<T: Reflect, const N: usize>(src: *const u8, dst: *mut u8) {
    let clone = element_clone::<T>();
    let (src, dst) = (src.cast::<T>(), dst.cast::<T>());
    for i in 0..N {
        unsafe { dst.add(i).write(clone_with(clone, &*src.add(i))) };
    }
}

unsafe fn array_eq<T: Reflect, const N: usize>(left: *const u8, right: *const u8) -> bool {
    unsafe { slice_eq::<T>(&*left.cast::<[T; N]>(), &*right.cast::<[T; N]>()) }
}

unsafe fn array_debug<T: Reflect, const N: usize>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    unsafe { slice_debug::<T>(&*ptr.cast::<[T; N]>(), f) }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    const OPS: ValueOps = {
        let mut ops = ValueOps::new();
        ops.debug = Some(array_debug::<T, N>);
        if T::OPS.clone_into.is_some() {
            ops.clone_into = Some(array_clone::<T, N>);
            ops = ops.with_index::<[T; N], T>();
        }
        if T::OPS.partial_eq.is_some() {
            ops.partial_eq = Some(array_eq::<T, N>);
        }
        ops
    };

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Array(ArrayDef {
            flags: ArrayFlags::IS_BOUNDED,
            extent: N,
            data_type: registry.resolve::<T>(),
        })
    }
}

unsafe fn vec_clone<T: Reflect>(src: *const u8, dst: *mut u8) {
    let clone = element_clone::<T>();
    let src = unsafe { &*src.cast::<Vec<T>>() };
    let cloned: Vec<T> = src.iter().map(|item| unsafe { clone_with(clone, item) }).collect();
    unsafe { dst.cast::<Vec<T>>().write(cloned) };
}

unsafe fn vec_eq<T: Reflect>(left: *const u8, right: *const u8) -> bool {
    unsafe { slice_eq::<T>(&*left.cast::<Vec<T>>(), &*right.cast::<Vec<T>>()) }
}

unsafe fn vec_debug<T: Reflect>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    unsafe { slice_debug::<T>(&*ptr.cast::<Vec<T>>(), f) }
}

impl<T: Reflect> Reflect for Vec<T> {
    const OPS: ValueOps = {
        let mut ops = ValueOps::new();
        ops.debug = Some(vec_debug::<T>);
        if T::OPS.clone_into.is_some() {
            ops.clone_into = Some(vec_clone::<T>);
            ops = ops.with_index::<Vec<T>, T>();
        }
        if T::OPS.partial_eq.is_some() {
            ops.partial_eq = Some(vec_eq::<T>);
        }
        ops
    };

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Class(ClassDef::new::<Vec<T>>().with_argument_types(vec![registry.resolve::<T>()]))
    }
}

unsafe fn arc_debug<T: Reflect>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let target: &T = unsafe { &*ptr.cast::<Arc<T>>() };
    match T::OPS.debug {
        Some(debug) => unsafe { debug((target as *const T).cast(), f) },
        None => write!(f, "Arc(⟨{}⟩)", core::any::type_name::<T>()),
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    const OPS: ValueOps = {
        let mut ops = ValueOps::new().with_clone::<Arc<T>>();
        ops.debug = Some(arc_debug::<T>);
        if T::OPS.clone_into.is_some() {
            ops = ops.with_deref::<Arc<T>>();
        }
        ops
    };

    crate::__reflect_by_value!();

    fn describe(registry: &TypeRegistry) -> TypeDef {
        TypeDef::Class(ClassDef::new::<Arc<T>>().with_argument_types(vec![registry.resolve::<T>()]))
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __reflect_by_value {
    () => {
        type Param<'a> = Self;

        fn into_param<'a>(self) -> Self::Param<'a> {
            self
        }
    };
}

/// Implements [`Reflect`] for a struct, describing it as a class.
///
/// The optional list names the value operations the type supports once
/// erased; each must be implemented by the type: `Clone`, `PartialEq`,
/// `PartialOrd`, `Debug`, `Display`, `FromStr`, `Deref`.
///
/// ```
/// #[derive(Clone, PartialEq, Debug)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// reflecta::reflect_class!(Point: Clone, PartialEq, Debug);
///
/// let registry = reflecta::TypeRegistry::new();
/// assert!(registry.resolve::<Point>().is_class());
/// ```
#[macro_export]
macro_rules! reflect_class {
    ($ty:ty $(: $($op:ident),* $(,)?)?) => {
        impl $crate::Reflect for $ty {
            const OPS: $crate::ValueOps = {
                #[allow(unused_mut)]
                let mut ops = $crate::ValueOps::new();
                $($( ops = $crate::__reflect_op!(ops, $ty, $op); )*)?
                ops
            };

            $crate::__reflect_by_value!();

            fn describe(_registry: &$crate::TypeRegistry) -> $crate::TypeDef {
                $crate::TypeDef::Class($crate::ClassDef::new::<$ty>())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __reflect_op {
    ($ops:ident, $ty:ty, Clone) => {
        $ops.with_clone::<$ty>()
    };
    ($ops:ident, $ty:ty, PartialEq) => {
        $ops.with_eq::<$ty>()
    };
    ($ops:ident, $ty:ty, PartialOrd) => {
        $ops.with_ord::<$ty>()
    };
    ($ops:ident, $ty:ty, Debug) => {
        $ops.with_debug::<$ty>()
    };
    ($ops:ident, $ty:ty, Display) => {
        $ops.with_display::<$ty>()
    };
    ($ops:ident, $ty:ty, FromStr) => {
        $ops.with_parse::<$ty>()
    };
    ($ops:ident, $ty:ty, Deref) => {
        $ops.with_deref::<$ty>()
    };
}

/// Implements [`Reflect`] and [`crate::ReflectEnum`] for a fieldless enum
/// deriving `Clone`, `Copy`, `PartialEq` and `Debug`.
///
/// ```
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Color {
///     Red = 1,
///     Green = 2,
/// }
///
/// reflecta::reflect_enum!(Color as u8);
///
/// let registry = reflecta::TypeRegistry::new();
/// let color = registry.resolve::<Color>().as_enum().unwrap();
/// assert!(color.underlying_type().is_unsigned());
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ty as $underlying:ty) => {
        impl $crate::Reflect for $ty {
            const OPS: $crate::ValueOps = $crate::ValueOps::new()
                .with_clone::<$ty>()
                .with_eq::<$ty>()
                .with_debug::<$ty>();

            $crate::__reflect_by_value!();

            fn describe(registry: &$crate::TypeRegistry) -> $crate::TypeDef {
                $crate::TypeDef::Enum($crate::EnumDef::new::<$ty>(registry))
            }
        }

        impl $crate::ReflectEnum for $ty {
            type Underlying = $underlying;

            fn to_underlying(self) -> $underlying {
                self as $underlying
            }
        }
    };
}
