//! Value operations a reflected type may support.
//!
//! Each operation is an optional type-erased function pointer. Types opt in
//! through the const builder methods on [`ValueOps`], usually from the
//! [`crate::reflect_class!`] macro. A [`crate::UValue`] consults these when
//! asked to compare, print, parse, dereference or index its content, and
//! reports [`crate::Error::UnsupportedOperation`] for anything missing.

use core::cmp::Ordering;
use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use crate::{Error, Reflect, Result, UValue};

/// Writes a clone of the value at `src` into the uninitialized `dst`.
pub type CloneIntoFn = unsafe fn(src: *const u8, dst: *mut u8);
/// Compares two values of the same type for equality.
pub type PartialEqFn = unsafe fn(*const u8, *const u8) -> bool;
/// Compares two values of the same type for ordering.
pub type PartialCmpFn = unsafe fn(*const u8, *const u8) -> Option<Ordering>;
/// Formats a value.
pub type FmtFn = unsafe fn(*const u8, &mut fmt::Formatter<'_>) -> fmt::Result;
/// Parses text and assigns it over the initialized value at the pointer.
pub type ParseFn = unsafe fn(&str, *mut u8) -> bool;
/// Copies out the value a pointer-like value points to.
pub type DerefFn = unsafe fn(*const u8) -> Result<UValue>;
/// Copies out the element at an index of an array-like value.
pub type IndexFn = unsafe fn(*const u8, usize) -> Result<UValue>;
/// Turns a reference into a pointer value.
pub type AddressOfFn = unsafe fn(*const u8) -> UValue;

/// The optional operations of one type.
#[derive(Clone, Copy)]
pub struct ValueOps {
    pub(crate) clone_into: Option<CloneIntoFn>,
    pub(crate) partial_eq: Option<PartialEqFn>,
    pub(crate) partial_cmp: Option<PartialCmpFn>,
    pub(crate) debug: Option<FmtFn>,
    pub(crate) display: Option<FmtFn>,
    pub(crate) parse: Option<ParseFn>,
    pub(crate) deref: Option<DerefFn>,
    /// Dereference of a raw pointer or detached reference, whose target may
    /// be gone; only reached through [`UValue::deref_unchecked`].
    pub(crate) deref_alias: Option<DerefFn>,
    pub(crate) index: Option<IndexFn>,
    pub(crate) address_of: Option<AddressOfFn>,
}

impl Default for ValueOps {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValueOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOps")
            .field("clone", &self.clone_into.is_some())
            .field("eq", &self.partial_eq.is_some())
            .field("ord", &self.partial_cmp.is_some())
            .field("debug", &self.debug.is_some())
            .field("display", &self.display.is_some())
            .field("parse", &self.parse.is_some())
            .field("deref", &self.deref.is_some())
            .field("deref_alias", &self.deref_alias.is_some())
            .field("index", &self.index.is_some())
            .finish()
    }
}

impl ValueOps {
    /// No operations at all.
    pub const fn new() -> Self {
        ValueOps {
            clone_into: None,
            partial_eq: None,
            partial_cmp: None,
            debug: None,
            display: None,
            parse: None,
            deref: None,
            deref_alias: None,
            index: None,
            address_of: None,
        }
    }

    /// Values can be copied; required by [`crate::UValue`] copy-out
    /// policies.
    pub const fn with_clone<T: Clone>(mut self) -> Self {
        self.clone_into = Some(clone_into::<T>);
        self
    }

    /// Equality.
    pub const fn with_eq<T: PartialEq>(mut self) -> Self {
        self.partial_eq = Some(partial_eq::<T>);
        self
    }

    /// Ordering.
    pub const fn with_ord<T: PartialOrd>(mut self) -> Self {
        self.partial_cmp = Some(partial_cmp::<T>);
        self
    }

    /// Debug formatting.
    pub const fn with_debug<T: fmt::Debug>(mut self) -> Self {
        self.debug = Some(debug::<T>);
        self
    }

    /// Display formatting (stream out).
    pub const fn with_display<T: fmt::Display>(mut self) -> Self {
        self.display = Some(display::<T>);
        self
    }

    /// Parsing (stream in).
    pub const fn with_parse<T: FromStr>(mut self) -> Self {
        self.parse = Some(parse::<T>);
        self
    }

    /// Pointer-like: dereferencing copies out the target.
    pub const fn with_deref<T>(mut self) -> Self
    where
        T: Deref,
        T::Target: Reflect,
    {
        self.deref = Some(deref::<T>);
        self
    }

    /// Array-like: indexing copies out an element.
    pub const fn with_index<T, E>(mut self) -> Self
    where
        T: AsRef<[E]>,
        E: Reflect,
    {
        self.index = Some(index_slice::<T, E>);
        self
    }

    /// Supports copying.
    pub const fn is_cloneable(&self) -> bool {
        self.clone_into.is_some()
    }

    /// Supports equality.
    pub const fn is_eq_comparable(&self) -> bool {
        self.partial_eq.is_some()
    }

    /// Supports ordering.
    pub const fn is_ord_comparable(&self) -> bool {
        self.partial_cmp.is_some()
    }

    /// Supports dereferencing.
    pub const fn is_pointer_like(&self) -> bool {
        self.deref.is_some()
    }

    /// Supports indexing.
    pub const fn is_array_like(&self) -> bool {
        self.index.is_some()
    }
}

pub(crate) unsafe fn clone_into<T: Clone>(src: *const u8, dst: *mut u8) {
    unsafe { dst.cast::<T>().write((*src.cast::<T>()).clone()) }
}

unsafe fn partial_eq<T: PartialEq>(left: *const u8, right: *const u8) -> bool {
    unsafe { *left.cast::<T>() == *right.cast::<T>() }
}

unsafe fn partial_cmp<T: PartialOrd>(left: *const u8, right: *const u8) -> Option<Ordering> {
    unsafe { (*left.cast::<T>()).partial_cmp(&*right.cast::<T>()) }
}

unsafe fn debug<T: fmt::Debug>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(unsafe { &*ptr.cast::<T>() }, f)
}

unsafe fn display<T: fmt::Display>(ptr: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(unsafe { &*ptr.cast::<T>() }, f)
}

unsafe fn parse<T: FromStr>(text: &str, dst: *mut u8) -> bool {
    match text.trim().parse::<T>() {
        Ok(value) => {
            unsafe { *dst.cast::<T>() = value };
            true
        }
        Err(_) => false,
    }
}

unsafe fn deref<T>(ptr: *const u8) -> Result<UValue>
where
    T: Deref,
    T::Target: Reflect,
{
    let target: &T::Target = unsafe { &*ptr.cast::<T>() };
    unsafe { UValue::clone_from_ptr::<T::Target>(target) }
}

unsafe fn index_slice<T, E>(ptr: *const u8, index: usize) -> Result<UValue>
where
    T: AsRef<[E]>,
    E: Reflect,
{
    let slice = unsafe { &*ptr.cast::<T>() }.as_ref();
    let element = slice.get(index).ok_or(Error::BadUValueAccess)?;
    unsafe { UValue::clone_from_ptr::<E>(element) }
}
