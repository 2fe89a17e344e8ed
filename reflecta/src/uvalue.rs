//! Type-erased owned values.

use core::alloc::Layout;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{MaybeUninit, align_of, size_of};
use core::ptr::NonNull;

use crate::memory::{allocate, deallocate};
use crate::{AnyType, CloneIntoFn, Error, Reflect, Result, TypeRegistry, ValueOps};

/// Values of at most this many bytes (and at most [`INLINE_ALIGN`]
/// alignment) are stored without a heap allocation.
pub const INLINE_SIZE: usize = 2 * size_of::<usize>();

/// Alignment of the inline buffer.
pub const INLINE_ALIGN: usize = align_of::<InlineBuffer>();

#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct InlineBuffer([MaybeUninit<u8>; INLINE_SIZE]);

impl InlineBuffer {
    const fn uninit() -> Self {
        InlineBuffer([MaybeUninit::uninit(); INLINE_SIZE])
    }

    fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr().cast()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr().cast()
    }
}

/// Everything a [`UValue`] needs to manage a value it no longer knows the
/// type of.
pub(crate) struct ValueVTable {
    pub(crate) type_name: fn() -> &'static str,
    pub(crate) native_id: fn() -> core::any::TypeId,
    pub(crate) layout: Layout,
    pub(crate) resolve: fn(&TypeRegistry) -> AnyType,
    pub(crate) drop_in_place: unsafe fn(*mut u8),
    pub(crate) clone_into: CloneIntoFn,
    pub(crate) ops: ValueOps,
}

impl ValueVTable {
    const fn fits_inline(&self) -> bool {
        self.layout.size() <= INLINE_SIZE && self.layout.align() <= INLINE_ALIGN
    }
}

unsafe fn drop_in_place<T>(ptr: *mut u8) {
    unsafe { core::ptr::drop_in_place(ptr.cast::<T>()) }
}

unsafe fn missing_clone(_src: *const u8, _dst: *mut u8) {
    unreachable!("values without a clone op are never stored in a UValue")
}

struct VTableFor<T>(PhantomData<T>);

impl<T: Reflect + Clone> VTableFor<T> {
    const CLONEABLE: &'static ValueVTable = &ValueVTable {
        type_name: core::any::type_name::<T>,
        native_id: core::any::TypeId::of::<T>,
        layout: Layout::new::<T>(),
        resolve: TypeRegistry::resolve::<T>,
        drop_in_place: drop_in_place::<T>,
        clone_into: crate::ops::clone_into::<T>,
        ops: T::OPS,
    };
}

impl<T: Reflect> VTableFor<T> {
    const REFLECTED: &'static ValueVTable = &ValueVTable {
        type_name: core::any::type_name::<T>,
        native_id: core::any::TypeId::of::<T>,
        layout: Layout::new::<T>(),
        resolve: TypeRegistry::resolve::<T>,
        drop_in_place: drop_in_place::<T>,
        clone_into: match T::OPS.clone_into {
            Some(clone) => clone,
            None => missing_clone,
        },
        ops: T::OPS,
    };
}

enum Storage {
    Empty,
    Inline {
        vtable: &'static ValueVTable,
        buffer: InlineBuffer,
    },
    Heap {
        vtable: &'static ValueVTable,
        ptr: NonNull<u8>,
    },
}

/// An owned value of any reflected type, or nothing.
///
/// Values that fit in two machine words (and whose alignment does not exceed
/// [`INLINE_ALIGN`]) live inline; larger ones are boxed. Every held value is
/// copyable, so `UValue` itself is [`Clone`].
///
/// Comparison, formatting, parsing, dereferencing and indexing are delegated
/// to the held type's [`ValueOps`]; a missing operation is reported as
/// [`Error::UnsupportedOperation`].
///
/// `UValue` is neither `Send` nor `Sync`: it may hold values that are
/// neither. See [`SharedValue`] for a thread-safe variant.
pub struct UValue {
    storage: Storage,
}

impl UValue {
    /// A value holding nothing.
    pub const fn empty() -> Self {
        UValue {
            storage: Storage::Empty,
        }
    }

    /// Takes ownership of `value`.
    pub fn new<T: Reflect + Clone>(value: T) -> Self {
        UValue {
            storage: Self::store(VTableFor::<T>::CLONEABLE, value),
        }
    }

    /// Takes ownership of `value`, copying through `T`'s clone op.
    ///
    /// Fails with [`Error::UnsupportedOperation`] when `T` declared none.
    pub fn from_reflected<T: Reflect>(value: T) -> Result<Self> {
        if T::OPS.clone_into.is_none() {
            return Err(Error::unsupported("clone"));
        }
        Ok(UValue {
            storage: Self::store(VTableFor::<T>::REFLECTED, value),
        })
    }

    /// Takes ownership of `value` without checking for a clone op.
    ///
    /// Only called where the op was verified at registration.
    pub(crate) fn adopt<T: Reflect>(value: T) -> Self {
        debug_assert!(T::OPS.clone_into.is_some());
        UValue {
            storage: Self::store(VTableFor::<T>::REFLECTED, value),
        }
    }

    /// Copies the value at `src` through `T`'s clone op.
    ///
    /// # Safety
    ///
    /// `src` must point to a live `T`.
    pub unsafe fn clone_from_ptr<T: Reflect>(src: *const T) -> Result<Self> {
        let Some(clone) = T::OPS.clone_into else {
            return Err(Error::unsupported("clone"));
        };
        let vtable = VTableFor::<T>::REFLECTED;
        let storage = unsafe { Self::store_with(vtable, |dst| clone(src.cast(), dst)) };
        Ok(UValue { storage })
    }

    fn store<T>(vtable: &'static ValueVTable, value: T) -> Storage {
        unsafe { Self::store_with(vtable, |dst| dst.cast::<T>().write(value)) }
    }

    /// Allocates storage for `vtable`'s type and lets `init` construct the
    /// value in it.
    ///
    /// # Safety
    ///
    /// `init` must fully initialize a value of `vtable`'s type at the pointer.
    unsafe fn store_with(vtable: &'static ValueVTable, init: impl FnOnce(*mut u8)) -> Storage {
        if vtable.fits_inline() {
            let mut buffer = InlineBuffer::uninit();
            init(buffer.as_mut_ptr());
            Storage::Inline { vtable, buffer }
        } else {
            let ptr = allocate(vtable.layout);
            init(ptr.as_ptr());
            Storage::Heap { vtable, ptr }
        }
    }

    /// Replaces the content with `value`, returning a reference to it.
    pub fn emplace<T: Reflect + Clone>(&mut self, value: T) -> &mut T {
        self.emplace_with(|| value)
    }

    /// Destroys the current content, then constructs a `T` with `make`.
    ///
    /// If `make` panics the value is left empty.
    pub fn emplace_with<T: Reflect + Clone>(&mut self, make: impl FnOnce() -> T) -> &mut T {
        self.reset();
        let value = make();
        self.storage = Self::store(VTableFor::<T>::CLONEABLE, value);
        unsafe { &mut *self.data_mut().cast::<T>() }
    }

    /// Destroys the content, leaving the value empty.
    pub fn reset(&mut self) {
        match core::mem::replace(&mut self.storage, Storage::Empty) {
            Storage::Empty => {}
            Storage::Inline { vtable, mut buffer } => unsafe {
                (vtable.drop_in_place)(buffer.as_mut_ptr());
            },
            Storage::Heap { vtable, ptr } => unsafe {
                (vtable.drop_in_place)(ptr.as_ptr());
                deallocate(ptr, vtable.layout);
            },
        }
    }

    /// Exchanges the contents of two values.
    pub fn swap(&mut self, other: &mut UValue) {
        core::mem::swap(&mut self.storage, &mut other.storage);
    }

    /// Returns `true` unless the value is empty.
    pub fn is_valid(&self) -> bool {
        !matches!(self.storage, Storage::Empty)
    }

    /// Returns `true` if the value is empty.
    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    pub(crate) fn vtable(&self) -> Option<&'static ValueVTable> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Inline { vtable, .. } | Storage::Heap { vtable, .. } => Some(vtable),
        }
    }

    /// Name of the held type.
    pub fn type_name(&self) -> Option<&'static str> {
        self.vtable().map(|vtable| (vtable.type_name)())
    }

    /// Descriptor of the held type in `registry`.
    pub fn get_type(&self, registry: &TypeRegistry) -> Option<AnyType> {
        self.vtable().map(|vtable| (vtable.resolve)(registry))
    }

    /// Returns `true` if the held value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.vtable()
            .is_some_and(|vtable| (vtable.native_id)() == core::any::TypeId::of::<T>())
    }

    /// Address of the held value, null when empty.
    pub fn data(&self) -> *const u8 {
        match &self.storage {
            Storage::Empty => core::ptr::null(),
            Storage::Inline { buffer, .. } => buffer.as_ptr(),
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Mutable address of the held value, null when empty.
    pub fn data_mut(&mut self) -> *mut u8 {
        match &mut self.storage {
            Storage::Empty => core::ptr::null_mut(),
            Storage::Inline { buffer, .. } => buffer.as_mut_ptr(),
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Borrows the held `T`.
    pub fn get_as<T: 'static>(&self) -> Result<&T> {
        self.try_get_as().ok_or(Error::BadUValueAccess)
    }

    /// Mutably borrows the held `T`.
    pub fn get_as_mut<T: 'static>(&mut self) -> Result<&mut T> {
        self.try_get_as_mut().ok_or(Error::BadUValueAccess)
    }

    /// Borrows the held `T`, or returns `None`.
    pub fn try_get_as<T: 'static>(&self) -> Option<&T> {
        self.is::<T>()
            .then(|| unsafe { &*self.data().cast::<T>() })
    }

    /// Mutably borrows the held `T`, or returns `None`.
    pub fn try_get_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.is::<T>() {
            Some(unsafe { &mut *self.data_mut().cast::<T>() })
        } else {
            None
        }
    }

    /// Moves the held `T` out, or gives the value back unchanged.
    pub fn into_inner<T: 'static>(mut self) -> Result<T, UValue> {
        if !self.is::<T>() {
            return Err(self);
        }
        match core::mem::replace(&mut self.storage, Storage::Empty) {
            Storage::Empty => unreachable!("checked above"),
            Storage::Inline { buffer, .. } => Ok(unsafe { buffer.as_ptr().cast::<T>().read() }),
            Storage::Heap { vtable, ptr } => {
                let value = unsafe { ptr.as_ptr().cast::<T>().read() };
                unsafe { deallocate(ptr, vtable.layout) };
                Ok(value)
            }
        }
    }

    fn ops(&self) -> Result<&'static ValueOps> {
        self.vtable()
            .map(|vtable| &vtable.ops)
            .ok_or(Error::BadUValueAccess)
    }

    /// Copies out what a pointer-like held value points to.
    ///
    /// Only owning or `'static` indirections qualify (`Arc<T>`,
    /// `&'static T`, types registered with `Deref`). Raw pointers and
    /// [`crate::RefWrapper`]s report [`Error::UnsupportedOperation`]; see
    /// [`Self::deref_unchecked`].
    pub fn deref_value(&self) -> Result<UValue> {
        let deref = self.ops()?.deref.ok_or(Error::unsupported("deref"))?;
        unsafe { deref(self.data()) }
    }

    /// Like [`Self::deref_value`], also reading through raw pointers and
    /// reference wrappers. A null pointer is [`Error::BadUValueAccess`].
    ///
    /// # Safety
    ///
    /// A held pointer or wrapper must point to a live value that nothing
    /// mutates during the call, e.g. a variable behind a lock must not be
    /// written concurrently.
    pub unsafe fn deref_unchecked(&self) -> Result<UValue> {
        let ops = self.ops()?;
        let deref = ops
            .deref
            .or(ops.deref_alias)
            .ok_or(Error::unsupported("deref"))?;
        unsafe { deref(self.data()) }
    }

    /// Copies out the element at `index` of an array-like held value.
    pub fn index_value(&self, index: usize) -> Result<UValue> {
        let op = self.ops()?.index.ok_or(Error::unsupported("index"))?;
        unsafe { op(self.data(), index) }
    }

    /// Equality. Empty values equal each other; values of different types
    /// are never equal.
    pub fn try_eq(&self, other: &UValue) -> Result<bool> {
        match (self.vtable(), other.vtable()) {
            (None, None) => Ok(true),
            (None, Some(_)) | (Some(_), None) => Ok(false),
            (Some(left), Some(right)) => {
                if (left.native_id)() != (right.native_id)() {
                    return Ok(false);
                }
                let eq = left.ops.partial_eq.ok_or(Error::unsupported("eq"))?;
                Ok(unsafe { eq(self.data(), other.data()) })
            }
        }
    }

    /// Ordering. The empty value orders first; values of different types
    /// are unordered.
    pub fn try_partial_cmp(&self, other: &UValue) -> Result<Option<Ordering>> {
        match (self.vtable(), other.vtable()) {
            (None, None) => Ok(Some(Ordering::Equal)),
            (None, Some(_)) => Ok(Some(Ordering::Less)),
            (Some(_), None) => Ok(Some(Ordering::Greater)),
            (Some(left), Some(right)) => {
                if (left.native_id)() != (right.native_id)() {
                    return Ok(None);
                }
                let cmp = left.ops.partial_cmp.ok_or(Error::unsupported("ord"))?;
                Ok(unsafe { cmp(self.data(), other.data()) })
            }
        }
    }

    /// Stream out: the held value's `Display` output.
    pub fn to_display_string(&self) -> Result<String> {
        let display = self.ops()?.display.ok_or(Error::unsupported("display"))?;
        let data = self.data();
        Ok(FmtWith(|f| unsafe { display(data, f) }).to_string())
    }

    /// Stream in: parses `text` and assigns it over the held value.
    pub fn parse_from(&mut self, text: &str) -> Result<()> {
        let vtable = self.vtable().ok_or(Error::BadUValueAccess)?;
        let parse = vtable.ops.parse.ok_or(Error::unsupported("parse"))?;
        if unsafe { parse(text, self.data_mut()) } {
            Ok(())
        } else {
            Err(Error::ParseFailed {
                type_name: (vtable.type_name)(),
            })
        }
    }
}

struct FmtWith<F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result>(F);

impl<F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result> fmt::Display for FmtWith<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(f)
    }
}

impl Drop for UValue {
    fn drop(&mut self) {
        self.reset();
    }
}

impl Default for UValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for UValue {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Empty => Storage::Empty,
            Storage::Inline { vtable, buffer } => {
                let mut copy = InlineBuffer::uninit();
                unsafe { (vtable.clone_into)(buffer.as_ptr(), copy.as_mut_ptr()) };
                Storage::Inline {
                    vtable,
                    buffer: copy,
                }
            }
            Storage::Heap { vtable, ptr } => {
                let copy = allocate(vtable.layout);
                unsafe { (vtable.clone_into)(ptr.as_ptr(), copy.as_ptr()) };
                Storage::Heap { vtable, ptr: copy }
            }
        };
        UValue { storage }
    }
}

impl PartialEq for UValue {
    fn eq(&self, other: &Self) -> bool {
        self.try_eq(other).unwrap_or(false)
    }
}

impl PartialOrd for UValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_partial_cmp(other).ok().flatten()
    }
}

impl fmt::Debug for UValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vtable() {
            None => f.write_str("UValue(empty)"),
            Some(vtable) => match vtable.ops.debug {
                Some(debug) => {
                    f.write_str("UValue(")?;
                    unsafe { debug(self.data(), f)? };
                    f.write_str(")")
                }
                None => write!(f, "UValue(⟨{}⟩)", (vtable.type_name)()),
            },
        }
    }
}

impl fmt::Display for UValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vtable() {
            None => Ok(()),
            Some(vtable) => match vtable.ops.display {
                Some(display) => unsafe { display(self.data(), f) },
                None => write!(f, "⟨{}⟩", (vtable.type_name)()),
            },
        }
    }
}

impl<T: Reflect + Clone> From<T> for UValue {
    fn from(value: T) -> Self {
        UValue::new(value)
    }
}

/// An immutable [`UValue`] that may be shared across threads.
///
/// Only constructible from `Send + Sync` values, and only readable through
/// `&UValue`, which makes the `Send`/`Sync` implementations sound.
#[derive(Clone, Debug, Default)]
pub struct SharedValue(UValue);

// SAFETY: the inner value was built from a `Send + Sync` type and is never
// handed out mutably.
unsafe impl Send for SharedValue {}
unsafe impl Sync for SharedValue {}

impl SharedValue {
    /// Wraps `value`.
    pub fn new<T: Reflect + Clone + Send + Sync>(value: T) -> Self {
        SharedValue(UValue::new(value))
    }

    /// Borrows the value.
    pub fn get(&self) -> &UValue {
        &self.0
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
