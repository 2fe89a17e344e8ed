use core::alloc::Layout;
use core::ptr::NonNull;

use crate::ClassType;

/// Allocates memory for `layout`.
///
/// For zero-sized layouts, returns an aligned dangling pointer without
/// allocating. Aborts through `handle_alloc_error` when out of memory.
pub(crate) fn allocate(layout: Layout) -> NonNull<u8> {
    if layout.size() == 0 {
        // same trick as Box<ZST>: aligned, never dereferenced
        return NonNull::new(core::ptr::without_provenance_mut(layout.align()))
            .unwrap_or(NonNull::dangling());
    }
    let ptr = unsafe { alloc::alloc::alloc(layout) };
    match NonNull::new(ptr) {
        Some(ptr) => ptr,
        None => alloc::alloc::handle_alloc_error(layout),
    }
}

/// Frees memory obtained from [`allocate`]. A no-op for zero-sized layouts.
///
/// # Safety
///
/// `ptr` must come from [`allocate`] with the same layout and must not have
/// been freed already.
pub(crate) unsafe fn deallocate(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() != 0 {
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Aligned, uninitialized storage for placement construction.
///
/// The buffer only manages memory: whatever is constructed in it with
/// [`ClassType::create_at`] must be destroyed with
/// [`ClassType::destroy_at`] before the buffer is dropped or reused.
pub struct MemoryBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl MemoryBuffer {
    /// Allocates `size` bytes aligned to `align`.
    ///
    /// Returns `None` when `align` is not a power of two or the rounded size
    /// overflows.
    pub fn new(size: usize, align: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, align).ok()?;
        Some(MemoryBuffer {
            ptr: allocate(layout),
            layout,
        })
    }

    /// Storage fitting an instance of `class`.
    pub fn for_class(class: ClassType) -> Self {
        let layout = class.as_any().layout();
        MemoryBuffer {
            ptr: allocate(layout),
            layout,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Alignment in bytes.
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Start of the storage.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Start of the storage, for writing.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for MemoryBuffer {
    fn drop(&mut self) {
        unsafe { deallocate(self.ptr, self.layout) }
    }
}

impl core::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryBuffer")
            .field("ptr", &self.ptr)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}
