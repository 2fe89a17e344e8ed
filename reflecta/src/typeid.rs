use core::fmt;
use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use hashbrown::HashMap;
use parking_lot::RwLock;

/// Process-wide identity of a reflected type.
///
/// Identities are handed out lazily, the first time a type is asked for, from
/// a monotonically increasing counter. Two `TypeId`s are equal if and only if
/// they were produced for the same Rust type. Ordering reflects the order of
/// first request and nothing else; it is stable for the lifetime of the
/// process and must not be persisted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(NonZeroU32);

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

static IDENTITIES: LazyLock<RwLock<HashMap<core::any::TypeId, TypeId>>> =
    LazyLock::new(Default::default);

impl TypeId {
    /// Returns the identity of `T`, assigning one if `T` has none yet.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::for_native(core::any::TypeId::of::<T>())
    }

    pub(crate) fn for_native(native: core::any::TypeId) -> Self {
        if let Some(id) = IDENTITIES.read().get(&native) {
            return *id;
        }

        let mut identities = IDENTITIES.write();
        *identities.entry(native).or_insert_with(|| {
            let raw = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            TypeId(NonZeroU32::new(raw).expect("type identity space exhausted"))
        })
    }

    /// The raw counter value behind this identity.
    pub const fn as_u32(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId(#{})", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Local;

    #[test]
    fn identity_is_stable() {
        assert_eq!(TypeId::of::<Local>(), TypeId::of::<Local>());
        assert_eq!(TypeId::of::<[u8]>(), TypeId::of::<[u8]>());
    }

    #[test]
    fn distinct_types_get_distinct_ids() {
        let a = TypeId::of::<u8>();
        let b = TypeId::of::<i8>();
        let c = TypeId::of::<Local>();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn later_requests_get_larger_ids() {
        struct First;
        struct Second;
        let first = TypeId::of::<First>();
        let second = TypeId::of::<Second>();
        assert!(first < second);
    }
}
