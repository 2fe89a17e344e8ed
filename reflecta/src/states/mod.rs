//! Registered entities.
//!
//! Each entity is compiled once into an immutable state: its index, its
//! metadata, and closures performing the erased operations. Handles are
//! cheap, reference counted views over a state; an empty handle stands for
//! "not found" and orders before every other handle.

use smallvec::SmallVec;

use crate::policy::ArgumentInfo;
use crate::{AnyType, ArgSource, ArgumentIndex, RegistrationError, TypeRegistry, UArgBase};
use crate::uarg::{check_arguments, source_bases};

mod argument;
pub use argument::*;

mod constructor;
pub use constructor::*;

mod destructor;
pub use destructor::*;

mod evalue;
pub use evalue::*;

mod function;
pub use function::*;

mod member;
pub use member::*;

mod method;
pub use method::*;

mod scope;
pub use scope::*;

mod variable;
pub use variable::*;

/// Declares a handle over `Option<Arc<$state>>`.
macro_rules! handle {
    ($(#[$meta:meta])* $handle:ident, $state:ident, $index:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $handle {
            state: Option<alloc::sync::Arc<$state>>,
        }

        impl $handle {
            pub(crate) fn from_state(state: $state) -> Self {
                $handle {
                    state: Some(alloc::sync::Arc::new(state)),
                }
            }

            /// Returns `true` unless this is the empty "not found" handle.
            pub fn is_valid(&self) -> bool {
                self.state.is_some()
            }

            /// The index, or `None` for an empty handle.
            pub fn try_index(&self) -> Option<&$crate::$index> {
                self.state.as_deref().map(|state| &state.index)
            }

            /// The index.
            ///
            /// # Panics
            ///
            /// Panics on an empty handle.
            pub fn get_index(&self) -> &$crate::$index {
                &self.state().index
            }

            /// The metadata attached at registration; empty for an empty
            /// handle.
            pub fn get_metadata(&self) -> &$crate::Metadata {
                match self.state.as_deref() {
                    Some(state) => &state.metadata,
                    None => &$crate::metadata::EMPTY_METADATA,
                }
            }

            fn state(&self) -> &$state {
                match self.state.as_deref() {
                    Some(state) => state,
                    None => panic!(concat!("use of an empty ", stringify!($handle), " handle")),
                }
            }
        }

        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                self.try_index() == other.try_index()
            }
        }

        impl Eq for $handle {}

        impl PartialOrd for $handle {
            fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $handle {
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                self.try_index().cmp(&other.try_index())
            }
        }

        impl core::hash::Hash for $handle {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.try_index().hash(state);
            }
        }

        impl core::fmt::Debug for $handle {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self.try_index() {
                    Some(index) => core::fmt::Debug::fmt(index, f),
                    None => f.write_str(concat!(stringify!($handle), "(empty)")),
                }
            }
        }
    };
}
pub(crate) use handle;

/// Builds the argument handles of an entity with parameters `types`.
pub(crate) fn make_arguments(
    types: &[AnyType],
    infos: Vec<ArgumentInfo>,
) -> Result<Vec<Argument>, RegistrationError> {
    if infos.len() > types.len() {
        return Err(RegistrationError::TooManyArgumentNames {
            provided: infos.len(),
            arity: types.len(),
        });
    }

    let mut infos = infos.into_iter();
    Ok(types
        .iter()
        .enumerate()
        .map(|(position, &ty)| {
            let info = infos.next().unwrap_or_default();
            Argument::new(ArgumentIndex::new(ty, position), info.name, info.metadata)
        })
        .collect())
}

/// Runs the argument check of an entity over live sources.
pub(crate) fn check_sources(
    params: &[AnyType],
    sources: &[ArgSource<'_>],
    registry: &TypeRegistry,
) -> crate::Result<()> {
    let bases: SmallVec<[UArgBase; 4]> = source_bases(sources, registry);
    check_arguments(params, &bases)
}

