#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod error;
pub use error::*;

mod typeid;
pub use typeid::*;

mod flags;
pub use flags::*;

mod types;
pub use types::*;

mod registry;
pub use registry::*;

mod ops;
pub use ops::*;

mod impls;
pub use impls::*;

mod uvalue;
pub use uvalue::*;

mod memory;
pub use memory::*;

mod cast;

mod uarg;
pub use uarg::*;

mod uinst;
pub use uinst::*;

mod policy;
pub use policy::*;

mod metadata;
pub use metadata::*;

mod index;
pub use index::*;

mod signature;
pub use signature::*;

mod states;
pub use states::*;

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use trace;

#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use debug;
