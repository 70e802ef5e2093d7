//! Lazy cross-entity references
//!
//! Orders store their customer as an `nr` and their tags as keyword
//! uuids. After a bulk load the [`Resolver`] walks the orders once and
//! binds those keys to the live entities as non-owning handles.

pub mod keys;
pub mod resolver;
pub mod scalar;

pub use keys::LazyKeys;
pub use resolver::{ResolveStats, Resolver};
pub use scalar::{LazyRef, RefStatus};
