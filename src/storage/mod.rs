//! Backing-store contract and the in-memory reference backend.
//!
//! Entities are bound to nodes of any store implementing [`Group`].

pub mod memory;
mod traits;

pub use memory::{GroupSnapshot, InMemoryGroup, InMemoryStore};
pub use traits::{Group, StorageError};
