//! # nixid - Entity identity for hierarchical data stores
//!
//! nixid is the identity and metadata layer for objects persisted in a
//! tree of attribute-bearing groups, such as an HDF5 container. It mints,
//! validates and stamps the attributes that keep such a store
//! self-describing.
//!
//! ## Core Concepts
//!
//! - **Entity**: a node carrying a unique `entity_id` plus `created_at` and
//!   `updated_at` timestamps
//! - **NamedEntity**: an entity stored under a unique name within its parent,
//!   with a required type tag and an optional definition
//! - **Group**: the backing-store contract entities are bound to
//!
//! ## Usage
//!
//! ```rust
//! use nixid::{HasIdentity, NamedEntity};
//! use nixid::storage::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! let mut segment = NamedEntity::create_new(&store.root(), "segment1", "recording")?;
//! segment.set_definition("first trial")?;
//!
//! let node = segment.node().clone();
//! let reopened = NamedEntity::open(node)?;
//! assert_eq!(reopened.id(), segment.id());
//! assert_eq!(reopened.name(), "segment1");
//! # Ok::<(), nixid::NixError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod entity;
pub mod error;
pub mod storage;
pub mod time;
pub mod validation;
pub mod value;

// Re-export primary types at crate root for convenience
pub use config::EntityConfig;
pub use entity::{Entity, EntityId, HasIdentity, IdMinter, NamedEntity, UuidMinter};
pub use error::{NixError, NixResult, ValidationError};
pub use storage::{Group, InMemoryGroup, InMemoryStore, StorageError};
pub use time::{Clock, ManualClock, SystemClock};
pub use value::AttrValue;
