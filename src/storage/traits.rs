//! Abstract backing-store contract.
//!
//! The identity layer never talks to a concrete container format. It needs
//! a tree of groups, each addressable by key under its parent, each
//! carrying flat scalar attributes. Anything that can provide that (an
//! HDF5 file, an in-memory tree, a remote object store) can back entities.

use std::fmt;

use thiserror::Error;

use crate::value::AttrValue;

/// Errors raised by a backing store.
///
/// The identity layer propagates these unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A child with this key already exists under the parent.
    #[error("Duplicate name '{name}' under '{parent}'")]
    DuplicateName {
        parent: String,
        name: String,
    },

    /// No child with this key exists under the parent.
    #[error("Group '{name}' not found under '{parent}'")]
    GroupNotFound {
        parent: String,
        name: String,
    },

    /// The key cannot address a child in this store.
    #[error("Invalid group key '{0}'")]
    InvalidKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// I/O failure in the backend.
    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// A node in a hierarchical backing store.
///
/// Handles are cheap to clone and refer to the same underlying node.
/// Implementations are not required to provide any locking beyond what
/// makes them memory-safe; the identity layer assumes a single writer.
pub trait Group: Clone + fmt::Debug {
    /// The key this node is stored under in its parent.
    fn key(&self) -> &str;

    /// Full path of this node from the store root, for diagnostics.
    fn path(&self) -> String;

    /// Creates a new child node under `key`.
    ///
    /// # Errors
    /// - `DuplicateName`: if `key` is already taken
    fn create_group(&self, key: &str) -> Result<Self, StorageError>;

    /// Opens the child under `key`, creating it if absent.
    fn require_group(&self, key: &str) -> Result<Self, StorageError>;

    /// Opens an existing child. Returns `Ok(None)` if absent.
    fn open_group(&self, key: &str) -> Result<Option<Self>, StorageError>;

    /// Removes a child and everything below it.
    ///
    /// # Errors
    /// - `GroupNotFound`: if there is no child under `key`
    fn delete_group(&self, key: &str) -> Result<(), StorageError>;

    /// Returns true if a child exists under `key`.
    fn has_group(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.open_group(key)?.is_some())
    }

    /// Keys of all children, in store order.
    fn group_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Reads an attribute. Returns `Ok(None)` if absent.
    fn get_attr(&self, name: &str) -> Result<Option<AttrValue>, StorageError>;

    /// Writes an attribute, replacing any previous value.
    fn set_attr(&self, name: &str, value: AttrValue) -> Result<(), StorageError>;

    /// Removes an attribute. Removing an absent attribute is not an error.
    fn remove_attr(&self, name: &str) -> Result<(), StorageError>;
}
