//! In-memory storage backend.
//!
//! A thread-safe tree of groups implementing [`Group`]. It is intended for
//! embedded usage, tests, and as a reference implementation of the
//! backing-store contract. The whole tree can be exported to and restored
//! from JSON for fixtures and debugging.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::traits::{Group, StorageError};
use crate::value::AttrValue;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key == "." || key == ".." || key.contains('/') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn child_path(parent: &str, key: &str) -> String {
    if parent == "/" {
        format!("/{key}")
    } else {
        format!("{parent}/{key}")
    }
}

type SharedGroup = Arc<RwLock<GroupData>>;

#[derive(Debug, Default)]
struct GroupData {
    attrs: BTreeMap<String, AttrValue>,
    children: BTreeMap<String, SharedGroup>,
}

/// Handle to a group in an [`InMemoryStore`].
#[derive(Clone)]
pub struct InMemoryGroup {
    key: String,
    path: String,
    data: SharedGroup,
}

impl InMemoryGroup {
    fn root() -> Self {
        Self {
            key: String::new(),
            path: "/".to_string(),
            data: SharedGroup::default(),
        }
    }

    fn child(&self, key: &str, data: SharedGroup) -> Self {
        Self {
            key: key.to_string(),
            path: child_path(&self.path, key),
            data,
        }
    }

    /// Returns true if both handles refer to the same node.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Names of all attributes on this node.
    pub fn attr_names(&self) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().map_err(|_| lock_err("group.attr_names"))?;
        Ok(data.attrs.keys().cloned().collect())
    }

    /// Captures this node and everything below it.
    pub fn snapshot(&self) -> Result<GroupSnapshot, StorageError> {
        snapshot_of(&self.data)
    }
}

impl fmt::Debug for InMemoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryGroup")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Group for InMemoryGroup {
    fn key(&self) -> &str {
        &self.key
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn create_group(&self, key: &str) -> Result<Self, StorageError> {
        check_key(key)?;
        let mut data = self.data.write().map_err(|_| lock_err("group.create"))?;
        if data.children.contains_key(key) {
            return Err(StorageError::DuplicateName {
                parent: self.path.clone(),
                name: key.to_string(),
            });
        }
        let child = SharedGroup::default();
        data.children.insert(key.to_string(), Arc::clone(&child));
        drop(data);

        let group = self.child(key, child);
        debug!(path = %group.path, "created group");
        Ok(group)
    }

    fn require_group(&self, key: &str) -> Result<Self, StorageError> {
        check_key(key)?;
        let mut data = self.data.write().map_err(|_| lock_err("group.require"))?;
        let child = Arc::clone(data.children.entry(key.to_string()).or_default());
        drop(data);
        Ok(self.child(key, child))
    }

    fn open_group(&self, key: &str) -> Result<Option<Self>, StorageError> {
        check_key(key)?;
        let data = self.data.read().map_err(|_| lock_err("group.open"))?;
        Ok(data
            .children
            .get(key)
            .map(|child| self.child(key, Arc::clone(child))))
    }

    fn delete_group(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().map_err(|_| lock_err("group.delete"))?;
        if data.children.remove(key).is_none() {
            return Err(StorageError::GroupNotFound {
                parent: self.path.clone(),
                name: key.to_string(),
            });
        }
        debug!(path = %child_path(&self.path, key), "deleted group");
        Ok(())
    }

    fn group_keys(&self) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().map_err(|_| lock_err("group.keys"))?;
        Ok(data.children.keys().cloned().collect())
    }

    fn get_attr(&self, name: &str) -> Result<Option<AttrValue>, StorageError> {
        let data = self.data.read().map_err(|_| lock_err("attr.get"))?;
        Ok(data.attrs.get(name).cloned())
    }

    fn set_attr(&self, name: &str, value: AttrValue) -> Result<(), StorageError> {
        let mut data = self.data.write().map_err(|_| lock_err("attr.set"))?;
        data.attrs.insert(name.to_string(), value);
        Ok(())
    }

    fn remove_attr(&self, name: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().map_err(|_| lock_err("attr.remove"))?;
        data.attrs.remove(name);
        Ok(())
    }
}

/// Serializable image of a group subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, GroupSnapshot>,
}

fn snapshot_of(group: &SharedGroup) -> Result<GroupSnapshot, StorageError> {
    let data = group.read().map_err(|_| lock_err("snapshot"))?;
    let mut groups = BTreeMap::new();
    for (key, child) in &data.children {
        groups.insert(key.clone(), snapshot_of(child)?);
    }
    Ok(GroupSnapshot {
        attrs: data.attrs.clone(),
        groups,
    })
}

fn restore_into(group: &InMemoryGroup, snapshot: &GroupSnapshot) -> Result<(), StorageError> {
    for (name, value) in &snapshot.attrs {
        group.set_attr(name, value.clone())?;
    }
    for (key, child) in &snapshot.groups {
        let created = group.create_group(key)?;
        restore_into(&created, child)?;
    }
    Ok(())
}

/// An in-memory hierarchical store.
///
/// # Examples
///
/// ```
/// use nixid::storage::{Group, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let session = store.root().create_group("session").unwrap();
/// assert_eq!(session.path(), "/session");
/// assert!(store.root().create_group("session").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    root: InMemoryGroup,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: InMemoryGroup::root(),
        }
    }

    /// Handle to the root group.
    #[must_use]
    pub fn root(&self) -> InMemoryGroup {
        self.root.clone()
    }

    /// Builds a store from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the snapshot names a group with an unusable key.
    pub fn from_snapshot(snapshot: &GroupSnapshot) -> Result<Self, StorageError> {
        let store = Self::new();
        restore_into(&store.root, snapshot)?;
        Ok(store)
    }

    /// Exports the whole tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StorageError> {
        let snapshot = self.root.snapshot()?;
        serde_json::to_string_pretty(&snapshot).map_err(|e| StorageError::Backend(e.to_string()))
    }

    /// Restores a tree exported by [`InMemoryStore::to_json`].
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let snapshot: GroupSnapshot =
            serde_json::from_str(json).map_err(|e| StorageError::Backend(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }
}
