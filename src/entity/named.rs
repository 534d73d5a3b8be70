//! Named entities: identity plus a stable name, a type tag and an optional
//! definition.

use std::fmt;

use tracing::debug;

use super::{
    clock_stamp, create_child, stamp_created, HasIdentity, ATTR_DEFINITION, ATTR_ENTITY_ID,
    ATTR_NAME, ATTR_TYPE, ATTR_UPDATED_AT,
};
use crate::config::EntityConfig;
use crate::entity::EntityId;
use crate::error::{NixError, NixResult};
use crate::storage::{Group, StorageError};
use crate::validation::{check_name_and_type, check_type, require_str, validate_named_attrs};
use crate::value::AttrValue;

/// An entity stored under a unique name within its parent.
///
/// The name is the node's key and never changes. The type tag is required
/// but may be reclassified. The definition is optional free text.
///
/// Every successful mutation through `set_type`, `set_definition` or
/// `clear_definition` re-stamps `updated_at` from the configured clock.
///
/// # Examples
///
/// ```
/// use nixid::{HasIdentity, NamedEntity};
/// use nixid::storage::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let mut block = NamedEntity::create_new(&store.root(), "segment1", "recording").unwrap();
/// block.set_definition("first trial").unwrap();
///
/// let reopened = NamedEntity::open_child(&store.root(), "segment1").unwrap().unwrap();
/// assert_eq!(reopened.entity_type().unwrap(), "recording");
/// assert_eq!(reopened.definition().unwrap().as_deref(), Some("first trial"));
/// assert_eq!(reopened.id(), block.id());
/// ```
#[derive(Debug)]
pub struct NamedEntity<G: Group> {
    node: G,
    id: EntityId,
    name: String,
    config: EntityConfig,
}

impl<G: Group> NamedEntity<G> {
    /// Wraps an existing node with the default configuration.
    ///
    /// # Errors
    /// - `Validation`: `name` or `type` is missing or malformed (checked
    ///   first), or `entity_id` is missing or malformed
    /// - `Storage`: the attributes could not be read
    pub fn open(node: G) -> NixResult<Self> {
        Self::open_with(node, &EntityConfig::default())
    }

    /// Wraps an existing node. Nothing is written.
    ///
    /// The stored name must equal the node's key. `max_name_length` only
    /// bounds creation, so a node written under a looser limit still opens.
    pub fn open_with(node: G, config: &EntityConfig) -> NixResult<Self> {
        config.check()?;
        let attrs = validate_named_attrs(
            node.key(),
            node.get_attr(ATTR_NAME)?.as_ref(),
            node.get_attr(ATTR_TYPE)?.as_ref(),
            node.get_attr(ATTR_ENTITY_ID)?.as_ref(),
        )?;
        Ok(Self {
            node,
            id: attrs.id,
            name: attrs.name,
            config: config.clone(),
        })
    }

    /// Looks up the child of `parent` named `name` and wraps it.
    ///
    /// Returns `Ok(None)` if there is no such child.
    pub fn open_child(parent: &G, name: &str) -> NixResult<Option<Self>> {
        Self::open_child_with(parent, name, &EntityConfig::default())
    }

    /// Like [`NamedEntity::open_child`], binding the wrapper to `config`.
    pub fn open_child_with(
        parent: &G,
        name: &str,
        config: &EntityConfig,
    ) -> NixResult<Option<Self>> {
        parent
            .open_group(name)?
            .map(|node| Self::open_with(node, config))
            .transpose()
    }

    /// Creates a new named entity under `parent` with the default configuration.
    pub fn create_new(parent: &G, name: &str, entity_type: &str) -> NixResult<Self> {
        Self::create_new_with(parent, name, entity_type, &EntityConfig::default())
    }

    /// Creates a new named entity under `parent`.
    ///
    /// `name` and `entity_type` are checked before the store is touched.
    ///
    /// # Errors
    /// - `Validation`: `name` or `entity_type` is malformed, or the minted id is
    /// - `Storage(DuplicateName)`: a sibling already owns `name`
    pub fn create_new_with(
        parent: &G,
        name: &str,
        entity_type: &str,
        config: &EntityConfig,
    ) -> NixResult<Self> {
        config.check()?;
        check_name_and_type(name, entity_type, config.max_name_length)?;

        let entity = create_child(parent, name, |node| {
            node.set_attr(ATTR_NAME, AttrValue::from(name))?;
            node.set_attr(ATTR_TYPE, AttrValue::from(entity_type))?;
            node.set_attr(ATTR_ENTITY_ID, AttrValue::Str(config.minter.mint()))?;
            let entity = Self::open_with(node, config)?;
            stamp_created(&entity.node, config)?;
            Ok(entity)
        })?;
        debug!(
            path = %entity.node.path(),
            id = %entity.id,
            entity_type,
            "created named entity"
        );
        Ok(entity)
    }

    /// The entity's name, equal to its key under the parent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored type tag.
    ///
    /// # Errors
    /// - `Validation`: the attribute was removed or overwritten with a
    ///   non-string behind this wrapper's back
    pub fn entity_type(&self) -> NixResult<String> {
        let value = self.node.get_attr(ATTR_TYPE)?;
        Ok(require_str(ATTR_TYPE, value.as_ref())?.to_string())
    }

    /// Reclassifies the entity.
    ///
    /// # Errors
    /// - `RequiredField`: `entity_type` is `None` or blank; nothing is written
    /// - `Validation`: `entity_type` is too long, or the clock reading cannot
    ///   be stored; nothing is written
    pub fn set_type(&mut self, entity_type: Option<&str>) -> NixResult<()> {
        let entity_type = match entity_type {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(NixError::required_field(ATTR_TYPE)),
        };
        check_type(entity_type)?;
        self.write_stamped(|node| node.set_attr(ATTR_TYPE, AttrValue::from(entity_type)))
    }

    /// The stored definition, or `None` if it was never set.
    ///
    /// An empty string is a set definition and is returned as `Some("")`.
    pub fn definition(&self) -> NixResult<Option<String>> {
        match self.node.get_attr(ATTR_DEFINITION)? {
            None => Ok(None),
            value => Ok(Some(require_str(ATTR_DEFINITION, value.as_ref())?.to_string())),
        }
    }

    /// Sets the definition. Any string is accepted, including an empty one.
    pub fn set_definition(&mut self, definition: &str) -> NixResult<()> {
        self.write_stamped(|node| node.set_attr(ATTR_DEFINITION, AttrValue::from(definition)))
    }

    /// Removes the definition, returning it to the unset state.
    pub fn clear_definition(&mut self) -> NixResult<()> {
        self.write_stamped(|node| node.remove_attr(ATTR_DEFINITION))
    }

    /// Applies `write` and re-stamps `updated_at`. The clock is read and
    /// formatted first, so an unstorable reading leaves the node unchanged.
    fn write_stamped(
        &self,
        write: impl FnOnce(&G) -> Result<(), StorageError>,
    ) -> NixResult<()> {
        let stamp = clock_stamp(&self.config)?;
        write(&self.node)?;
        self.node.set_attr(ATTR_UPDATED_AT, stamp)?;
        Ok(())
    }
}

impl<G: Group> HasIdentity for NamedEntity<G> {
    type Node = G;

    fn node(&self) -> &G {
        &self.node
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn config(&self) -> &EntityConfig {
        &self.config
    }
}

impl<G: Group> PartialEq for NamedEntity<G> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<G: Group> Eq for NamedEntity<G> {}

impl<G: Group> fmt::Display for NamedEntity<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity_type = self
            .entity_type()
            .unwrap_or_else(|_| "<unreadable>".to_string());
        write!(
            f,
            "NamedEntity: {{name = {}, type = {}, id = {}}}",
            self.name, entity_type, self.id
        )
    }
}
