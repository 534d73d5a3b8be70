//! The minimal identifiable persisted object.
//!
//! Without a stable id and timestamps on every node, higher-level objects
//! cannot be linked or audited, and a container stops being
//! self-describing.

use std::fmt;

use tracing::debug;

use super::{create_child, stamp_created, HasIdentity, ATTR_ENTITY_ID};
use crate::config::EntityConfig;
use crate::entity::EntityId;
use crate::error::NixResult;
use crate::storage::Group;
use crate::validation::validate_entity_attrs;
use crate::value::AttrValue;

/// An identifiable object bound to one backing-store node.
///
/// The child node is keyed by the entity's own id.
///
/// # Examples
///
/// ```
/// use nixid::{Entity, HasIdentity};
/// use nixid::storage::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let entity = Entity::create_new(&store.root()).unwrap();
/// assert_eq!(entity.created_at().unwrap(), entity.updated_at().unwrap());
///
/// let reopened = Entity::open_child(&store.root(), entity.id()).unwrap().unwrap();
/// assert_eq!(reopened.id(), entity.id());
/// ```
#[derive(Debug)]
pub struct Entity<G: Group> {
    node: G,
    id: EntityId,
    config: EntityConfig,
}

impl<G: Group> Entity<G> {
    /// Wraps an existing node with the default configuration.
    ///
    /// # Errors
    /// - `Validation`: `entity_id` is missing, not a string, or malformed
    /// - `Storage`: the attribute could not be read
    pub fn open(node: G) -> NixResult<Self> {
        Self::open_with(node, &EntityConfig::default())
    }

    /// Wraps an existing node. Nothing is written.
    pub fn open_with(node: G, config: &EntityConfig) -> NixResult<Self> {
        config.check()?;
        let attrs = validate_entity_attrs(node.get_attr(ATTR_ENTITY_ID)?.as_ref())?;
        Ok(Self {
            node,
            id: attrs.id,
            config: config.clone(),
        })
    }

    /// Looks up the child of `parent` keyed by `id` and wraps it.
    ///
    /// Returns `Ok(None)` if there is no such child.
    pub fn open_child(parent: &G, id: EntityId) -> NixResult<Option<Self>> {
        Self::open_child_with(parent, id, &EntityConfig::default())
    }

    /// Like [`Entity::open_child`], binding the wrapper to `config`.
    pub fn open_child_with(
        parent: &G,
        id: EntityId,
        config: &EntityConfig,
    ) -> NixResult<Option<Self>> {
        parent
            .open_group(&id.to_string())?
            .map(|node| Self::open_with(node, config))
            .transpose()
    }

    /// Creates a new entity under `parent` with the default configuration.
    pub fn create_new(parent: &G) -> NixResult<Self> {
        Self::create_new_with(parent, &EntityConfig::default())
    }

    /// Creates a new entity under `parent`.
    ///
    /// Mints an id, creates a child keyed by it, writes `entity_id`,
    /// re-validates through [`Entity::open_with`] and stamps both timestamps
    /// from one clock reading. On failure after the child exists, the child
    /// is removed.
    ///
    /// # Errors
    /// - `Storage`: the child could not be created or written
    /// - `Validation`: `config` is unusable, or the minted id is malformed
    pub fn create_new_with(parent: &G, config: &EntityConfig) -> NixResult<Self> {
        config.check()?;
        let id = config.minter.mint();
        let entity = create_child(parent, &id, |node| {
            node.set_attr(ATTR_ENTITY_ID, AttrValue::Str(id.clone()))?;
            let entity = Self::open_with(node, config)?;
            stamp_created(&entity.node, config)?;
            Ok(entity)
        })?;
        debug!(path = %entity.node.path(), id = %entity.id, "created entity");
        Ok(entity)
    }
}

impl<G: Group> HasIdentity for Entity<G> {
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

impl<G: Group> PartialEq for Entity<G> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<G: Group> Eq for Entity<G> {}

impl<G: Group> fmt::Display for Entity<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity: {{id = {}}}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::entity::{IdMinter, ATTR_CREATED_AT, ATTR_UPDATED_AT};
    use crate::error::ValidationError;
    use crate::storage::{InMemoryGroup, InMemoryStore};
    use crate::time::ManualClock;

    #[derive(Debug)]
    struct FixedMinter(&'static str);

    impl IdMinter for FixedMinter {
        fn mint(&self) -> String {
            self.0.to_string()
        }
    }

    fn clocked(seconds: i64) -> (Arc<ManualClock>, EntityConfig) {
        let clock = Arc::new(ManualClock::new(seconds));
        let config = EntityConfig::default().with_clock(clock.clone());
        (clock, config)
    }

    #[test]
    fn test_create_new_stamps_everything() {
        let store = InMemoryStore::new();
        let (_, config) = clocked(1_700_000_000);
        let entity = Entity::create_new_with(&store.root(), &config).unwrap();

        assert_eq!(entity.node().key(), entity.id().to_string());
        assert_eq!(
            entity.node().get_attr(ATTR_ENTITY_ID).unwrap(),
            Some(AttrValue::Str(entity.id().to_string()))
        );
        assert_eq!(entity.created_at().unwrap().timestamp(), 1_700_000_000);
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_created_equals_updated_with_system_clock() {
        let store = InMemoryStore::new();
        let entity = Entity::create_new(&store.root()).unwrap();
        assert_eq!(entity.created_at().unwrap(), entity.updated_at().unwrap());
    }

    #[test]
    fn test_open_round_trip() {
        let store = InMemoryStore::new();
        let entity = Entity::create_new(&store.root()).unwrap();
        let node = store.root().open_group(entity.node().key()).unwrap().unwrap();
        let reopened = Entity::open(node).unwrap();
        assert_eq!(reopened.id(), entity.id());
        assert_eq!(reopened.created_at().unwrap(), entity.created_at().unwrap());
        assert_eq!(reopened, entity);
    }

    #[test]
    fn test_open_missing_id_fails() {
        let store = InMemoryStore::new();
        let node = store.root().create_group("bare").unwrap();
        let err = Entity::open(node).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_open_malformed_id_fails() {
        let store = InMemoryStore::new();
        let node = store.root().create_group("bad").unwrap();
        node.set_attr(ATTR_ENTITY_ID, AttrValue::from("12345")).unwrap();
        assert!(Entity::open(node.clone()).unwrap_err().is_validation());

        node.set_attr(ATTR_ENTITY_ID, AttrValue::Int(12345)).unwrap();
        assert!(Entity::open(node).unwrap_err().is_validation());
    }

    #[test]
    fn test_open_does_not_write() {
        let store = InMemoryStore::new();
        let node = store.root().create_group("n").unwrap();
        node.set_attr(ATTR_ENTITY_ID, AttrValue::Str(EntityId::new().to_string()))
            .unwrap();
        let before = node.snapshot().unwrap();
        let _entity = Entity::open(node.clone()).unwrap();
        assert_eq!(node.snapshot().unwrap(), before);
    }

    #[test]
    fn test_open_child_absent() {
        let store = InMemoryStore::new();
        let found = Entity::<InMemoryGroup>::open_child(&store.root(), EntityId::new()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_force_updated_at() {
        let store = InMemoryStore::new();
        let (_, config) = clocked(1_000);
        let mut entity = Entity::create_new_with(&store.root(), &config).unwrap();

        entity.force_updated_at(2_000).unwrap();
        assert_eq!(entity.updated_at().unwrap().timestamp(), 2_000);
        assert_eq!(entity.created_at().unwrap().timestamp(), 1_000);

        // No monotonicity check.
        entity.force_updated_at(10).unwrap();
        assert_eq!(entity.updated_at().unwrap().timestamp(), 10);
    }

    #[test]
    fn test_force_created_at() {
        let store = InMemoryStore::new();
        let (_, config) = clocked(1_000);
        let mut entity = Entity::create_new_with(&store.root(), &config).unwrap();
        entity.force_created_at(500).unwrap();
        assert_eq!(entity.created_at().unwrap().timestamp(), 500);
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_000);
    }

    #[test]
    fn test_force_from_requires_integer() {
        let store = InMemoryStore::new();
        let (_, config) = clocked(1_000);
        let mut entity = Entity::create_new_with(&store.root(), &config).unwrap();

        let err = entity
            .force_updated_at_from(&AttrValue::from("2000"))
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_000);

        entity.force_created_at_from(&AttrValue::Int(900)).unwrap();
        assert_eq!(entity.created_at().unwrap().timestamp(), 900);
    }

    #[test]
    fn test_force_out_of_range_leaves_value() {
        let store = InMemoryStore::new();
        let (_, config) = clocked(1_000);
        let mut entity = Entity::create_new_with(&store.root(), &config).unwrap();
        let err = entity.force_updated_at(i64::MAX).unwrap_err();
        assert!(matches!(
            err,
            crate::NixError::Validation(ValidationError::TimestampOutOfRange { .. })
        ));
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_000);
    }

    #[test]
    fn test_touch_reads_clock_each_time() {
        let store = InMemoryStore::new();
        let (clock, config) = clocked(1_000);
        let mut entity = Entity::create_new_with(&store.root(), &config).unwrap();

        clock.advance(60);
        entity.touch().unwrap();
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_060);

        clock.advance(60);
        entity.touch().unwrap();
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_120);
        assert_eq!(entity.created_at().unwrap().timestamp(), 1_000);
    }

    #[test]
    fn test_touch_with_unstorable_clock_keeps_stamp() {
        let store = InMemoryStore::new();
        let (clock, config) = clocked(1_000);
        let mut entity = Entity::create_new_with(&store.root(), &config).unwrap();

        clock.set(i64::MAX);
        assert!(entity.touch().unwrap_err().is_validation());
        assert_eq!(entity.updated_at().unwrap().timestamp(), 1_000);
    }

    #[test]
    fn test_unusable_config_rejected() {
        let store = InMemoryStore::new();
        let config = EntityConfig::default().with_max_name_length(0);
        let err = Entity::create_new_with(&store.root(), &config).unwrap_err();
        assert!(matches!(
            err,
            crate::NixError::Validation(ValidationError::InvalidConfig { .. })
        ));
        assert!(store.root().group_keys().unwrap().is_empty());

        let entity = Entity::create_new(&store.root()).unwrap();
        assert!(Entity::open_with(entity.node().clone(), &config).is_err());
    }

    #[test]
    fn test_open_child_with_keeps_config() {
        let store = InMemoryStore::new();
        let (clock, config) = clocked(1_000);
        let entity = Entity::create_new_with(&store.root(), &config).unwrap();

        let mut reopened = Entity::open_child_with(&store.root(), entity.id(), &config)
            .unwrap()
            .unwrap();
        clock.advance(5);
        reopened.touch().unwrap();
        assert_eq!(reopened.updated_at().unwrap().timestamp(), 1_005);
    }

    #[test]
    fn test_corrupt_timestamp_fails_loudly() {
        let store = InMemoryStore::new();
        let entity = Entity::create_new(&store.root()).unwrap();
        entity.node().set_attr(ATTR_CREATED_AT, AttrValue::from("last tuesday")).unwrap();
        assert!(entity.created_at().unwrap_err().is_format());

        entity.node().set_attr(ATTR_UPDATED_AT, AttrValue::Int(7)).unwrap();
        assert!(entity.updated_at().unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_bad_minter_rolls_back() {
        let store = InMemoryStore::new();
        let config = EntityConfig::default().with_minter(Arc::new(FixedMinter("not-a-uuid")));
        let err = Entity::create_new_with(&store.root(), &config).unwrap_err();
        assert!(err.is_validation());
        assert!(store.root().group_keys().unwrap().is_empty());
    }

    #[test]
    fn test_repeated_mint_collides_in_store() {
        let store = InMemoryStore::new();
        let config = EntityConfig::default().with_minter(Arc::new(FixedMinter(
            "6f9619ff-8b86-d011-b42d-00cf4fc964ff",
        )));
        let first = Entity::create_new_with(&store.root(), &config).unwrap();
        let err = Entity::create_new_with(&store.root(), &config).unwrap_err();
        assert!(err.is_duplicate_name());
        assert!(Entity::open_child(&store.root(), first.id()).unwrap().is_some());
    }

    #[test]
    fn test_ids_unique() {
        let store = InMemoryStore::new();
        let mut ids = HashSet::new();
        for _ in 0..200 {
            let entity = Entity::create_new(&store.root()).unwrap();
            assert!(ids.insert(entity.id()));
        }
    }

    #[test]
    fn test_display() {
        let store = InMemoryStore::new();
        let entity = Entity::create_new(&store.root()).unwrap();
        assert_eq!(entity.to_string(), format!("Entity: {{id = {}}}", entity.id()));
    }
}
