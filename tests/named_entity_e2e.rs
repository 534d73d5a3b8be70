//! End-to-end lifecycle tests for entities over the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;

use nixid::storage::{Group, InMemoryStore};
use nixid::{Entity, EntityConfig, HasIdentity, ManualClock, NamedEntity, NixError, StorageError};

fn clocked(seconds: i64) -> (Arc<ManualClock>, EntityConfig) {
    let clock = Arc::new(ManualClock::new(seconds));
    let config = EntityConfig::default().with_clock(clock.clone());
    (clock, config)
}

#[test]
fn segment_definition_scenario() {
    let store = InMemoryStore::new();
    let (clock, config) = clocked(1_700_000_000);

    let mut segment =
        NamedEntity::create_new_with(&store.root(), "segment1", "recording", &config).unwrap();
    let id = segment.id();
    let created = segment.created_at().unwrap();
    let stamped = segment.updated_at().unwrap();
    assert_eq!(created, stamped);

    clock.advance(30);
    segment.set_definition("first trial").unwrap();

    let node = store.root().open_group("segment1").unwrap().unwrap();
    let reopened = NamedEntity::open(node).unwrap();
    assert_eq!(reopened.name(), "segment1");
    assert_eq!(reopened.entity_type().unwrap(), "recording");
    assert_eq!(reopened.definition().unwrap().as_deref(), Some("first trial"));
    assert_eq!(reopened.id(), id);
    assert_eq!(reopened.created_at().unwrap(), created);
    // Definition writes re-stamp updated_at.
    assert_eq!(reopened.updated_at().unwrap().timestamp(), 1_700_000_030);
    assert!(reopened.updated_at().unwrap() > stamped);
}

#[test]
fn create_then_reconstruct_is_identical() {
    let store = InMemoryStore::new();
    let created = NamedEntity::create_new(&store.root(), "trial-7", "nix.block").unwrap();

    let node = store.root().open_group("trial-7").unwrap().unwrap();
    let reopened = NamedEntity::open(node).unwrap();

    assert_eq!(reopened.name(), created.name());
    assert_eq!(reopened.entity_type().unwrap(), created.entity_type().unwrap());
    assert_eq!(reopened.id(), created.id());
    assert_eq!(reopened.created_at().unwrap(), created.created_at().unwrap());
    assert_eq!(reopened.updated_at().unwrap(), created.updated_at().unwrap());
}

#[test]
fn id_is_stable_across_reconstruction() {
    let store = InMemoryStore::new();
    let created = NamedEntity::create_new(&store.root(), "stable", "t").unwrap();
    for _ in 0..10 {
        let again = NamedEntity::open_child(&store.root(), "stable").unwrap().unwrap();
        assert_eq!(again.id(), created.id());
    }
}

#[test]
fn duplicate_name_leaves_first_intact() {
    let store = InMemoryStore::new();
    let first = NamedEntity::create_new(&store.root(), "dup", "recording").unwrap();
    let before = store.root().snapshot().unwrap();

    let err = NamedEntity::create_new(&store.root(), "dup", "stimulus").unwrap_err();
    assert!(matches!(
        err,
        NixError::Storage(StorageError::DuplicateName { ref name, .. }) if name == "dup"
    ));
    assert_eq!(store.root().snapshot().unwrap(), before);

    let survivor = NamedEntity::open_child(&store.root(), "dup").unwrap().unwrap();
    assert_eq!(survivor.id(), first.id());
    assert_eq!(survivor.entity_type().unwrap(), "recording");
}

#[test]
fn same_name_under_different_parents() {
    let store = InMemoryStore::new();
    let a = NamedEntity::create_new(&store.root(), "a", "block").unwrap();
    let b = NamedEntity::create_new(&store.root(), "b", "block").unwrap();

    let under_a = NamedEntity::create_new(a.node(), "data", "array").unwrap();
    let under_b = NamedEntity::create_new(b.node(), "data", "array").unwrap();
    assert_ne!(under_a.id(), under_b.id());
    assert_eq!(under_a.node().path(), "/a/data");
    assert_eq!(under_b.node().path(), "/b/data");
}

#[test]
fn force_updated_at_reads_back_exactly() {
    let store = InMemoryStore::new();
    let (_, config) = clocked(1_000_000);
    let mut entity = NamedEntity::create_new_with(&store.root(), "n", "t", &config).unwrap();

    entity.force_updated_at(1_234_567_890).unwrap();
    let reopened = NamedEntity::open_child(&store.root(), "n").unwrap().unwrap();
    assert_eq!(reopened.updated_at().unwrap().timestamp(), 1_234_567_890);
    assert_eq!(reopened.created_at().unwrap().timestamp(), 1_000_000);
}

#[test]
fn failed_type_change_leaves_node_unchanged() {
    let store = InMemoryStore::new();
    let mut entity = NamedEntity::create_new(&store.root(), "n", "recording").unwrap();
    let before = entity.node().snapshot().unwrap();

    assert!(entity.set_type(None).unwrap_err().is_required_field());
    assert!(entity.set_type(Some("")).unwrap_err().is_required_field());
    assert_eq!(entity.node().snapshot().unwrap(), before);
}

#[test]
fn plain_entities_nest_under_named_ones() {
    let store = InMemoryStore::new();
    let block = NamedEntity::create_new(&store.root(), "block", "session").unwrap();

    let mut ids = HashSet::new();
    for _ in 0..5 {
        let child = Entity::create_new(block.node()).unwrap();
        assert!(ids.insert(child.id()));
    }
    assert_eq!(block.node().group_keys().unwrap().len(), 5);

    for id in ids {
        let child = Entity::open_child(block.node(), id).unwrap().unwrap();
        assert_eq!(child.id(), id);
    }
}

#[test]
fn named_entity_node_opens_as_plain_entity() {
    let store = InMemoryStore::new();
    let named = NamedEntity::create_new(&store.root(), "n", "t").unwrap();
    // A named entity's node is also a valid plain entity node.
    let plain = Entity::open(named.node().clone()).unwrap();
    assert_eq!(plain.id(), named.id());

    // The reverse does not hold.
    let plain = Entity::create_new(&store.root()).unwrap();
    assert!(NamedEntity::open(plain.node().clone()).unwrap_err().is_validation());
}

#[test]
fn store_survives_json_export() {
    let store = InMemoryStore::new();
    let mut entity = NamedEntity::create_new(&store.root(), "exported", "recording").unwrap();
    entity.set_definition("kept across export").unwrap();

    let restored = InMemoryStore::from_json(&store.to_json().unwrap()).unwrap();
    let reopened = NamedEntity::open_child(&restored.root(), "exported")
        .unwrap()
        .unwrap();
    assert_eq!(reopened.id(), entity.id());
    assert_eq!(
        reopened.definition().unwrap().as_deref(),
        Some("kept across export")
    );
    assert_eq!(reopened.updated_at().unwrap(), entity.updated_at().unwrap());
}
