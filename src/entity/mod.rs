//! Entity identity layer.
//!
//! Every persisted object is bound to exactly one backing-store node and
//! carries an `entity_id`, a `created_at` and an `updated_at` attribute.
//! [`Entity`] is the minimal identifiable object; [`NamedEntity`] adds a
//! name (its key under the parent), a type tag and an optional definition.
//! Both share the [`HasIdentity`] accessors.
//!
//! Wrappers never own the node's lifecycle. Opening a wrapper only
//! validates; creating one allocates a node, stamps it, and removes it again
//! if any later step fails.

#[allow(clippy::module_inception)]
pub mod entity;
pub mod id;
pub mod named;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::EntityConfig;
use crate::error::{NixError, NixResult, ValidationError};
use crate::storage::Group;
use crate::time::{str_to_time, time_to_str};
use crate::value::AttrValue;

pub use entity::Entity;
pub use id::{EntityId, IdMinter, UuidMinter};
pub use named::NamedEntity;

/// Attribute holding the entity id.
pub const ATTR_ENTITY_ID: &str = "entity_id";
/// Attribute holding the creation timestamp.
pub const ATTR_CREATED_AT: &str = "created_at";
/// Attribute holding the last-modification timestamp.
pub const ATTR_UPDATED_AT: &str = "updated_at";
/// Attribute holding a named entity's name.
pub const ATTR_NAME: &str = "name";
/// Attribute holding a named entity's type tag.
pub const ATTR_TYPE: &str = "type";
/// Attribute holding a named entity's optional definition.
pub const ATTR_DEFINITION: &str = "definition";

/// Identity shared by every persisted object.
///
/// Implementors only expose their node, id and configuration; the timestamp
/// accessors and stamping operations are provided.
pub trait HasIdentity {
    /// Backing-store node type.
    type Node: Group;

    /// The node this object is bound to.
    fn node(&self) -> &Self::Node;

    /// The entity id, as validated when the wrapper was built.
    fn id(&self) -> EntityId;

    /// Configuration the wrapper was opened or created with.
    fn config(&self) -> &EntityConfig;

    /// Creation time.
    ///
    /// # Errors
    /// - `Format`: the stored string cannot be parsed
    /// - `TypeMismatch`: the stored attribute is not a string
    /// - `Validation`: the attribute is missing
    fn created_at(&self) -> NixResult<DateTime<Utc>> {
        read_timestamp(self.node(), ATTR_CREATED_AT)
    }

    /// Last modification time. Same failure modes as [`HasIdentity::created_at`].
    fn updated_at(&self) -> NixResult<DateTime<Utc>> {
        read_timestamp(self.node(), ATTR_UPDATED_AT)
    }

    /// Overwrites `created_at` with `seconds` since the epoch.
    ///
    /// No ordering check is made against `updated_at`. This exists for
    /// migration and repair tooling.
    fn force_created_at(&mut self, seconds: i64) -> NixResult<()> {
        write_timestamp(self.node(), ATTR_CREATED_AT, seconds)
    }

    /// Overwrites `updated_at` with `seconds` since the epoch.
    fn force_updated_at(&mut self, seconds: i64) -> NixResult<()> {
        write_timestamp(self.node(), ATTR_UPDATED_AT, seconds)
    }

    /// Like [`HasIdentity::force_created_at`], for dynamically typed input.
    ///
    /// # Errors
    /// - `TypeMismatch`: `value` is not an integer
    fn force_created_at_from(&mut self, value: &AttrValue) -> NixResult<()> {
        let seconds = require_int(ATTR_CREATED_AT, value)?;
        self.force_created_at(seconds)
    }

    /// Like [`HasIdentity::force_updated_at`], for dynamically typed input.
    fn force_updated_at_from(&mut self, value: &AttrValue) -> NixResult<()> {
        let seconds = require_int(ATTR_UPDATED_AT, value)?;
        self.force_updated_at(seconds)
    }

    /// Re-stamps `updated_at` with the configured clock.
    fn touch(&mut self) -> NixResult<()> {
        let stamp = clock_stamp(self.config())?;
        self.node().set_attr(ATTR_UPDATED_AT, stamp)?;
        Ok(())
    }
}

fn require_int(field: &str, value: &AttrValue) -> NixResult<i64> {
    value.as_int().ok_or_else(|| NixError::TypeMismatch {
        field: field.to_string(),
        expected: "integer",
        found: value.type_name(),
    })
}

fn read_timestamp<G: Group>(node: &G, field: &str) -> NixResult<DateTime<Utc>> {
    match node.get_attr(field)? {
        Some(AttrValue::Str(s)) => str_to_time(field, &s),
        Some(other) => Err(NixError::TypeMismatch {
            field: field.to_string(),
            expected: "string",
            found: other.type_name(),
        }),
        None => Err(ValidationError::MissingAttribute {
            field: field.to_string(),
        }
        .into()),
    }
}

fn write_timestamp<G: Group>(node: &G, field: &str, seconds: i64) -> NixResult<()> {
    let text = time_to_str(seconds)?;
    node.set_attr(field, AttrValue::Str(text))?;
    Ok(())
}

/// Reads the configured clock and formats it for storage.
///
/// Callers take the stamp before writing anything else, so a clock reading
/// outside the storable range fails with the node untouched.
fn clock_stamp(config: &EntityConfig) -> NixResult<AttrValue> {
    Ok(AttrValue::Str(time_to_str(config.clock.now())?))
}

/// Stamps both timestamps of a freshly created node from one clock reading.
fn stamp_created<G: Group>(node: &G, config: &EntityConfig) -> NixResult<()> {
    let stamp = clock_stamp(config)?;
    node.set_attr(ATTR_CREATED_AT, stamp.clone())?;
    node.set_attr(ATTR_UPDATED_AT, stamp)?;
    Ok(())
}

/// Creates `key` under `parent` and runs `build` on it.
///
/// If `build` fails the child is deleted again before the error is returned,
/// so readers never see a half-stamped node.
fn create_child<G, T>(
    parent: &G,
    key: &str,
    build: impl FnOnce(G) -> NixResult<T>,
) -> NixResult<T>
where
    G: Group,
{
    let node = parent.create_group(key)?;
    let path = node.path();
    build(node).map_err(|err| {
        match parent.delete_group(key) {
            Ok(()) => warn!(path = %path, error = %err, "rolled back partially created entity"),
            Err(cleanup) => warn!(
                path = %path,
                error = %err,
                cleanup_error = %cleanup,
                "failed to roll back partially created entity"
            ),
        }
        err
    })
}
