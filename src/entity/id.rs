//! Entity identifiers and the id-minting collaborator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Globally unique, stable entity identifier.
///
/// Persisted as the canonical lowercase hyphenated UUID string. Only that
/// exact form is accepted back, so an id always reads back byte-for-byte as
/// it was written.
///
/// # Examples
///
/// ```
/// use nixid::EntityId;
///
/// let id = EntityId::new();
/// let parsed: EntityId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Checks that `value` is a well-formed persisted id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEntityId` for anything other than a
    /// non-nil UUID in canonical lowercase hyphenated form.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidEntityId {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let uuid = Uuid::try_parse(value).map_err(|e| invalid(&e.to_string()))?;
        if uuid.is_nil() {
            return Err(invalid("nil id"));
        }
        // Uuid::try_parse also accepts simple, braced and urn forms and any case.
        if uuid.hyphenated().to_string() != value {
            return Err(invalid("not in canonical lowercase hyphenated form"));
        }
        Ok(Self(uuid))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Source of fresh entity ids.
///
/// Uniqueness across the lifetime of a store is this collaborator's
/// responsibility; the identity layer only checks format.
pub trait IdMinter: Send + Sync + fmt::Debug {
    /// Returns a new id string in persisted form.
    fn mint(&self) -> String;
}

/// Mints random version 4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidMinter;

impl IdMinter for UuidMinter {
    fn mint(&self) -> String {
        EntityId::new().to_string()
    }
}
