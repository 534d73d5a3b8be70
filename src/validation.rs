//! Attribute validation.
//!
//! Pure functions over raw attribute values as read from a node. Wrappers
//! call these first and are only constructed when they succeed, so a node
//! with missing or malformed identity never yields a usable object.

use crate::entity::{EntityId, ATTR_ENTITY_ID, ATTR_NAME, ATTR_TYPE};
use crate::error::ValidationError;
use crate::value::AttrValue;

/// Conservative upper bound for free-form tag fields such as `type`.
pub const MAX_TEXT_LEN: usize = 16 * 1024;

/// Result of validating raw attributes.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validated identity of a plain entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityAttrs {
    pub id: EntityId,
}

/// Validated identity of a named entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAttrs {
    pub id: EntityId,
    pub name: String,
}

/// Requires `value` to be a present string attribute.
pub fn require_str<'a>(field: &str, value: Option<&'a AttrValue>) -> ValidationResult<&'a str> {
    match value {
        None => Err(ValidationError::MissingAttribute {
            field: field.to_string(),
        }),
        Some(AttrValue::Str(s)) => Ok(s.as_str()),
        Some(other) => Err(ValidationError::WrongAttributeType {
            field: field.to_string(),
            expected: "string",
            found: other.type_name(),
        }),
    }
}

/// Checks a stored `entity_id` attribute.
pub fn check_entity_id(value: Option<&AttrValue>) -> ValidationResult<EntityId> {
    EntityId::parse(require_str(ATTR_ENTITY_ID, value)?)
}

/// Checks an entity name.
///
/// Names address a node under its parent, so they must be usable as a single
/// path component: non-blank, no `/` or NUL, and not `.` or `..`.
pub fn check_name(name: &str, max_length: usize) -> ValidationResult<()> {
    let invalid = |reason: &str| ValidationError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            field: ATTR_NAME.to_string(),
        });
    }
    if name.len() > max_length {
        return Err(ValidationError::FieldTooLong {
            field: ATTR_NAME.to_string(),
            max_length,
        });
    }
    if name.contains('/') {
        return Err(invalid("contains '/'"));
    }
    if name.contains('\0') {
        return Err(invalid("contains NUL"));
    }
    if name == "." || name == ".." {
        return Err(invalid("reserved path component"));
    }
    Ok(())
}

/// Checks a semantic type tag.
pub fn check_type(entity_type: &str) -> ValidationResult<()> {
    if entity_type.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            field: ATTR_TYPE.to_string(),
        });
    }
    if entity_type.len() > MAX_TEXT_LEN {
        return Err(ValidationError::FieldTooLong {
            field: ATTR_TYPE.to_string(),
            max_length: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Checks a name and type pair, name first.
pub fn check_name_and_type(
    name: &str,
    entity_type: &str,
    max_name_length: usize,
) -> ValidationResult<()> {
    check_name(name, max_name_length)?;
    check_type(entity_type)
}

/// Validates the raw attributes of a plain entity node.
pub fn validate_entity_attrs(entity_id: Option<&AttrValue>) -> ValidationResult<EntityAttrs> {
    Ok(EntityAttrs {
        id: check_entity_id(entity_id)?,
    })
}

/// Validates the raw attributes of a named entity node stored under `key`.
///
/// Order matters: name and type are checked before the id. The stored name
/// must equal the node's key. The configurable name limit is a creation
/// rule, so names are only held to [`MAX_TEXT_LEN`] here.
pub fn validate_named_attrs(
    key: &str,
    name: Option<&AttrValue>,
    entity_type: Option<&AttrValue>,
    entity_id: Option<&AttrValue>,
) -> ValidationResult<NamedAttrs> {
    let name = require_str(ATTR_NAME, name)?;
    let entity_type = require_str(ATTR_TYPE, entity_type)?;
    check_name_and_type(name, entity_type, MAX_TEXT_LEN)?;
    if name != key {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: format!("does not match node key '{key}'"),
        });
    }
    let id = check_entity_id(entity_id)?;

    Ok(NamedAttrs {
        id,
        name: name.to_string(),
    })
}
