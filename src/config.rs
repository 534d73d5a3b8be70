//! Configuration for entity creation and validation.

use std::sync::Arc;

use crate::entity::{IdMinter, UuidMinter};
use crate::error::ValidationError;
use crate::time::{Clock, SystemClock};
use crate::validation::MAX_TEXT_LEN;

/// Default upper bound on entity name length, in bytes.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;

/// Collaborators and limits used when creating and opening entities.
///
/// The default configuration stamps with the system clock and mints random
/// UUIDs.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nixid::config::EntityConfig;
/// use nixid::time::ManualClock;
///
/// let config = EntityConfig::default()
///     .with_clock(Arc::new(ManualClock::new(1_700_000_000)))
///     .with_max_name_length(64)
///     .validate()
///     .unwrap();
/// assert_eq!(config.max_name_length, 64);
/// ```
#[derive(Debug, Clone)]
pub struct EntityConfig {
    /// Clock read by every stamping operation.
    pub clock: Arc<dyn Clock>,
    /// Source of fresh entity ids.
    pub minter: Arc<dyn IdMinter>,
    /// Longest accepted entity name, in bytes.
    pub max_name_length: usize,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            minter: Arc::new(UuidMinter),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl EntityConfig {
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_minter(mut self, minter: Arc<dyn IdMinter>) -> Self {
        self.minter = minter;
        self
    }

    #[must_use]
    pub fn with_max_name_length(mut self, max_name_length: usize) -> Self {
        self.max_name_length = max_name_length;
        self
    }

    /// Checks the limits are usable, consuming and returning the config.
    ///
    /// # Errors
    ///
    /// Same as [`EntityConfig::check`].
    pub fn validate(self) -> Result<Self, ValidationError> {
        self.check()?;
        Ok(self)
    }

    /// Checks the limits are usable.
    ///
    /// Every `*_with` constructor runs this before touching the store.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidConfig` if `max_name_length` is zero
    /// or larger than [`MAX_TEXT_LEN`].
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.max_name_length == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_name_length must be at least 1".to_string(),
            });
        }
        if self.max_name_length > MAX_TEXT_LEN {
            return Err(ValidationError::InvalidConfig {
                reason: format!(
                    "max_name_length must be at most {MAX_TEXT_LEN} (got {})",
                    self.max_name_length
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    #[test]
    fn test_default_is_valid() {
        let config = EntityConfig::default().validate().unwrap();
        assert_eq!(config.max_name_length, DEFAULT_MAX_NAME_LENGTH);
    }

    #[test]
    fn test_rejects_zero_name_length() {
        let err = EntityConfig::default()
            .with_max_name_length(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidConfig { .. }));
    }

    #[test]
    fn test_rejects_huge_name_length() {
        assert!(EntityConfig::default()
            .with_max_name_length(MAX_TEXT_LEN + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_with_clock() {
        let config = EntityConfig::default().with_clock(Arc::new(ManualClock::new(42)));
        assert_eq!(config.clock.now(), 42);
    }
}
