//! Validation behaviour knobs.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Nesting limit for schema and data walks.
const fn default_max_depth() -> usize {
    256
}

const fn default_validate_formats() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Treat JSON `null` as an absent value (form semantics: a cleared
    /// field is `null`, not missing).
    #[serde(default)]
    pub treat_null_as_undefined: bool,

    /// Maximum schema nesting the validator and augmenter will descend.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Report `format` violations. When off, `format` is annotation only.
    #[serde(default = "default_validate_formats")]
    pub validate_formats: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            treat_null_as_undefined: false,
            max_depth: default_max_depth(),
            validate_formats: default_validate_formats(),
        }
    }
}

impl ValidationConfig {
    /// Reject values no walk could run with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "validation.max_depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
