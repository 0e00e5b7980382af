//! Per-call validation options.

use hform_config::ValidationConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// A `null` value counts as absent: `required` reports it and no other
    /// keyword looks at it.
    pub treat_null_as_undefined: bool,
    /// Recursion guard. `None` means unbounded.
    pub max_depth: Option<usize>,
    /// When off, `format` is an annotation and never fails.
    pub validate_formats: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            treat_null_as_undefined: false,
            max_depth: None,
            validate_formats: true,
        }
    }
}

impl ValidationOptions {
    #[must_use]
    pub const fn treat_null_as_undefined(mut self, enabled: bool) -> Self {
        self.treat_null_as_undefined = enabled;
        self
    }

    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub const fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    /// `true` when `value` must be handled as if it were missing.
    pub(crate) const fn is_absent(&self, value: Option<&serde_json::Value>) -> bool {
        match value {
            None => true,
            Some(serde_json::Value::Null) => self.treat_null_as_undefined,
            Some(_) => false,
        }
    }
}

impl From<&ValidationConfig> for ValidationOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            treat_null_as_undefined: config.treat_null_as_undefined,
            max_depth: Some(config.max_depth),
            validate_formats: config.validate_formats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults_are_permissive() {
        let options = ValidationOptions::default();
        assert!(!options.treat_null_as_undefined);
        assert_eq!(options.max_depth, None);
        assert!(options.validate_formats);
    }

    #[test]
    fn converts_from_config() {
        let config = ValidationConfig {
            treat_null_as_undefined: true,
            max_depth: 12,
            validate_formats: false,
        };
        let options = ValidationOptions::from(&config);
        assert_eq!(
            options,
            ValidationOptions {
                treat_null_as_undefined: true,
                max_depth: Some(12),
                validate_formats: false,
            }
        );
    }

    #[test]
    fn null_is_absent_only_when_enabled() {
        let null = json!(null);
        assert!(!ValidationOptions::default().is_absent(Some(&null)));
        assert!(ValidationOptions::default().treat_null_as_undefined(true).is_absent(Some(&null)));
        assert!(ValidationOptions::default().is_absent(None));
        assert!(!ValidationOptions::default().treat_null_as_undefined(true).is_absent(Some(&json!(0))));
    }
}
