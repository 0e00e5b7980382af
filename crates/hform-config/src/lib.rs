//! # hform-config
//!
//! Layered configuration loading for hform using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`HFORM_*` prefix, `__` as separator)
//! 2. Project-level `.hform/config.toml`
//! 3. User-level `~/.config/hform/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `HFORM_VALIDATION__TREAT_NULL_AS_UNDEFINED` ->
//! `validation.treat_null_as_undefined`, `HFORM_VALIDATION__MAX_DEPTH` ->
//! `validation.max_depth`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use hform_config::HformConfig;
//!
//! let config = HformConfig::load().expect("config");
//! if config.validation.treat_null_as_undefined {
//!     println!("null form values count as empty");
//! }
//! ```

mod error;
mod validation;

pub use error::ConfigError;
pub use validation::ValidationConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HformConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl HformConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and check the result.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and check a config from an arbitrary figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validation.check()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".hform/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("HFORM_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hform").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_loads() {
        let config = HformConfig::default();
        assert!(!config.validation.treat_null_as_undefined);
        assert!(config.validation.validate_formats);
        assert_eq!(config.validation.max_depth, 256);
    }

    #[test]
    fn figment_builds_without_files() {
        let mut config = None;
        figment::Jail::expect_with(|_jail| {
            config = Some(HformConfig::from_figment(&HformConfig::figment()).expect("defaults extract"));
            Ok(())
        });
        let config: HformConfig = config.expect("jail closure ran");
        assert_eq!(config, HformConfig::default());
    }
}
