//! Configuration management for the invalidation dispatcher.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod callbacks;
mod session;
pub use callbacks::*;
pub use session::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix; nested keys are separated by `__`,
/// e.g. `INVAL__SESSION__DATABASE_ID=16384`.
pub const ENV_PREFIX: &str = "INVAL";

/// Main configuration container for one invalidation session
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct InvalConfig {
    /// Identity of the connected backend
    #[serde(default)]
    pub session: SessionConfig,
    /// Sizing of deferred message lists
    #[serde(default)]
    pub lists: ListConfig,
    /// Bounds of the listener registries
    #[serde(default)]
    pub callbacks: CallbackConfig,
}

impl Debug for InvalConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("InvalConfig")
            .field("session", &self.session)
            .finish()
    }
}

impl InvalConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `INVAL__` prefix (highest priority)
    ///
    /// # Note
    /// Callers MUST call `validate()` before handing the configuration to a session.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("INVAL__SESSION__DATABASE_ID", "16384");
    /// let cfg = InvalConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        self.session.validate()?;
        self.lists.validate()?;
        self.callbacks.validate()?;
        Ok(self)
    }
}
