use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::*;
use crate::Error;
use crate::Result;

/// Upper bounds of the listener registries.
///
/// Registration happens once at session setup, so running out of slots is a
/// configuration mistake reported at registration time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CallbackConfig {
    #[serde(default = "default_max_syscache_callbacks")]
    pub max_syscache_callbacks: usize,

    #[serde(default = "default_max_relcache_callbacks")]
    pub max_relcache_callbacks: usize,

    #[serde(default = "default_max_partcache_callbacks")]
    pub max_partcache_callbacks: usize,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            max_syscache_callbacks: default_max_syscache_callbacks(),
            max_relcache_callbacks: default_max_relcache_callbacks(),
            max_partcache_callbacks: default_max_partcache_callbacks(),
        }
    }
}

impl CallbackConfig {
    pub(super) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_syscache_callbacks", self.max_syscache_callbacks),
            ("max_relcache_callbacks", self.max_relcache_callbacks),
            ("max_partcache_callbacks", self.max_partcache_callbacks),
        ] {
            if value == 0 {
                return Err(Error::Config(ConfigError::Message(format!(
                    "{} must be greater than 0",
                    name
                ))));
            }
        }
        Ok(())
    }
}

fn default_max_syscache_callbacks() -> usize {
    MAX_SYSCACHE_CALLBACKS
}
fn default_max_relcache_callbacks() -> usize {
    MAX_RELCACHE_CALLBACKS
}
fn default_max_partcache_callbacks() -> usize {
    MAX_PARTCACHE_CALLBACKS
}
