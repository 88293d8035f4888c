use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::FIRST_CHUNK_SIZE;
use crate::Error;
use crate::Oid;
use crate::Result;
use crate::INVALID_OID;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Database the backend is connected to. Messages scoped to any other
    /// concrete database are ignored locally.
    #[serde(default = "default_database_id")]
    pub database_id: Oid,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            database_id: default_database_id(),
        }
    }
}

impl SessionConfig {
    pub(super) fn validate(&self) -> Result<()> {
        if self.database_id == INVALID_OID {
            return Err(Error::Config(ConfigError::Message(
                "database_id must name a concrete database".into(),
            )));
        }
        Ok(())
    }
}

fn default_database_id() -> Oid {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ListConfig {
    /// Capacity of the first chunk of every deferred list; later chunks double
    #[serde(default = "default_first_chunk_size")]
    pub first_chunk_size: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            first_chunk_size: default_first_chunk_size(),
        }
    }
}

impl ListConfig {
    pub(super) fn validate(&self) -> Result<()> {
        if self.first_chunk_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "first_chunk_size must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_first_chunk_size() -> usize {
    FIRST_CHUNK_SIZE
}
