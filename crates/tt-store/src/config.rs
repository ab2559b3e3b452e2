use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tt_delta::{validate_block_size, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};

use crate::error::{StoreError, StoreResult};

/// Tuning knobs for [`ChainedBlobStore`](crate::ChainedBlobStore).
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Content shorter than this is always stored raw.
    pub min_delta_size: u64,
    /// Longest allowed run of delta links above a raw object.
    pub max_chain_depth: u32,
    /// A delta is kept only if `encoded_len <= max_delta_ratio * content_len`.
    pub max_delta_ratio: f64,
    /// Block size used when signing a base.
    pub block_size: u32,
    /// Materialized bases larger than this spill from memory to a temp file.
    pub scratch_spill_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_delta_size: 64 * 1024,
            max_chain_depth: 20,
            max_delta_ratio: 0.70,
            block_size: 2048,
            scratch_spill_threshold: 8 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_block_size(self.block_size).map_err(|_| {
            StoreError::InvalidConfig(format!(
                "block_size {} outside [{MIN_BLOCK_SIZE}, {MAX_BLOCK_SIZE}]",
                self.block_size
            ))
        })?;
        if !(self.max_delta_ratio > 0.0 && self.max_delta_ratio <= 1.0) {
            return Err(StoreError::InvalidConfig(format!(
                "max_delta_ratio {} must be in (0, 1]",
                self.max_delta_ratio
            )));
        }
        Ok(())
    }
}
