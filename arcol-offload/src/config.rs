// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Configuration of a ring of offload nodes.

use std::fmt;

use arcol_engine::types::SimError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The largest ring the direct deployment can route correctly.
///
/// Without relay stages every burst is consumed by the first router it
/// reaches, so no destination may be more than one hop away.
pub const DIRECT_MAX_SIZE: u32 = 3;

/// How each node is put together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// Routers are wired straight to their neighbours.
    Direct,
    /// Each router sits behind an rx and a tx relay stage per direction.
    #[default]
    Staged,
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Deployment::Direct => write!(f, "direct"),
            Deployment::Staged => write!(f, "staged"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    /// Number of ranks.
    pub size: u32,
    pub deployment: Deployment,

    /// Words each channel can hold.
    pub channel_capacity: usize,

    /// Ticks a word spends on the link between two nodes. Zero connects the
    /// nodes directly.
    pub link_latency_ticks: u64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            size: 4,
            deployment: Deployment::Staged,
            channel_capacity: 8,
            link_latency_ticks: 0,
        }
    }
}

impl RingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.deployment == Deployment::Direct && self.size > DIRECT_MAX_SIZE {
            return Err(ConfigError::DirectTooLarge(self.size));
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    ZeroSize,
    ZeroCapacity,
    DirectTooLarge(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::ZeroSize => write!(f, "a ring needs at least one rank"),
            ConfigError::ZeroCapacity => write!(f, "channel capacity must be at least 1"),
            ConfigError::DirectTooLarge(size) => write!(
                f,
                "direct deployment supports at most {DIRECT_MAX_SIZE} ranks, not {size}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(RingConfig::default().validate(), Ok(()));
    }

    #[test]
    fn invalid_configs() {
        let config = RingConfig {
            size: 0,
            ..RingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSize));

        let config = RingConfig {
            channel_capacity: 0,
            ..RingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));

        let config = RingConfig {
            size: 4,
            deployment: Deployment::Direct,
            ..RingConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DirectTooLarge(4)));

        let config = RingConfig {
            size: 3,
            deployment: Deployment::Direct,
            ..RingConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn error_text() {
        let e: SimError = ConfigError::DirectTooLarge(8).into();
        assert_eq!(
            format!("{e}"),
            "Error: direct deployment supports at most 3 ranks, not 8"
        );
    }
}
