// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Settings for a run, gathered from several sources.
//!
//! Later sources override earlier ones:
//!  1. built-in defaults
//!  2. a TOML file given with `--config`
//!  3. `ARCOL_` environment variables, e.g. `ARCOL_SIZE=8`
//!  4. command-line flags

use std::path::Path;

use arcol_offload::config::{Deployment, RingConfig};
use clap::{Args, ValueEnum};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "ARCOL_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectiveKind {
    P2p,
    Bcast,
    Barrier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    F32,
    F64,
    I32,
    U32,
    I64,
    U64,
}

/// Everything a run needs, with every source merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub size: u32,
    pub deployment: Deployment,
    pub channel_capacity: usize,
    pub link_latency_ticks: u64,

    pub collective: CollectiveKind,
    pub datatype: ElementKind,

    /// Payload words per collective.
    pub count: u32,
    pub root: u32,

    /// Only used by `p2p`.
    pub dest: u32,
    pub iterations: u32,

    /// A rank that never calls the collective. The others will hang.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absent_rank: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        let ring = RingConfig::default();
        Self {
            size: ring.size,
            deployment: ring.deployment,
            channel_capacity: ring.channel_capacity,
            link_latency_ticks: ring.link_latency_ticks,
            collective: CollectiveKind::Bcast,
            datatype: ElementKind::F32,
            count: 4,
            root: 0,
            dest: 1,
            iterations: 10,
            absent_rank: None,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn ring(&self) -> RingConfig {
        RingConfig {
            size: self.size,
            deployment: self.deployment,
            channel_capacity: self.channel_capacity,
            link_latency_ticks: self.link_latency_ticks,
        }
    }
}

/// Command-line overrides. Only the flags that are given replace other
/// sources.
#[derive(Args, Clone, Debug, Default, Serialize)]
pub struct Overrides {
    /// Number of ranks in the ring.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    /// How each node is built.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Deployment>,

    /// Words each channel can hold.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,

    /// Clock ticks each word spends on a link, 0 for no links.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_latency_ticks: Option<u64>,

    /// The collective to run.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collective: Option<CollectiveKind>,

    /// Element type of the payload.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<ElementKind>,

    /// Payload words per collective.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// The rank that sends.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<u32>,

    /// The rank a `p2p` sends to.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<u32>,

    /// Number of times every rank runs the collective.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,

    /// Leave this rank out of every collective.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absent_rank: Option<u32>,
}

/// Merge defaults, `config_file`, the environment and `overrides`.
pub fn load_settings(
    config_file: Option<&Path>,
    overrides: &Overrides,
) -> Result<Settings, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(figment::Error::from(format!(
                "config file '{}' not found",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(ENV_PREFIX))
        .merge(Serialized::defaults(overrides))
        .extract()
}
