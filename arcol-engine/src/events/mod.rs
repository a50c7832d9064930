// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Events that tasks can wait on, besides clocks and channels.

pub mod any_of;
pub mod signal;
