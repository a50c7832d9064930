// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulated time: clocks and the owner of global time.

pub mod clock;
pub mod simtime;
