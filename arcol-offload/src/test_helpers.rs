// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use arcol_engine::engine::Engine;
use arcol_engine::test_helpers::start_test;

use crate::config::RingConfig;
use crate::node::Node;
use crate::ring::build_ring;

/// Create an engine that traces to `traces/<test file stem>.log` and build a
/// ring in it.
pub fn start_ring(full_filepath: &str, config: &RingConfig) -> (Engine, Vec<Node>) {
    let mut engine = start_test(full_filepath);
    let nodes = build_ring(&mut engine, config).unwrap();
    (engine, nodes)
}
