// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use arcol_track::test_helpers::create_tracker;

use crate::engine::Engine;

/// Create an engine whose trace goes to `traces/<test file stem>.log`.
#[must_use]
pub fn start_test(full_filepath: &str) -> Engine {
    Engine::new(&create_tracker(full_filepath))
}
