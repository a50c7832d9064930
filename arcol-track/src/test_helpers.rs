// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Trackers for tests.

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;

use crate::Tracker;
use crate::tracker::{InMemoryTracker, Registry, TextTracker};

const TRACE_DIR: &str = "traces";

/// A tracker writing everything to `traces/<test file stem>.log`.
///
/// Pass `file!()` so that each test file gets its own trace.
///
/// # Panics
///
/// If the trace file cannot be created.
#[must_use]
pub fn create_tracker(test_file: &str) -> Tracker {
    fs::create_dir_all(TRACE_DIR).unwrap();
    let stem = Path::new(test_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap();
    let file = fs::File::create(format!("{TRACE_DIR}/{stem}.log")).unwrap();
    Rc::new(TextTracker::new(
        Registry::new(log::Level::Trace),
        Box::new(BufWriter::new(file)),
    ))
}

/// An [`InMemoryTracker`] recording `level` and above, along with the same
/// tracker as the [`Tracker`] to hand to a model.
#[must_use]
pub fn create_in_memory_tracker(level: log::Level) -> (Rc<InMemoryTracker>, Tracker) {
    let in_memory = Rc::new(InMemoryTracker::new(Registry::new(level)));
    let tracker: Tracker = in_memory.clone();
    (in_memory, tracker)
}
