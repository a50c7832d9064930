// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::fmt;

use crate::tracker::{Mark, Registry, Track, Tracker};
use crate::Id;

/// Copies every event to several trackers, each applying its own levels.
///
/// Used when the console log and a trace file are both requested.
pub struct TeeTracker {
    ids: Registry,
    outputs: Vec<Tracker>,
}

impl TeeTracker {
    /// Ids are allocated here so that all outputs agree on them.
    #[must_use]
    pub fn new(outputs: Vec<Tracker>) -> Self {
        Self {
            ids: Registry::new(log::Level::Error),
            outputs,
        }
    }

    fn listening(&self, id: Id, level: log::Level) -> impl Iterator<Item = &Tracker> {
        self.outputs
            .iter()
            .filter(move |t| t.is_entity_enabled(id, level))
    }
}

impl Track for TeeTracker {
    fn unique_id(&self) -> Id {
        self.ids.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.listening(id, level).next().is_some()
    }

    fn add_entity(&self, id: Id, parent: Id, full_name: &str) {
        for output in &self.outputs {
            output.add_entity(id, parent, full_name);
        }
    }

    fn mark(&self, id: Id, mark: Mark) {
        for output in self.listening(id, log::Level::Trace) {
            output.mark(id, mark);
        }
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        for output in self.listening(id, level) {
            output.log(id, level, msg);
        }
    }

    fn time(&self, set_by: Id, time_ns: f64) {
        for output in &self.outputs {
            output.time(set_by, time_ns);
        }
    }

    fn shutdown(&self) {
        for output in &self.outputs {
            output.shutdown();
        }
    }
}
