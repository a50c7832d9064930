// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::Id;
use crate::tracker::{Mark, Registry, Track};

/// One recorded event.
#[derive(Debug, Clone)]
pub struct Record {
    /// Entity that reported the event.
    pub id: Id,

    /// Simulation time of the report.
    pub time_ns: f64,

    /// What was reported.
    pub event: Event,
}

/// The events kept by the [`InMemoryTracker`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The entity was created.
    Created {
        /// Id of the parent entity.
        parent: Id,
    },
    /// A structural [`Mark`].
    Mark(Mark),
    /// A log message.
    Log {
        /// Level at which it was emitted.
        level: log::Level,
        /// Formatted message.
        text: String,
    },
}

/// Keeps every event so that tests can inspect what a model did.
pub struct InMemoryTracker {
    registry: Registry,
    records: RefCell<Vec<Record>>,
    ids_by_name: RefCell<HashMap<String, Id>>,
}

impl InMemoryTracker {
    /// Record the events that `registry` enables.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            records: RefCell::new(Vec::new()),
            ids_by_name: RefCell::new(HashMap::new()),
        }
    }

    fn record(&self, id: Id, event: Event) {
        let time_ns = self.registry.now_ns();
        self.records.borrow_mut().push(Record { id, time_ns, event });
    }

    /// The [`Id`] of the entity with the given full name.
    #[must_use]
    pub fn id_for_name(&self, full_name: &str) -> Option<Id> {
        self.ids_by_name.borrow().get(full_name).copied()
    }

    /// A copy of everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    /// The text of the log messages emitted at exactly `level`.
    #[must_use]
    pub fn logs_at(&self, level: log::Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match &r.event {
                Event::Log { level: l, text } if *l == level => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// How many bursts entered entity `id`.
    #[must_use]
    pub fn count_enter(&self, id: Id) -> usize {
        self.count_marks(id, |m| matches!(m, Mark::Enter(_)))
    }

    /// How many bursts left entity `id`.
    #[must_use]
    pub fn count_exit(&self, id: Id) -> usize {
        self.count_marks(id, |m| matches!(m, Mark::Exit(_)))
    }

    fn count_marks(&self, id: Id, wanted: impl Fn(&Mark) -> bool) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.id == id && matches!(&r.event, Event::Mark(m) if wanted(m)))
            .count()
    }
}

impl Track for InMemoryTracker {
    fn unique_id(&self) -> Id {
        self.registry.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.registry.enabled(id, level)
    }

    fn add_entity(&self, id: Id, parent: Id, full_name: &str) {
        self.registry.add_entity(id, full_name);
        self.ids_by_name
            .borrow_mut()
            .insert(full_name.to_owned(), id);
        if self.registry.enabled(id, log::Level::Trace) {
            self.record(id, Event::Created { parent });
        }
    }

    fn mark(&self, id: Id, mark: Mark) {
        self.record(id, Event::Mark(mark));
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        self.record(
            id,
            Event::Log {
                level,
                text: msg.to_string(),
            },
        );
    }

    fn time(&self, _set_by: Id, time_ns: f64) {
        self.registry.advance(time_ns);
    }

    fn shutdown(&self) {}
}
