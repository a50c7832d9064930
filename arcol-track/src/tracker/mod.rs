// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The [`Track`] interface and the trackers that implement it.

/// Discards everything.
pub mod dev_null;
/// Records everything, for tests.
pub mod in_memory;
/// Fans out to several trackers.
pub mod tee;
/// Human-readable lines.
pub mod text;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::rc::Rc;

pub use dev_null::DevNullTracker;
pub use in_memory::InMemoryTracker;
use regex::Regex;
pub use tee::TeeTracker;
pub use text::TextTracker;

use crate::{Id, NO_ID, ROOT};

/// Error returned when a tracker cannot be configured.
#[derive(Debug)]
pub struct TrackConfigError(pub String);

impl fmt::Display for TrackConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TrackConfigError {}

/// A structural event recorded against an entity at `Trace` level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    /// A burst (or other tracked object) started passing through.
    Enter(Id),
    /// The burst finished passing through.
    Exit(Id),
    /// The entity now feeds the entity with this id.
    Connect(Id),
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Enter(id) => write!(f, "enter {id}"),
            Mark::Exit(id) => write!(f, "exit {id}"),
            Mark::Connect(id) => write!(f, "connect {id}"),
        }
    }
}

/// Receiver of everything entities report.
pub trait Track {
    /// Allocate an id that no other entity or burst holds.
    fn unique_id(&self) -> Id;

    /// Whether `id` reports at `level`.
    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool;

    /// Register a newly created entity under its full hierarchical name.
    ///
    /// The entity's level is fixed at this point.
    fn add_entity(&self, id: Id, parent: Id, full_name: &str);

    /// Record a structural event.
    fn mark(&self, id: Id, mark: Mark);

    /// Emit a log message.
    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments);

    /// Simulation time has moved on to `time_ns`.
    fn time(&self, set_by: Id, time_ns: f64);

    /// Flush any buffered output.
    fn shutdown(&self);
}

/// The [`Track`] object shared by every entity of a model.
pub type Tracker = Rc<dyn Track>;

/// A [`Tracker`] writing everything at `level` and above to `stdout`.
#[must_use]
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let writer = Box::new(io::BufWriter::new(io::stdout()));
    Rc::new(TextTracker::new(Registry::new(level), writer))
}

/// A [`Tracker`] that drops everything.
#[must_use]
pub fn dev_null_tracker() -> Tracker {
    Rc::new(DevNullTracker)
}

/// Book-keeping shared by the reporting trackers.
///
/// The registry hands out ids, remembers entity names, resolves each
/// entity's level from the name filters when the entity is added, and keeps
/// the latest simulation time.
pub struct Registry {
    default_level: log::Level,
    filters: Vec<(Regex, log::Level)>,
    next_id: Cell<u64>,
    now_ns: Cell<f64>,
    names: RefCell<HashMap<Id, String>>,
    levels: RefCell<HashMap<Id, log::Level>>,
}

impl Registry {
    /// Entities matching no filter report at `default_level`.
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            next_id: Cell::new(ROOT.0),
            now_ns: Cell::new(0.0),
            names: RefCell::new(HashMap::new()),
            levels: RefCell::new(HashMap::new()),
        }
    }

    /// Entities whose full name matches `regex_str` report at `level`.
    ///
    /// Filters are tried in the order they were added.
    ///
    /// # Example
    ///
    /// ```rust
    /// use arcol_track::tracker::Registry;
    /// let mut registry = Registry::new(log::Level::Warn);
    /// registry.add_filter(".*router.*", log::Level::Trace).unwrap();
    /// ```
    pub fn add_filter(&mut self, regex_str: &str, level: log::Level) -> Result<(), TrackConfigError> {
        let regex = Regex::new(regex_str)
            .map_err(|e| TrackConfigError(format!("Failed to parse regex {regex_str}:\n{e}\n")))?;
        self.filters.push((regex, level));
        Ok(())
    }

    fn unique_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id(id)
    }

    fn level_for(&self, full_name: &str) -> log::Level {
        self.filters
            .iter()
            .find(|(regex, _)| regex.is_match(full_name))
            .map_or(self.default_level, |(_, level)| *level)
    }

    fn add_entity(&self, id: Id, full_name: &str) {
        let level = self.level_for(full_name);
        if level != self.default_level {
            self.levels.borrow_mut().insert(id, level);
        }
        self.names.borrow_mut().insert(id, full_name.to_owned());
    }

    fn enabled(&self, id: Id, level: log::Level) -> bool {
        level <= self.levels.borrow().get(&id).copied().unwrap_or(self.default_level)
    }

    /// The registered name for `id`, or the id itself for unnamed objects.
    fn name_of(&self, id: Id) -> String {
        if id == NO_ID {
            return "-".to_string();
        }
        self.names
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    }

    fn now_ns(&self) -> f64 {
        self.now_ns.get()
    }

    fn advance(&self, time_ns: f64) {
        if time_ns > self.now_ns.get() {
            self.now_ns.set(time_ns);
        }
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    const PATHS: [&str; 4] = ["top", "top::node0", "top::node0::router", "top::node1::router"];

    fn levels(registry: &Registry) -> Vec<Level> {
        PATHS.iter().map(|p| registry.level_for(p)).collect()
    }

    #[test]
    fn unfiltered_names_use_default() {
        let registry = Registry::new(Level::Error);
        assert_eq!(levels(&registry), vec![Level::Error; 4]);
    }

    #[test]
    fn one_node_traced() {
        let mut registry = Registry::new(Level::Error);
        registry.add_filter(r".*node0.*", Level::Trace).unwrap();
        assert_eq!(
            levels(&registry),
            [Level::Error, Level::Trace, Level::Trace, Level::Error]
        );
    }

    #[test]
    fn earlier_filters_take_priority() {
        let mut registry = Registry::new(Level::Error);
        registry.add_filter(r".*router", Level::Warn).unwrap();
        registry.add_filter(r".*node.*", Level::Info).unwrap();
        assert_eq!(
            levels(&registry),
            [Level::Error, Level::Info, Level::Warn, Level::Warn]
        );
    }

    #[test]
    fn level_fixed_when_added() {
        let mut registry = Registry::new(Level::Warn);
        registry.add_filter(r".*node1.*", Level::Trace).unwrap();

        let quiet = registry.unique_id();
        registry.add_entity(quiet, "top::node0::router");
        let loud = registry.unique_id();
        registry.add_entity(loud, "top::node1::router");

        assert!(registry.enabled(quiet, Level::Warn));
        assert!(!registry.enabled(quiet, Level::Debug));
        assert!(registry.enabled(loud, Level::Trace));
        assert_eq!(registry.name_of(loud), "top::node1::router");
        assert_eq!(registry.name_of(Id(99)), "#99");
    }

    #[test]
    fn unparsable_filter() {
        let mut registry = Registry::new(Level::Error);
        assert!(registry.add_filter(r"(", Level::Info).is_err());
    }

    #[test]
    fn ids_start_at_root() {
        let registry = Registry::new(Level::Error);
        let ids: Vec<_> = (0..4).map(|_| registry.unique_id()).collect();
        assert_eq!(ids, [ROOT, Id(2), Id(3), Id(4)]);
    }

    #[test]
    fn time_never_goes_backwards() {
        let registry = Registry::new(Level::Error);
        registry.advance(5.0);
        registry.advance(2.0);
        assert_eq!(registry.now_ns(), 5.0);
    }
}
