// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Logging and tracing for ARCOL models.
//!
//! Every part of a model owns an [`Entity`](crate::entity::Entity) naming its
//! place in the hierarchy, e.g. `top::node2::router`. Entities report through
//! the shared [`Tracker`] in two ways:
//!
//!   - log messages, using [`trace!`], [`debug!`], [`info!`], [`warn!`] and
//!     [`error!`] with the entity before a `;`;
//!   - structural marks at `Trace` level: bursts entering and leaving an
//!     entity ([`enter!`], [`exit!`]) and channels being wired ([`connect!`]).
//!
//! Which entities report at which level is decided by name filters when the
//! entity is created (see [`builder`]).

// Enable warnings for missing documentation
#![warn(missing_docs)]

use std::fmt;

pub use log;

pub mod builder;
pub mod entity;
pub mod test_helpers;

pub mod tracker;
pub use tracker::{Track, Tracker};

/// Where text trackers write to.
pub type Writer = Box<dyn std::io::Write>;

/// Identifies an entity, or a burst of words being followed through the
/// model. [`NO_ID`] and [`ROOT`] are reserved.
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// No entity, such as the parent of the top level.
pub const NO_ID: Id = Id(0);

/// The first id handed out, which goes to the top-level entity.
pub const ROOT: Id = Id(1);

/// Record that burst `$burst` (an [`Id`]) started passing through `$entity`.
#[macro_export]
macro_rules! enter {
    ($entity:expr ; $burst:expr) => {
        $crate::mark_base!($entity ; $crate::tracker::Mark::Enter($burst))
    };
}

/// Record that burst `$burst` finished passing through `$entity`.
#[macro_export]
macro_rules! exit {
    ($entity:expr ; $burst:expr) => {
        $crate::mark_base!($entity ; $crate::tracker::Mark::Exit($burst))
    };
}

/// Record that `$from` now feeds `$to`.
#[macro_export]
macro_rules! connect {
    ($from:expr ; $to:expr) => {
        $crate::mark_base!($from ; $crate::tracker::Mark::Connect($to.id))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! mark_base {
    ($entity:expr ; $mark:expr) => {
        if $entity
            .tracker
            .is_entity_enabled($entity.id, $crate::log::Level::Trace)
        {
            $entity.tracker.mark($entity.id, $mark);
        }
    };
}

/// Tell the tracker that simulation time has moved on.
///
/// Always forwarded so that log lines carry the right time at every level.
#[macro_export]
macro_rules! set_time {
    ($entity:expr ; $time_ns:expr) => {
        $entity.tracker.time($entity.id, $time_ns)
    };
}

/// Log `format_args!($($arg)+)` from `$entity` at `$lvl`.
///
/// Nothing is formatted unless the entity reports at that level.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.id, $lvl) {
            $entity.tracker.log($entity.id, $lvl, format_args!($($arg)+));
        }
    );
}

/// Log at `Trace`: per-word detail.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// Log at `Debug`: per-burst routing decisions.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// Log at `Info`.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// Log at `Warn`.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// Log at `Error`. Models keep running after logging an error; return a
/// `SimError` to stop them.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
