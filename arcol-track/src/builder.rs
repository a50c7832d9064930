// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Build the [`Tracker`] a command line asks for.
//!
//! There are two outputs, the console and a trace file. Each has its own
//! level and an optional filter regex. When a filter is given only matching
//! entities report at that level and everything else is limited to errors,
//! e.g. `--stdout-level Trace --stdout-filter-regex 'node2::router'`.

use std::io::BufWriter;
use std::rc::Rc;
use std::{fs, io};

use crate::tracker::{Registry, TeeTracker, TextTracker, TrackConfigError};
use crate::{Tracker, Writer};

/// Settings for one output.
pub struct TrackerConfig<'a> {
    /// Whether this output is used at all.
    pub enable: bool,

    /// Level for entities selected by `filter_regex`.
    pub level: log::Level,

    /// Selects entities by full name. Empty selects all of them.
    pub filter_regex: &'a str,

    /// Path written to. Required for the trace file.
    pub file: Option<&'a str>,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
            file: None,
        }
    }
}

/// Settings for both outputs.
pub struct TrackersConfig<'a> {
    /// The console.
    pub stdout: TrackerConfig<'a>,

    /// The text trace file.
    pub file: TrackerConfig<'a>,
}

impl TrackerConfig<'_> {
    fn registry(&self) -> Result<Registry, TrackConfigError> {
        if self.filter_regex.is_empty() {
            return Ok(Registry::new(self.level));
        }
        let mut registry = Registry::new(log::Level::Error);
        registry.add_filter(self.filter_regex, self.level)?;
        Ok(registry)
    }

    fn text_tracker(&self, writer: Writer) -> Result<Tracker, TrackConfigError> {
        Ok(Rc::new(TextTracker::new(self.registry()?, writer)))
    }
}

fn stdout_output(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    config.text_tracker(Box::new(BufWriter::new(io::stdout())))
}

fn file_output(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    let Some(path) = config.file else {
        return Err(TrackConfigError(
            "File tracker enabled without a file name".to_string(),
        ));
    };
    let file = fs::File::create(path)
        .map_err(|e| TrackConfigError(format!("Unable to create '{path}': {e}")))?;
    config.text_tracker(Box::new(BufWriter::new(file)))
}

/// Build the enabled outputs. With neither enabled, warnings and errors
/// still go to the console.
pub fn setup_trackers(config: &TrackersConfig) -> Result<Tracker, TrackConfigError> {
    let mut outputs = Vec::new();
    if config.stdout.enable {
        outputs.push(stdout_output(&config.stdout)?);
    }
    if config.file.enable {
        outputs.push(file_output(&config.file)?);
    }
    match outputs.len() {
        0 => stdout_output(&TrackerConfig::default()),
        1 => Ok(outputs.remove(0)),
        _ => Ok(Rc::new(TeeTracker::new(outputs))),
    }
}
