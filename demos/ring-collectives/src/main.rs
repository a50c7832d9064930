// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Run collectives on a simulated ring of offload nodes.
//!
//! See `lib.rs` for details.

use std::path::PathBuf;

use arcol_engine::engine::Engine;
use arcol_engine::sim_error;
use arcol_engine::types::SimError;
use arcol_track::Tracker;
use arcol_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use arcol_track::{error, info};
use clap::Parser;
use ring_collectives::config::{Overrides, load_settings};
use ring_collectives::run;

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Ring collectives offload application")]
struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// Enable logging to a text file.
    #[arg(long, default_value = "false")]
    trace: bool,

    /// Level of log message to write to the trace file.
    #[arg(long, default_value = "Trace")]
    trace_level: log::Level,

    /// Set a regular expression for which entites should have trace file
    /// level set to `--trace-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    trace_filter_regex: String,

    /// The file trace output is written to.
    #[arg(long, default_value = "trace.log")]
    trace_file: String,

    /// A TOML file of settings. Environment variables and flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

fn setup_all_trackers(args: &Cli) -> Result<Tracker, SimError> {
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: args.stdout,
            level: args.stdout_level,
            filter_regex: &args.stdout_filter_regex,
            file: None,
        },
        file: TrackerConfig {
            enable: args.trace,
            level: args.trace_level,
            filter_regex: &args.trace_filter_regex,
            file: Some(&args.trace_file),
        },
    };
    setup_trackers(&config).map_err(|e| SimError(e.to_string()))
}

fn main() -> Result<(), SimError> {
    let args = Cli::parse();

    let settings =
        load_settings(args.config.as_deref(), &args.overrides).map_err(|e| SimError(e.to_string()))?;
    let tracker = setup_all_trackers(&args)?;

    let mut engine = Engine::new(&tracker);
    let top = engine.top().clone();
    info!(top ; "{} ring of {} ranks, capacity {} words, link latency {} ticks",
        settings.deployment, settings.size, settings.channel_capacity, settings.link_latency_ticks);

    let report = run(&mut engine, &settings)?;

    if !report.deadlocked.is_empty() {
        error!(top ; "Ranks {:?} never finished", report.deadlocked);
        error!(top ; "Deadlock detected at {:.2}ns", report.time_ns);

        tracker.shutdown();
        return sim_error!("Deadlock");
    }
    if report.total_errors() > 0 {
        error!(top ; "{} mismatching elements", report.total_errors());

        tracker.shutdown();
        return sim_error!("Data mismatch");
    }
    info!(top ; "Pass ({:.2}ns)", report.time_ns);
    tracker.shutdown();
    Ok(())
}
