// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Run a collective on every rank of a simulated ring and check the data that
//! each rank ends up with.
//!
//! Every rank runs the same collective `iterations` times. Senders fill their
//! buffer with a pattern that depends on the iteration so that stale or
//! misrouted data is caught. Receivers compare what arrived against the same
//! pattern and count the mismatching elements.
//!
//! Ranks that have not finished when the simulation runs out of work are
//! reported as deadlocked.

use std::cell::RefCell;
use std::rc::Rc;

use arcol_engine::engine::Engine;
use arcol_engine::types::SimError;
use arcol_offload::client::ArcClient;
use arcol_offload::ring::build_ring;
use arcol_offload::wire::{Element, elements_per_word};
use arcol_track::{debug, error, info};

use crate::config::{CollectiveKind, ElementKind, Settings};

pub mod config;

/// Values that can be generated from an iteration and an index.
pub trait Pattern: Element {
    fn pattern(iteration: u32, index: usize) -> Self;
}

macro_rules! impl_pattern {
    ($($t:ty),*) => {
        $(
            impl Pattern for $t {
                fn pattern(iteration: u32, index: usize) -> Self {
                    // Wrapping is fine, the pattern only has to be repeatable
                    (iteration as usize * 1000 + index + 1) as $t
                }
            }
        )*
    };
}

impl_pattern!(f32, f64, i32, u32, i64, u64);

/// The outcome of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    /// Mismatching elements seen by each rank.
    pub errors: Vec<usize>,

    /// Ranks that took part but never finished.
    pub deadlocked: Vec<u32>,

    /// Simulated time when the run ended.
    pub time_ns: f64,
}

impl Report {
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.errors.iter().sum()
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.deadlocked.is_empty() && self.total_errors() == 0
    }
}

/// Per-rank progress shared between the rank tasks and the report.
#[derive(Default)]
struct Progress {
    errors: Vec<usize>,
    finished: Vec<bool>,
}

/// Build the ring described by `settings` in `engine`, run it and report what
/// happened.
pub fn run(engine: &mut Engine, settings: &Settings) -> Result<Report, SimError> {
    let nodes = build_ring(engine, &settings.ring())?;
    let top = engine.top().clone();
    info!(top ; "{:?} of {} {:?} words from rank {}, {} iterations",
        settings.collective, settings.count, settings.datatype, settings.root, settings.iterations);

    let size = nodes.len();
    let progress = Rc::new(RefCell::new(Progress {
        errors: vec![0; size],
        finished: vec![false; size],
    }));

    for node in &nodes {
        let client = node.client();
        if Some(client.rank()) == settings.absent_rank {
            info!(node.entity ; "rank {} sits this one out", client.rank());
            continue;
        }
        match settings.datatype {
            ElementKind::F32 => spawn_rank::<f32>(engine, client, settings, &progress),
            ElementKind::F64 => spawn_rank::<f64>(engine, client, settings, &progress),
            ElementKind::I32 => spawn_rank::<i32>(engine, client, settings, &progress),
            ElementKind::U32 => spawn_rank::<u32>(engine, client, settings, &progress),
            ElementKind::I64 => spawn_rank::<i64>(engine, client, settings, &progress),
            ElementKind::U64 => spawn_rank::<u64>(engine, client, settings, &progress),
        }
    }

    engine.run()?;

    let progress = progress.borrow();
    let deadlocked: Vec<u32> = (0..size as u32)
        .filter(|rank| Some(*rank) != settings.absent_rank && !progress.finished[*rank as usize])
        .collect();
    let report = Report {
        errors: progress.errors.clone(),
        deadlocked,
        time_ns: engine.time_now_ns(),
    };
    for (rank, errors) in report.errors.iter().enumerate() {
        if *errors > 0 {
            error!(top ; "rank {rank}: {errors} mismatching elements");
        }
    }
    Ok(report)
}

fn spawn_rank<T: Pattern>(
    engine: &Engine,
    client: Rc<ArcClient>,
    settings: &Settings,
    progress: &Rc<RefCell<Progress>>,
) {
    let settings = settings.clone();
    let progress = progress.clone();
    engine.spawn(async move {
        let rank = client.rank();
        let len = settings.count as usize * elements_per_word::<T>();
        let (sends, receives) = match settings.collective {
            CollectiveKind::P2p => (rank == settings.root, rank == settings.dest),
            CollectiveKind::Bcast => (rank == settings.root, rank != settings.root),
            CollectiveKind::Barrier => (false, false),
        };

        for iteration in 0..settings.iterations {
            let mut values = vec![T::default(); len];
            if sends {
                for (index, value) in values.iter_mut().enumerate() {
                    *value = T::pattern(iteration, index);
                }
            }

            match settings.collective {
                CollectiveKind::P2p => {
                    client
                        .p2p(&mut values, settings.count, settings.root, settings.dest)
                        .await?;
                }
                CollectiveKind::Bcast => {
                    client
                        .bcast(&mut values, settings.count, settings.root)
                        .await?;
                }
                CollectiveKind::Barrier => client.barrier().await?,
            }

            if receives {
                let errors = values
                    .iter()
                    .enumerate()
                    .filter(|(index, value)| **value != T::pattern(iteration, *index))
                    .count();
                progress.borrow_mut().errors[rank as usize] += errors;
            }
        }

        debug!(client.entity ; "finished {} iterations", settings.iterations);
        progress.borrow_mut().finished[rank as usize] = true;
        Ok(())
    });
}
