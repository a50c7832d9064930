// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The [Engine] ties together the executor, the clocks and the entity
//! hierarchy of one simulation.

use std::future::Future;
use std::rc::Rc;

use arcol_track::Tracker;
use arcol_track::entity::{Entity, toplevel};
use arcol_track::tracker::stdout_tracker;

use crate::executor::{Executor, Spawner, new_executor_and_spawner};
use crate::time::clock::Clock;
use crate::types::{Component, SimResult};

/// 1GHz, so that a tick is a nanosecond.
const DEFAULT_CLOCK_MHZ: f64 = 1000.0;

/// A simulation under construction, then running.
///
/// Models are built by creating components with a reference to the engine
/// and registering them; [`Engine::run`] then spawns every registered
/// component and runs until nothing more can happen.
pub struct Engine {
    executor: Executor,
    spawner: Spawner,
    top: Rc<Entity>,
    tracker: Tracker,
    components: Vec<Component>,
}

impl Engine {
    /// An engine whose entities report to `tracker`. The top-level entity
    /// is called `top`.
    #[must_use]
    pub fn new(tracker: &Tracker) -> Self {
        let top = toplevel(tracker, "top");
        let (executor, spawner) = new_executor_and_spawner(&top);
        Self {
            executor,
            spawner,
            top,
            tracker: tracker.clone(),
            components: Vec::new(),
        }
    }

    /// Have `component.run()` spawned when the simulation starts.
    pub fn register(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Run every registered component and spawned task until none can make
    /// progress, then flush the tracker.
    ///
    /// Tasks still blocked at the end are left where they are; callers
    /// detect them by what did not complete.
    pub fn run(&mut self) -> SimResult {
        for component in self.components.drain(..) {
            self.executor.spawn(async move { component.run().await });
        }
        let result = self.executor.run();
        self.tracker.shutdown();
        result
    }

    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.executor.spawn(future);
    }

    #[must_use]
    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// The 1GHz clock.
    #[must_use]
    pub fn default_clock(&self) -> Clock {
        self.executor.clock(DEFAULT_CLOCK_MHZ)
    }

    #[must_use]
    pub fn clock_mhz(&self, freq_mhz: f64) -> Clock {
        self.executor.clock(freq_mhz)
    }

    /// Time of the latest clock tick reached, in ns.
    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.executor.time_now_ns()
    }

    #[must_use]
    pub fn top(&self) -> &Rc<Entity> {
        &self.top
    }
}

/// An engine logging warnings and errors to stdout.
impl Default for Engine {
    fn default() -> Self {
        Self::new(&stdout_tracker(log::Level::Warn))
    }
}
