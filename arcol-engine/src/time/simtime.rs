// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Global simulation time across all clocks.

use std::rc::Rc;
use std::task::Waker;

use arcol_track::entity::Entity;
use arcol_track::set_time;

use super::clock::Clock;

/// Owns every [`Clock`] (one per frequency) and the current time in ns.
pub struct SimTime {
    entity: Rc<Entity>,
    now_ns: f64,
    clocks: Vec<Clock>,
}

impl SimTime {
    #[must_use]
    pub fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "time")),
            now_ns: 0.0,
            clocks: Vec::new(),
        }
    }

    /// The clock running at `freq_mhz`, created on first use.
    pub fn clock(&mut self, freq_mhz: f64) -> Clock {
        if let Some(clock) = self.clocks.iter().find(|c| c.freq_mhz() == freq_mhz) {
            return clock.clone();
        }
        let clock = Clock::new(freq_mhz);
        self.clocks.push(clock.clone());
        clock
    }

    /// Advance the clock with the earliest pending tick.
    ///
    /// Returns the wakers due at that tick, or `None` when nothing is waiting
    /// on any clock.
    pub fn advance(&mut self) -> Option<Vec<Waker>> {
        let (clock, next_ns) = self
            .clocks
            .iter()
            .filter_map(|c| c.next_ns().map(|ns| (c, ns)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))?;
        let (_, wakers) = clock.advance()?;
        if next_ns != self.now_ns {
            self.now_ns = next_ns;
            set_time!(self.entity ; next_ns);
        }
        Some(wakers)
    }

    #[must_use]
    pub fn now_ns(&self) -> f64 {
        self.now_ns
    }
}

#[cfg(test)]
mod tests {
    use arcol_track::entity::toplevel;
    use arcol_track::tracker::dev_null_tracker;

    use super::*;

    fn sim_time() -> SimTime {
        SimTime::new(&toplevel(&dev_null_tracker(), "top"))
    }

    #[test]
    fn one_clock_per_frequency() {
        let mut time = sim_time();
        time.clock(1000.0);
        time.clock(1000.0);
        assert_eq!(time.clocks.len(), 1);
        time.clock(1800.0);
        assert_eq!(time.clocks.len(), 2);
    }

    #[test]
    fn idle_clocks_end_time() {
        let mut time = sim_time();
        let _clock = time.clock(1000.0);
        assert!(time.advance().is_none());
        assert_eq!(time.now_ns(), 0.0);
    }
}
