// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Clocks used to model time.
//!
//! A [Clock] counts ticks at a fixed frequency. Tasks delay themselves by
//! awaiting [Clock::wait_ticks]; the executor moves the clock on to the
//! earliest requested tick once nothing else can run.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct ClockState {
    now: Cell<u64>,
    /// Wakers keyed by the tick they wait for.
    pending: RefCell<BTreeMap<u64, Vec<Waker>>>,
}

/// A clock running at a fixed frequency, shared by cloning.
#[derive(Clone)]
pub struct Clock {
    freq_mhz: f64,
    state: Rc<ClockState>,
}

impl Clock {
    pub(crate) fn new(freq_mhz: f64) -> Self {
        Self {
            freq_mhz,
            state: Rc::default(),
        }
    }

    #[must_use]
    pub fn freq_mhz(&self) -> f64 {
        self.freq_mhz
    }

    /// The tick this clock has reached.
    #[must_use]
    pub fn tick_now(&self) -> u64 {
        self.state.now.get()
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.ticks_to_ns(self.tick_now())
    }

    #[must_use]
    pub fn ticks_to_ns(&self, ticks: u64) -> f64 {
        ticks as f64 * 1000.0 / self.freq_mhz
    }

    /// Time of the earliest tick anyone is waiting for.
    pub(crate) fn next_ns(&self) -> Option<f64> {
        let pending = self.state.pending.borrow();
        pending.keys().next().map(|tick| self.ticks_to_ns(*tick))
    }

    /// Move to the earliest tick waited for and hand back its wakers.
    pub(crate) fn advance(&self) -> Option<(u64, Vec<Waker>)> {
        let (tick, wakers) = self.state.pending.borrow_mut().pop_first()?;
        self.state.now.set(self.state.now.get().max(tick));
        Some((tick, wakers))
    }

    /// A future completing `ticks` ticks from now.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks(&self, ticks: u64) -> Delay {
        Delay {
            state: self.state.clone(),
            until: self.tick_now() + ticks,
            scheduled: false,
        }
    }
}

/// Future returned by [`Clock::wait_ticks`].
pub struct Delay {
    state: Rc<ClockState>,
    until: u64,
    scheduled: bool,
}

impl Future for Delay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.scheduled {
            return if self.state.now.get() >= self.until {
                Poll::Ready(())
            } else {
                Poll::Pending
            };
        }
        // Always yield once, even for zero ticks, so that a delay lets other
        // tasks run first
        self.state
            .pending
            .borrow_mut()
            .entry(self.until)
            .or_default()
            .push(cx.waker().clone());
        self.scheduled = true;
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use futures::task::noop_waker;

    use super::*;

    #[test]
    fn ticks_to_ns() {
        assert_eq!(Clock::new(1000.0).ticks_to_ns(3), 3.0);
        assert_eq!(Clock::new(0.5).ticks_to_ns(1), 2000.0);
    }

    #[test]
    fn earliest_tick_first() {
        let clock = Clock::new(1000.0);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut delays: Vec<_> = [5, 2, 9, 2].map(|t| Box::pin(clock.wait_ticks(t))).into();
        for delay in &mut delays {
            assert!(delay.as_mut().poll(&mut cx).is_pending());
        }
        assert_eq!(clock.next_ns(), Some(2.0));

        let (tick, wakers) = clock.advance().unwrap();
        assert_eq!((tick, wakers.len()), (2, 2));
        assert_eq!(clock.tick_now(), 2);
        assert!(delays[1].as_mut().poll(&mut cx).is_ready());
        assert!(delays[0].as_mut().poll(&mut cx).is_pending());
        assert_eq!(clock.next_ns(), Some(5.0));
    }
}
