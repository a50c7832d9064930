// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Wait for whichever of several events happens first.
//!
//! ```rust
//! # use arcol_engine::engine::Engine;
//! # use arcol_engine::events::any_of::AnyOf;
//! # use arcol_engine::events::signal::Signal;
//! # use arcol_engine::traits::Event;
//! # use arcol_track::tracker::dev_null_tracker;
//! let mut engine = Engine::new(&dev_null_tracker());
//! let stop = Signal::new();
//! let data = Signal::new();
//! let either = AnyOf::new(vec![Box::new(stop.clone()), Box::new(data.clone())]);
//!
//! let clock = engine.default_clock();
//! engine.spawn(async move {
//!     clock.wait_ticks(100).await;
//!     data.notify();
//!     Ok(())
//! });
//! engine.spawn(async move {
//!     assert_eq!(either.listen().await, 1);
//!     Ok(())
//! });
//! engine.run().unwrap();
//! ```

use futures::future::{self, LocalBoxFuture};

use crate::traits::Event;
use crate::types::Eventable;

/// Completes with the index of the first of its events to happen.
///
/// An empty set never completes.
pub struct AnyOf {
    events: Vec<Eventable<()>>,
}

impl AnyOf {
    #[must_use]
    pub fn new(events: Vec<Eventable<()>>) -> Self {
        Self { events }
    }
}

impl Event<usize> for AnyOf {
    fn listen(&self) -> LocalBoxFuture<'static, usize> {
        if self.events.is_empty() {
            return Box::pin(future::pending());
        }
        let waits: Vec<_> = self.events.iter().map(|e| e.listen()).collect();
        Box::pin(async move {
            let (_, index, _) = future::select_all(waits).await;
            index
        })
    }
}
