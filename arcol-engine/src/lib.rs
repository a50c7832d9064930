// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `ARCOL` engine: the single-threaded event driven asynchronous simulation
//! engine that runs the ring collective offload models.
//!
//! Every model is a set of long-running tasks connected by bounded
//! [channels](crate::channel). Tasks run until they block on a channel, an
//! [event](crate::events) or a [clock](crate::time::clock). The simulation
//! ends when nothing is runnable and no clock has anything scheduled.
//!
//! # Simple Application
//!
//! ```rust
//! use arcol_engine::channel::channel;
//! use arcol_engine::engine::Engine;
//! use arcol_engine::run_simulation;
//!
//! let mut engine = Engine::default();
//! let (tx, rx) = channel(engine.top(), "words", 4).unwrap();
//! let clock = engine.default_clock();
//! engine.spawn(async move {
//!     for word in 0..8_u32 {
//!         clock.wait_ticks(1).await;
//!         tx.put(word).await;
//!     }
//!     Ok(())
//! });
//! engine.spawn(async move {
//!     let mut total = 0;
//!     for _ in 0..8 {
//!         total += rx.get().await;
//!     }
//!     assert_eq!(total, 28);
//!     Ok(())
//! });
//! run_simulation!(engine);
//! assert_eq!(engine.time_now_ns(), 8.0);
//! ```

pub mod channel;
pub mod engine;
pub mod events;
pub mod executor;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;

/// Run the simulation in a test, expecting either success or the given
/// error text.
#[macro_export]
macro_rules! run_simulation {
    ($engine:ident) => {
        $engine.run().unwrap();
    };
    ($engine:ident, $expect:expr) => {
        match $engine.run() {
            Ok(()) => panic!("Expected an error!"),
            Err(e) => assert_eq!(format!("{e}").as_str(), $expect),
        }
    };
}
