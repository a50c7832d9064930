// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::fmt;
use std::rc::Rc;

use crate::traits::{Event, Runnable};

/// A boxed [`Event`], for combining different kinds of event.
pub type Eventable<T> = Box<dyn Event<T>>;

/// A component the [`Engine`](crate::engine::Engine) spawns at start-up.
pub type Component = Rc<dyn Runnable>;

/// The error that stops a simulation.
///
/// The first task to return one ends the run and the error is handed back
/// from [`Engine::run`](crate::engine::Engine::run).
#[derive(Debug, PartialEq)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl std::error::Error for SimError {}

pub type SimResult = Result<(), SimError>;

/// `Err(SimError)` from anything with `to_string`.
#[macro_export]
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))
    };
}
