// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Helpers for the channel ends that components hand out or are given before
//! the simulation starts.
//!
//! Each end is held in a `RefCell<Option<>>` so that it can be moved into the
//! component's task once `run()` is called.

use std::cell::RefCell;

use arcol_engine::sim_error;
use arcol_engine::types::{SimError, SimResult};
use arcol_track::entity::Entity;

/// Hand out a channel end. Each end can only be taken once.
pub fn take_end<T>(entity: &Entity, slot: &RefCell<Option<T>>, name: &str) -> Result<T, SimError> {
    match slot.borrow_mut().take() {
        Some(end) => Ok(end),
        None => sim_error!(format!("{entity}: {name} already taken")),
    }
}

/// Store a channel end. Each end can only be connected once.
pub fn connect_end<T>(entity: &Entity, slot: &RefCell<Option<T>>, name: &str, end: T) -> SimResult {
    let mut slot = slot.borrow_mut();
    if slot.is_some() {
        return sim_error!(format!("{entity}: {name} already connected"));
    }
    *slot = Some(end);
    Ok(())
}

/// Take a channel end in `run()`, reporting ends that were never connected.
pub fn connected<T>(entity: &Entity, slot: &RefCell<Option<T>>, name: &str) -> Result<T, SimError> {
    match slot.borrow_mut().take() {
        Some(end) => Ok(end),
        None => sim_error!(format!("{entity}: {name} not connected")),
    }
}
