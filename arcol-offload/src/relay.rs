// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The receive and transmit stages that sit between a node's router and the
//! ring links.
//!
//! With these stages in place ring traffic that is not for the local node
//! passes straight through without involving the router:
//!
//! ```text
//!   ring in --> RingRx --deliver--> router --local--> RingTx --> ring out
//!                  \                                    ^
//!                   `-------------- through -----------'
//! ```
//!
//! There is one [RingRx] and one [RingTx] per direction of travel.

use std::cell::RefCell;
use std::rc::Rc;

use arcol_engine::channel::{ChannelRx, ChannelTx, channel};
use arcol_engine::engine::Engine;
use arcol_engine::events::any_of::AnyOf;
use arcol_engine::traits::{Event, Runnable};
use arcol_engine::types::{SimError, SimResult};
use arcol_track::entity::Entity;
use arcol_track::{error, trace};
use async_trait::async_trait;

use crate::connect::{connect_end, connected, take_end};
use crate::forward::{drain_array, fork_array, stream_array};
use crate::topology::{Direction, Ring};
use crate::wire::{Collective, Header, Word};

/// Splits arriving ring traffic between the local router and the next hop.
pub struct RingRx {
    pub entity: Rc<Entity>,
    ring: Ring,
    dir: Direction,

    rx: RefCell<Option<ChannelRx<Word>>>,
    ring_input: RefCell<Option<ChannelTx<Word>>>,
    deliver: RefCell<Option<ChannelTx<Word>>>,
    forward: RefCell<Option<ChannelTx<Word>>>,
}

impl RingRx {
    pub fn new_and_register(
        engine: &mut Engine,
        parent: &Rc<Entity>,
        ring: Ring,
        dir: Direction,
        capacity: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, &format!("{dir}_rx_stage")));
        let (ring_input, rx) = channel(&entity, "ring_in", capacity)?;
        rx.connected_to(&entity);
        let rc_self = Rc::new(Self {
            entity,
            ring,
            dir,
            rx: RefCell::new(Some(rx)),
            ring_input: RefCell::new(Some(ring_input)),
            deliver: RefCell::new(None),
            forward: RefCell::new(None),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// The end the ring link writes to.
    pub fn take_ring_input(&self) -> Result<ChannelTx<Word>, SimError> {
        take_end(&self.entity, &self.ring_input, "ring_in")
    }

    /// Where bursts for this node go.
    pub fn connect_deliver(&self, tx: ChannelTx<Word>) -> SimResult {
        tx.connected_from(&self.entity);
        connect_end(&self.entity, &self.deliver, "deliver", tx)
    }

    /// Where bursts for ranks further along the ring go.
    pub fn connect_forward(&self, tx: ChannelTx<Word>) -> SimResult {
        tx.connected_from(&self.entity);
        connect_end(&self.entity, &self.forward, "forward", tx)
    }
}

#[async_trait(?Send)]
impl Runnable for RingRx {
    async fn run(&self) -> SimResult {
        let rx = connected(&self.entity, &self.rx, "ring_in")?;
        let deliver = connected(&self.entity, &self.deliver, "deliver")?;
        let forward = connected(&self.entity, &self.forward, "forward")?;
        let rank = self.ring.rank();

        loop {
            let word = rx.get().await;
            let header = Header::from_word(&word)?;
            trace!(self.entity ; "{}: {header}", self.dir);

            match header.collective {
                Collective::Barrier => stream_array(&header, &rx, &deliver).await,
                Collective::P2P => {
                    if header.dest == rank {
                        stream_array(&header, &rx, &deliver).await;
                    } else {
                        stream_array(&header, &rx, &forward).await;
                    }
                }
                Collective::Bcast => {
                    if header.dest == rank {
                        // End of the arc
                        stream_array(&header, &rx, &deliver).await;
                    } else {
                        fork_array(&header, &rx, &deliver, &forward).await;
                    }
                }
                Collective::Reduce | Collective::Scatter | Collective::Gather => {
                    error!(self.entity ; "{} not implemented, dropping {} words",
                        header.collective, header.count);
                    drain_array(&header, &rx).await;
                }
            }
        }
    }
}

/// Merges through traffic and locally issued traffic onto the ring link.
///
/// Whole bursts are relayed so that the two sources never interleave. The
/// sources take turns whenever both have something waiting.
pub struct RingTx {
    pub entity: Rc<Entity>,
    dir: Direction,

    rx: RefCell<Option<(ChannelRx<Word>, ChannelRx<Word>)>>,
    through_input: RefCell<Option<ChannelTx<Word>>>,
    local_input: RefCell<Option<ChannelTx<Word>>>,
    tx: RefCell<Option<ChannelTx<Word>>>,
}

impl RingTx {
    pub fn new_and_register(
        engine: &mut Engine,
        parent: &Rc<Entity>,
        dir: Direction,
        capacity: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, &format!("{dir}_tx_stage")));
        let (through_input, through_rx) = channel(&entity, "through", capacity)?;
        let (local_input, local_rx) = channel(&entity, "local", capacity)?;
        through_rx.connected_to(&entity);
        local_rx.connected_to(&entity);
        let rc_self = Rc::new(Self {
            entity,
            dir,
            rx: RefCell::new(Some((through_rx, local_rx))),
            through_input: RefCell::new(Some(through_input)),
            local_input: RefCell::new(Some(local_input)),
            tx: RefCell::new(None),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// The end the matching [RingRx] forwards on.
    pub fn take_through_input(&self) -> Result<ChannelTx<Word>, SimError> {
        take_end(&self.entity, &self.through_input, "through")
    }

    /// The end the router sends locally issued traffic on.
    pub fn take_local_input(&self) -> Result<ChannelTx<Word>, SimError> {
        take_end(&self.entity, &self.local_input, "local")
    }

    pub fn connect_ring_output(&self, tx: ChannelTx<Word>) -> SimResult {
        tx.connected_from(&self.entity);
        connect_end(&self.entity, &self.tx, "ring_out", tx)
    }
}

#[async_trait(?Send)]
impl Runnable for RingTx {
    async fn run(&self) -> SimResult {
        let (through, local) = connected(&self.entity, &self.rx, "inputs")?;
        let tx = connected(&self.entity, &self.tx, "ring_out")?;
        let arrivals = AnyOf::new(vec![Box::new(through.arrival()), Box::new(local.arrival())]);

        loop {
            let mut idle = true;
            for rx in [&through, &local] {
                if let Some(word) = rx.try_get() {
                    idle = false;
                    let header = Header::from_word(&word)?;
                    trace!(self.entity ; "{} {rx}: {header}", self.dir);
                    stream_array(&header, rx, &tx).await;
                }
            }
            if idle {
                arrivals.listen().await;
            }
        }
    }
}
