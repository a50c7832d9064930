// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The offload router decides where every burst arriving at a node goes next.
//!
//! # Channels
//!
//! The router owns three inputs and drives three outputs:
//!  - `east_rx`/`west_rx`: eastbound/westbound traffic arriving from the ring
//!  - `offload_in`: bursts issued by the local client
//!  - `east_tx`/`west_tx`: traffic leaving towards `rank + 1`/`rank - 1`
//!  - `offload_out`: bursts delivered to the local client
//!
//! # Function
//!
//! Each pass of the main loop looks at every input in turn, east first, and
//! handles at most one burst from each. When no input has anything waiting the
//! router sleeps until one does.
//!
//! ```text
//! loop {
//!     east_rx    -> offload_out
//!     west_rx    -> offload_out
//!     offload_in -> east_tx | west_tx | both | offload_out
//! }
//! ```
//!
//! Bursts that reach the router from the ring have arrived. Locally issued
//! bursts are routed by collective:
//!  - `Barrier`: the header alone goes east.
//!  - `P2P`: the burst takes the shorter way round to `dest`, east on a tie.
//!  - `Bcast`: the burst is split in two halves that each cover one arc of the
//!    ring, with `dest` rewritten to the last rank of the arc.
//!
//! Collectives that are defined on the wire but not implemented are reported
//! and their payload is dropped.

use std::cell::RefCell;
use std::rc::Rc;

use arcol_engine::channel::{ChannelRx, ChannelTx, channel};
use arcol_engine::engine::Engine;
use arcol_engine::events::any_of::AnyOf;
use arcol_engine::sim_error;
use arcol_engine::traits::{Event, Runnable};
use arcol_engine::types::{SimError, SimResult};
use arcol_track::entity::Entity;
use arcol_track::{enter, error, exit, trace};
use async_trait::async_trait;

use crate::connect::{connect_end, connected, take_end};
use crate::forward::{drain_array, fork_array_dest, stream_array};
use crate::topology::{BcastArcs, ByDirection, Direction, Ring};
use crate::wire::{Collective, Header, Word};

/// The channels the router reads from once it is running.
struct Inputs {
    ring: ByDirection<ChannelRx<Word>>,
    offload: ChannelRx<Word>,
}

/// The channels the router writes to once it is running.
struct Outputs {
    ring: ByDirection<ChannelTx<Word>>,
    offload: ChannelTx<Word>,
}

pub struct OffloadRouter {
    pub entity: Rc<Entity>,
    ring: Ring,

    inputs: RefCell<Option<Inputs>>,
    ring_input: ByDirection<RefCell<Option<ChannelTx<Word>>>>,
    offload_input: RefCell<Option<ChannelTx<Word>>>,

    ring_output: ByDirection<RefCell<Option<ChannelTx<Word>>>>,
    offload_output: RefCell<Option<ChannelTx<Word>>>,
}

impl OffloadRouter {
    pub fn new_and_register(
        engine: &mut Engine,
        parent: &Rc<Entity>,
        name: &str,
        ring: Ring,
        capacity: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let (east_in, east_rx) = channel(&entity, "east_rx", capacity)?;
        let (west_in, west_rx) = channel(&entity, "west_rx", capacity)?;
        let (offload_in, offload_rx) = channel(&entity, "offload_in", capacity)?;
        for rx in [&east_rx, &west_rx, &offload_rx] {
            rx.connected_to(&entity);
        }

        let rc_self = Rc::new(Self {
            entity,
            ring,
            inputs: RefCell::new(Some(Inputs {
                ring: ByDirection {
                    east: east_rx,
                    west: west_rx,
                },
                offload: offload_rx,
            })),
            ring_input: ByDirection {
                east: RefCell::new(Some(east_in)),
                west: RefCell::new(Some(west_in)),
            },
            offload_input: RefCell::new(Some(offload_in)),
            ring_output: ByDirection::default(),
            offload_output: RefCell::new(None),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// The end that feeds traffic travelling in `dir` into this router.
    pub fn take_ring_input(&self, dir: Direction) -> Result<ChannelTx<Word>, SimError> {
        take_end(&self.entity, self.ring_input.get(dir), &format!("{dir}_rx"))
    }

    /// The end the local client issues bursts on.
    pub fn take_offload_input(&self) -> Result<ChannelTx<Word>, SimError> {
        take_end(&self.entity, &self.offload_input, "offload_in")
    }

    /// Send traffic leaving in `dir` to `tx`.
    pub fn connect_ring_output(&self, dir: Direction, tx: ChannelTx<Word>) -> SimResult {
        tx.connected_from(&self.entity);
        connect_end(&self.entity, self.ring_output.get(dir), &format!("{dir}_tx"), tx)
    }

    /// Deliver arriving bursts to `tx`.
    pub fn connect_offload_output(&self, tx: ChannelTx<Word>) -> SimResult {
        tx.connected_from(&self.entity);
        connect_end(&self.entity, &self.offload_output, "offload_out", tx)
    }

    #[must_use]
    pub fn ring(&self) -> Ring {
        self.ring
    }

    async fn from_ring(
        &self,
        dir: Direction,
        header: &Header,
        rx: &ChannelRx<Word>,
        outputs: &Outputs,
    ) -> SimResult {
        match header.collective {
            Collective::Barrier | Collective::P2P | Collective::Bcast => {
                trace!(self.entity ; "{dir} arrival: {header}");
                stream_array(header, rx, &outputs.offload).await;
            }
            Collective::Reduce | Collective::Scatter | Collective::Gather => {
                self.drop_unimplemented(header, rx).await;
            }
        }
        Ok(())
    }

    async fn from_offload(
        &self,
        header: &Header,
        rx: &ChannelRx<Word>,
        outputs: &Outputs,
    ) -> SimResult {
        match header.collective {
            Collective::Barrier => {
                drain_array(header, rx).await;
                let token = Header {
                    count: 0,
                    ..*header
                };
                trace!(self.entity ; "barrier token east");
                outputs.ring.east.put(token.to_word()).await;
            }
            Collective::P2P => {
                let dest = header.dest;
                if dest >= self.ring.size() {
                    return sim_error!(format!(
                        "{}: p2p destination {dest} outside ring of {}",
                        self.entity,
                        self.ring.size()
                    ));
                }
                if dest == self.ring.rank() {
                    trace!(self.entity ; "p2p to self");
                    stream_array(header, rx, &outputs.offload).await;
                } else {
                    let dir = self.ring.direction_to(dest);
                    trace!(self.entity ; "p2p to {dest} via {dir}");
                    stream_array(header, rx, outputs.ring.get(dir)).await;
                }
            }
            Collective::Bcast => {
                let BcastArcs { east, west } = self.ring.bcast_arcs();
                trace!(self.entity ; "bcast arcs east={east:?} west={west:?}");
                match (east, west) {
                    (Some(east_end), Some(west_end)) => {
                        fork_array_dest(
                            header,
                            rx,
                            &outputs.ring.east,
                            east_end,
                            &outputs.ring.west,
                            west_end,
                        )
                        .await;
                    }
                    (Some(end), None) => {
                        stream_array(&header.with_dest(end), rx, &outputs.ring.east).await;
                    }
                    (None, Some(end)) => {
                        stream_array(&header.with_dest(end), rx, &outputs.ring.west).await;
                    }
                    (None, None) => drain_array(header, rx).await,
                }
            }
            Collective::Reduce | Collective::Scatter | Collective::Gather => {
                self.drop_unimplemented(header, rx).await;
            }
        }
        Ok(())
    }

    async fn drop_unimplemented(&self, header: &Header, rx: &ChannelRx<Word>) {
        error!(self.entity ; "{} not implemented, dropping {} words from {rx}",
            header.collective, header.count);
        drain_array(header, rx).await;
    }
}

#[async_trait(?Send)]
impl Runnable for OffloadRouter {
    async fn run(&self) -> SimResult {
        let inputs = connected(&self.entity, &self.inputs, "inputs")?;
        let outputs = Outputs {
            ring: ByDirection {
                east: connected(&self.entity, &self.ring_output.east, "east_tx")?,
                west: connected(&self.entity, &self.ring_output.west, "west_tx")?,
            },
            offload: connected(&self.entity, &self.offload_output, "offload_out")?,
        };

        let arrivals = AnyOf::new(vec![
            Box::new(inputs.ring.east.arrival()),
            Box::new(inputs.ring.west.arrival()),
            Box::new(inputs.offload.arrival()),
        ]);

        loop {
            let mut idle = true;

            for dir in Direction::ALL {
                let rx = inputs.ring.get(dir);
                if let Some(word) = rx.try_get() {
                    idle = false;
                    let header = Header::from_word(&word)?;
                    let burst = self.entity.tracker.unique_id();
                    enter!(self.entity ; burst);
                    self.from_ring(dir, &header, rx, &outputs).await?;
                    exit!(self.entity ; burst);
                }
            }

            if let Some(word) = inputs.offload.try_get() {
                idle = false;
                let header = Header::from_word(&word)?;
                let burst = self.entity.tracker.unique_id();
                enter!(self.entity ; burst);
                self.from_offload(&header, &inputs.offload, &outputs)
                    .await?;
                exit!(self.entity ; burst);
            }

            if idle {
                arrivals.listen().await;
            }
        }
    }
}
