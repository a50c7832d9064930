// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! One rank of the ring: its router, its relay stages when staged, and the
//! client that local compute logic uses.

use std::rc::Rc;

use arcol_engine::channel::{ChannelTx, channel};
use arcol_engine::engine::Engine;
use arcol_engine::types::{SimError, SimResult};
use arcol_track::debug;
use arcol_track::entity::Entity;

use crate::client::ArcClient;
use crate::config::{Deployment, RingConfig};
use crate::relay::{RingRx, RingTx};
use crate::router::OffloadRouter;
use crate::topology::{ByDirection, Direction, Ring};
use crate::wire::Word;

struct Stage {
    rx: Rc<RingRx>,
    tx: Rc<RingTx>,
}

enum Stages {
    Direct,
    Staged(ByDirection<Stage>),
}

pub struct Node {
    pub entity: Rc<Entity>,
    ring: Ring,
    router: Rc<OffloadRouter>,
    stages: Stages,
    client: Rc<ArcClient>,
}

impl Node {
    pub fn new_and_register(
        engine: &mut Engine,
        parent: &Rc<Entity>,
        ring: Ring,
        config: &RingConfig,
    ) -> Result<Self, SimError> {
        let entity = Rc::new(Entity::new(parent, &format!("node{}", ring.rank())));
        let capacity = config.channel_capacity;
        let router = OffloadRouter::new_and_register(engine, &entity, "router", ring, capacity)?;

        let (offload_out, client_rx) = channel(&entity, "offload_out", capacity)?;
        router.connect_offload_output(offload_out)?;
        let client = Rc::new(ArcClient::new(
            &entity,
            ring,
            router.take_offload_input()?,
            client_rx,
        ));

        let stages = match config.deployment {
            Deployment::Direct => Stages::Direct,
            Deployment::Staged => {
                let mut stage = |dir| -> Result<Stage, SimError> {
                    let rx = RingRx::new_and_register(engine, &entity, ring, dir, capacity)?;
                    let tx = RingTx::new_and_register(engine, &entity, dir, capacity)?;
                    rx.connect_deliver(router.take_ring_input(dir)?)?;
                    rx.connect_forward(tx.take_through_input()?)?;
                    router.connect_ring_output(dir, tx.take_local_input()?)?;
                    Ok(Stage { rx, tx })
                };
                Stages::Staged(ByDirection {
                    east: stage(Direction::East)?,
                    west: stage(Direction::West)?,
                })
            }
        };
        debug!(entity ; "{} node, rank {ring}", config.deployment);

        Ok(Self {
            entity,
            ring,
            router,
            stages,
            client,
        })
    }

    /// The end the neighbour writes traffic travelling in `dir` to.
    pub fn take_ring_input(&self, dir: Direction) -> Result<ChannelTx<Word>, SimError> {
        match &self.stages {
            Stages::Direct => self.router.take_ring_input(dir),
            Stages::Staged(stages) => stages.get(dir).rx.take_ring_input(),
        }
    }

    /// Send traffic leaving in `dir` to `tx`.
    pub fn connect_ring_output(&self, dir: Direction, tx: ChannelTx<Word>) -> SimResult {
        match &self.stages {
            Stages::Direct => self.router.connect_ring_output(dir, tx),
            Stages::Staged(stages) => stages.get(dir).tx.connect_ring_output(tx),
        }
    }

    #[must_use]
    pub fn ring(&self) -> Ring {
        self.ring
    }

    #[must_use]
    pub fn client(&self) -> Rc<ArcClient> {
        self.client.clone()
    }

    #[must_use]
    pub fn router(&self) -> &Rc<OffloadRouter> {
        &self.router
    }
}
