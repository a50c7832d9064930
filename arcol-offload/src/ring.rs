// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Build a complete ring of nodes and wire each one to its neighbours.

use arcol_engine::engine::Engine;
use arcol_engine::types::SimError;
use arcol_track::info;

use crate::config::RingConfig;
use crate::link::SerialLink;
use crate::node::Node;
use crate::topology::{Direction, Ring};

/// Create `config.size` nodes connected in a ring.
///
/// Node `r` sends eastbound traffic to node `r + 1` and westbound traffic to
/// node `r - 1`. With a non-zero link latency every connection goes through a
/// [SerialLink].
pub fn build_ring(engine: &mut Engine, config: &RingConfig) -> Result<Vec<Node>, SimError> {
    config.validate()?;

    let top = engine.top().clone();
    let nodes = (0..config.size)
        .map(|rank| Node::new_and_register(engine, &top, Ring::new(rank, config.size), config))
        .collect::<Result<Vec<_>, _>>()?;

    let clock = engine.default_clock();
    for node in &nodes {
        let ring = node.ring();
        for dir in Direction::ALL {
            let neighbour = &nodes[ring.neighbour(dir) as usize];
            let input = neighbour.take_ring_input(dir)?;
            if config.link_latency_ticks == 0 {
                node.connect_ring_output(dir, input)?;
            } else {
                let link = SerialLink::new_and_register(
                    engine,
                    &clock,
                    &node.entity,
                    &format!("{dir}_link"),
                    config.link_latency_ticks,
                    config.channel_capacity,
                )?;
                link.connect_tx(input)?;
                node.connect_ring_output(dir, link.take_input()?)?;
            }
        }
    }

    info!(top ; "built {} ring of {} ranks", config.deployment, config.size);
    Ok(nodes)
}
