// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `ARCOL` offload: ring collectives offloaded to per-node routers.
//!
//! Each rank of the ring has a [router](crate::router::OffloadRouter) that
//! moves 64-byte [words](crate::wire::Word) between three places: the
//! eastbound ring, the westbound ring and the local client. Collectives are
//! sent as bursts, a header word followed by a payload, and routed using
//! nothing but the header and the [ring](crate::topology::Ring) arithmetic.
//!
//! A ring is built with [build_ring](crate::ring::build_ring) and driven
//! through the [client](crate::client::ArcClient) of each node.

pub mod client;
pub mod config;
pub mod connect;
pub mod forward;
pub mod link;
pub mod node;
pub mod relay;
pub mod ring;
pub mod router;
pub mod test_helpers;
pub mod topology;
pub mod wire;
