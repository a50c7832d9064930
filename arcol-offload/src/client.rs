// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The client library used by compute logic to run collectives.
//!
//! Every rank calls the same collective with the same arguments. Values are
//! exchanged in whole words so buffers must hold
//! `count * elements_per_word::<T>()` elements.
//!
//! # Example
//!
//! ```rust
//! # use arcol_engine::engine::Engine;
//! # use arcol_offload::config::RingConfig;
//! # use arcol_offload::ring::build_ring;
//! # use arcol_track::tracker::dev_null_tracker;
//! let mut engine = Engine::new(&dev_null_tracker());
//! let config = RingConfig {
//!     size: 3,
//!     ..RingConfig::default()
//! };
//! let nodes = build_ring(&mut engine, &config).unwrap();
//!
//! for node in &nodes {
//!     let client = node.client();
//!     engine.spawn(async move {
//!         let mut values = [0.0_f32; 16];
//!         if client.rank() == 1 {
//!             values[0] = 1.5;
//!         }
//!         client.bcast(&mut values, 1, 1).await?;
//!         assert_eq!(values[0], 1.5);
//!         Ok(())
//!     });
//! }
//! engine.run().unwrap();
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use arcol_engine::channel::{ChannelRx, ChannelTx};
use arcol_engine::sim_error;
use arcol_engine::types::{SimError, SimResult};
use arcol_track::entity::Entity;
use arcol_track::{debug, trace};

use crate::topology::Ring;
use crate::wire::{Collective, Datatype, Element, Header, Word, elements_per_word, pack, unpack_word};

/// Barrier tokens are always rooted at rank 0.
const BARRIER_ROOT: u32 = 0;

/// A burst read from the offload that no collective was waiting for yet.
struct Pending {
    header: Header,
    words: Vec<Word>,
}

pub struct ArcClient {
    pub entity: Rc<Entity>,
    ring: Ring,
    offload_in: ChannelTx<Word>,
    offload_out: ChannelRx<Word>,

    /// Bursts that arrived ahead of the collective they belong to, in order
    /// of arrival.
    pending: RefCell<VecDeque<Pending>>,
}

impl ArcClient {
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        ring: Ring,
        offload_in: ChannelTx<Word>,
        offload_out: ChannelRx<Word>,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, "client"));
        offload_in.connected_from(&entity);
        offload_out.connected_to(&entity);
        Self {
            entity,
            ring,
            offload_in,
            offload_out,
            pending: RefCell::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn rank(&self) -> u32 {
        self.ring.rank()
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.ring.size()
    }

    /// Send `count` words of `values` from `root` to `dest`.
    ///
    /// The root returns as soon as the burst is issued. Ranks other than the
    /// root and destination return immediately.
    pub async fn p2p<T: Element>(
        &self,
        values: &mut [T],
        count: u32,
        root: u32,
        dest: u32,
    ) -> SimResult {
        self.check_rank("root", root)?;
        self.check_rank("dest", dest)?;
        let len = self.check_len::<T>(values.len(), count)?;
        let header = Header::new(Collective::P2P, T::DATATYPE, count, root, dest);
        let rank = self.rank();

        if rank == root && rank == dest {
            // Loops back through the router so send and receive together
            let words = pack(&values[..len]);
            let ((), received) = futures::join!(
                self.send(&header, &words),
                self.receive(&header, &mut values[..len])
            );
            received
        } else if rank == root {
            self.send(&header, &pack(&values[..len])).await;
            Ok(())
        } else if rank == dest {
            self.receive(&header, &mut values[..len]).await
        } else {
            Ok(())
        }
    }

    /// Copy `count` words of `values` from `root` to every other rank.
    pub async fn bcast<T: Element>(&self, values: &mut [T], count: u32, root: u32) -> SimResult {
        self.check_rank("root", root)?;
        let len = self.check_len::<T>(values.len(), count)?;
        let header = Header::new(Collective::Bcast, T::DATATYPE, count, root, root);

        if self.rank() == root {
            self.send(&header, &pack(&values[..len])).await;
            Ok(())
        } else {
            self.receive(&header, &mut values[..len]).await
        }
    }

    /// Wait until every rank has entered the barrier.
    ///
    /// Rank 0 sends an arrival token round the ring which each rank passes on
    /// once it has arrived. When the token returns rank 0 sends a release
    /// token round the same way.
    pub async fn barrier(&self) -> SimResult {
        if self.size() == 1 {
            return Ok(());
        }

        let token = Header::new(Collective::Barrier, Datatype::UInt32, 0, BARRIER_ROOT, 0);
        if self.rank() == BARRIER_ROOT {
            for phase in ["arrival", "release"] {
                debug!(self.entity ; "barrier {phase} start");
                self.send(&token, &[]).await;
                self.receive::<u32>(&token, &mut []).await?;
            }
        } else {
            for phase in ["arrival", "release"] {
                self.receive::<u32>(&token, &mut []).await?;
                debug!(self.entity ; "barrier {phase} pass on");
                self.send(&token, &[]).await;
            }
        }
        Ok(())
    }

    async fn send(&self, header: &Header, words: &[Word]) {
        trace!(self.entity ; "send {header}");
        self.offload_in.put(header.to_word()).await;
        for word in words {
            self.offload_in.put(*word).await;
        }
    }

    /// Fill `values` from the first burst matching `expected`.
    ///
    /// Ranks leave a barrier at different times, so a burst for the next
    /// collective can overtake the barrier token. Bursts that do not match
    /// are held until a later `receive` asks for them.
    async fn receive<T: Element>(&self, expected: &Header, values: &mut [T]) -> SimResult {
        let words = match self.take_pending(expected) {
            Some(words) => words,
            None => loop {
                let header = Header::from_word(&self.offload_out.get().await)?;
                let mut words = Vec::with_capacity(header.count as usize);
                for _ in 0..header.count {
                    words.push(self.offload_out.get().await);
                }
                if same_burst(&header, expected) {
                    break words;
                }
                debug!(self.entity ; "hold {header} while waiting for {expected}");
                self.pending.borrow_mut().push_back(Pending { header, words });
            },
        };
        trace!(self.entity ; "receive {expected}");

        for (word, chunk) in words.iter().zip(values.chunks_mut(elements_per_word::<T>())) {
            unpack_word(word, chunk);
        }
        Ok(())
    }

    fn take_pending(&self, expected: &Header) -> Option<Vec<Word>> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|p| same_burst(&p.header, expected))?;
        pending.remove(index).map(|p| p.words)
    }

    fn check_rank(&self, what: &str, rank: u32) -> SimResult {
        if rank >= self.size() {
            return sim_error!(format!(
                "{}: {what} {rank} outside ring of {}",
                self.entity,
                self.size()
            ));
        }
        Ok(())
    }

    /// Returns the number of elements `count` words carry.
    fn check_len<T: Element>(&self, len: usize, count: u32) -> Result<usize, SimError> {
        let needed = count as usize * elements_per_word::<T>();
        if len < needed {
            return sim_error!(format!(
                "{}: {count} words of {} need {needed} values, buffer holds {len}",
                self.entity,
                T::DATATYPE
            ));
        }
        Ok(needed)
    }
}

/// Whether a received `header` carries the burst described by `expected`.
fn same_burst(header: &Header, expected: &Header) -> bool {
    header.collective == expected.collective
        && header.datatype == expected.datatype
        && header.count == expected.count
        && header.root == expected.root
}
