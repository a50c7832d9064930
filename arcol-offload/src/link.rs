// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! An emulated serial link between two neighbouring nodes.
//!
//! A word can enter the link every clock tick and leaves it `latency_ticks`
//! later. If the far end stops accepting words the link fills up and then
//! holds back its own input.
//!
//! The link is split into two halves that run as separate tasks, one
//! accepting words and one delivering them, so that the input keeps moving
//! while words are in flight.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use arcol_engine::channel::{ChannelRx, ChannelTx, channel};
use arcol_engine::engine::Engine;
use arcol_engine::events::signal::Signal;
use arcol_engine::executor::Spawner;
use arcol_engine::sim_error;
use arcol_engine::time::clock::Clock;
use arcol_engine::traits::{Event, Runnable};
use arcol_engine::types::{SimError, SimResult};
use arcol_track::entity::Entity;
use arcol_track::trace;
use async_trait::async_trait;

use crate::connect::{connect_end, connected, take_end};
use crate::wire::Word;

/// Words on the wire with the tick at which each one arrives.
type InFlight = Rc<RefCell<VecDeque<(Word, u64)>>>;

pub struct SerialLink {
    pub entity: Rc<Entity>,
    spawner: Spawner,
    clock: Clock,
    latency_ticks: u64,

    rx: RefCell<Option<ChannelRx<Word>>>,
    input: RefCell<Option<ChannelTx<Word>>>,
    tx: RefCell<Option<ChannelTx<Word>>>,

    in_flight: InFlight,
    launched: Signal,
    landed: Signal,
}

impl SerialLink {
    pub fn new_and_register(
        engine: &mut Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        latency_ticks: u64,
        capacity: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        if latency_ticks == 0 {
            return sim_error!(format!("{entity}: link latency must be at least one tick"));
        }
        let (input, rx) = channel(&entity, "rx", capacity)?;
        rx.connected_to(&entity);
        let rc_self = Rc::new(Self {
            entity,
            spawner: engine.spawner(),
            clock: clock.clone(),
            latency_ticks,
            rx: RefCell::new(Some(rx)),
            input: RefCell::new(Some(input)),
            tx: RefCell::new(None),
            in_flight: Rc::new(RefCell::new(VecDeque::new())),
            launched: Signal::new(),
            landed: Signal::new(),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// The end the transmitting node writes to.
    pub fn take_input(&self) -> Result<ChannelTx<Word>, SimError> {
        take_end(&self.entity, &self.input, "rx")
    }

    /// The receiving node's input.
    pub fn connect_tx(&self, tx: ChannelTx<Word>) -> SimResult {
        tx.connected_from(&self.entity);
        connect_end(&self.entity, &self.tx, "tx", tx)
    }
}

#[async_trait(?Send)]
impl Runnable for SerialLink {
    async fn run(&self) -> SimResult {
        let tx = connected(&self.entity, &self.tx, "tx")?;
        {
            let entity = self.entity.clone();
            let clock = self.clock.clone();
            let in_flight = self.in_flight.clone();
            let launched = self.launched.clone();
            let landed = self.landed.clone();
            self.spawner.spawn(async move {
                run_tx(entity, tx, clock, in_flight, launched, landed).await
            });
        }

        let rx = connected(&self.entity, &self.rx, "rx")?;
        let capacity = usize::try_from(self.latency_ticks).unwrap_or(usize::MAX);
        loop {
            let word = rx.get().await;
            let arrives = self.clock.tick_now() + self.latency_ticks;
            self.in_flight.borrow_mut().push_back((word, arrives));
            self.launched.notify();

            self.clock.wait_ticks(1).await;

            // The wire only holds one word per tick of latency
            while self.in_flight.borrow().len() >= capacity {
                self.landed.listen().await;
            }
        }
    }
}

async fn run_tx(
    entity: Rc<Entity>,
    tx: ChannelTx<Word>,
    clock: Clock,
    in_flight: InFlight,
    launched: Signal,
    landed: Signal,
) -> SimResult {
    loop {
        let next = in_flight.borrow().front().copied();
        match next {
            Some((word, arrives)) => {
                let now = clock.tick_now();
                if arrives > now {
                    clock.wait_ticks(arrives - now).await;
                }
                trace!(entity ; "word landed");
                tx.put(word).await;
                in_flight.borrow_mut().pop_front();
                landed.notify();
            }
            None => {
                launched.listen().await;
            }
        }
    }
}
