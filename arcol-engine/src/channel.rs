// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Bounded single-producer/single-consumer channels.
//!
//! A channel is created as a pair of ends. The [ChannelTx] end is owned by the
//! one task that writes to the channel and the [ChannelRx] end by the one task
//! that reads from it. Values are delivered in the order they were put.
//!
//! Writers are held back when the channel is full:
//!
//! ```rust
//! # use arcol_engine::channel::channel;
//! # use arcol_engine::engine::Engine;
//! # use arcol_track::tracker::dev_null_tracker;
//! let mut engine = Engine::new(&dev_null_tracker());
//! let (tx, rx) = channel(engine.top(), "link", 2).unwrap();
//!
//! engine.spawn(async move {
//!     for i in 0..10 {
//!         tx.put(i).await;
//!     }
//!     Ok(())
//! });
//! engine.spawn(async move {
//!     for i in 0..10 {
//!         assert_eq!(rx.get().await, i);
//!     }
//!     Ok(())
//! });
//! engine.run().unwrap();
//! ```
//!
//! A reader that serves several channels can park on all of them at once using
//! the [arrival](ChannelRx::arrival) events combined in an
//! [AnyOf](crate::events::any_of::AnyOf).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use arcol_track::entity::Entity;
use arcol_track::{connect, trace};
use futures::Future;
use futures::future::LocalBoxFuture;

use crate::sim_error;
use crate::traits::Event;
use crate::types::SimError;

struct ChannelState<T> {
    entity: Rc<Entity>,
    capacity: usize,
    buffer: RefCell<VecDeque<T>>,
    waiting_get: RefCell<Option<Waker>>,
    waiting_put: RefCell<Option<Waker>>,
}

impl<T> ChannelState<T> {
    fn wake_reader(&self) {
        if let Some(waker) = self.waiting_get.borrow_mut().take() {
            waker.wake();
        }
    }

    fn wake_writer(&self) {
        if let Some(waker) = self.waiting_put.borrow_mut().take() {
            waker.wake();
        }
    }

    fn pop(&self) -> Option<T> {
        let value = self.buffer.borrow_mut().pop_front();
        if value.is_some() {
            trace!(self.entity ; "get ({} left)", self.buffer.borrow().len());
            self.wake_writer();
        }
        value
    }
}

/// Create a channel that can hold up to `capacity` values.
///
/// The `name` is used to create the channel's [Entity] under `parent`.
pub fn channel<T>(
    parent: &Rc<Entity>,
    name: &str,
    capacity: usize,
) -> Result<(ChannelTx<T>, ChannelRx<T>), SimError>
where
    T: 'static,
{
    let entity = Rc::new(Entity::new(parent, name));
    if capacity == 0 {
        return sim_error!(format!("{entity}: channel capacity must be at least 1"));
    }

    let state = Rc::new(ChannelState {
        entity,
        capacity,
        buffer: RefCell::new(VecDeque::with_capacity(capacity)),
        waiting_get: RefCell::new(None),
        waiting_put: RefCell::new(None),
    });
    Ok((
        ChannelTx {
            state: state.clone(),
        },
        ChannelRx { state },
    ))
}

/// The sending end of a channel.
pub struct ChannelTx<T> {
    state: Rc<ChannelState<T>>,
}

impl<T> ChannelTx<T>
where
    T: 'static,
{
    /// Returns a future that completes once `value` is in the channel.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn put(&self, value: T) -> ChannelPut<T> {
        ChannelPut {
            state: self.state.clone(),
            value: RefCell::new(Some(value)),
        }
    }

    /// Record that this channel is driven by `from`.
    pub fn connected_from(&self, from: &Entity) {
        connect!(from ; self.state.entity);
    }

    #[must_use]
    pub fn entity(&self) -> &Rc<Entity> {
        &self.state.entity
    }
}

impl<T> fmt::Display for ChannelTx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.state.entity.fmt(f)
    }
}

/// The receiving end of a channel.
pub struct ChannelRx<T> {
    state: Rc<ChannelState<T>>,
}

impl<T> ChannelRx<T>
where
    T: 'static,
{
    /// Returns a future that completes with the next value in the channel.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn get(&self) -> ChannelGet<T> {
        ChannelGet {
            state: self.state.clone(),
        }
    }

    /// Take the next value if there is one. Never waits.
    pub fn try_get(&self) -> Option<T> {
        self.state.pop()
    }

    /// Number of values waiting in the channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.buffer.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.buffer.borrow().is_empty()
    }

    /// An event that fires when the channel holds at least one value.
    #[must_use]
    pub fn arrival(&self) -> Arrival<T> {
        Arrival {
            state: self.state.clone(),
        }
    }

    /// Record that this channel feeds `to`.
    pub fn connected_to(&self, to: &Entity) {
        connect!(self.state.entity ; to);
    }

    #[must_use]
    pub fn entity(&self) -> &Rc<Entity> {
        &self.state.entity
    }
}

impl<T> fmt::Display for ChannelRx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.state.entity.fmt(f)
    }
}

pub struct ChannelPut<T> {
    state: Rc<ChannelState<T>>,
    value: RefCell<Option<T>>,
}

impl<T> Future for ChannelPut<T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let len = self.state.buffer.borrow().len();
        if len < self.state.capacity {
            if let Some(value) = self.value.borrow_mut().take() {
                self.state.buffer.borrow_mut().push_back(value);
                trace!(self.state.entity ; "put ({} queued)", len + 1);
                self.state.wake_reader();
            }
            Poll::Ready(())
        } else {
            // Full, wait for the reader to make space
            *self.state.waiting_put.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

pub struct ChannelGet<T> {
    state: Rc<ChannelState<T>>,
}

impl<T> Future for ChannelGet<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.state.pop() {
            Some(value) => Poll::Ready(value),
            None => {
                *self.state.waiting_get.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// The [Event] returned by [ChannelRx::arrival].
///
/// Listening does not consume anything from the channel.
pub struct Arrival<T> {
    state: Rc<ChannelState<T>>,
}

impl<T> Clone for Arrival<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Event<()> for Arrival<T>
where
    T: 'static,
{
    fn listen(&self) -> LocalBoxFuture<'static, ()> {
        Box::pin(ArrivalFuture {
            state: self.state.clone(),
        })
    }
}

struct ArrivalFuture<T> {
    state: Rc<ChannelState<T>>,
}

impl<T> Future for ArrivalFuture<T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.buffer.borrow().is_empty() {
            *self.state.waiting_get.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

#[cfg(test)]
mod tests {
    use arcol_track::entity::toplevel;
    use arcol_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn zero_capacity_rejected() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let result = channel::<u32>(&top, "c", 0);
        assert!(result.is_err());
    }

    #[test]
    fn try_get_in_order() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let (tx, rx) = channel(&top, "c", 4).unwrap();

        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        for i in 0..3 {
            let mut put = Box::pin(tx.put(i));
            assert!(put.as_mut().poll(&mut cx).is_ready());
        }

        assert_eq!(rx.len(), 3);
        assert_eq!(rx.try_get(), Some(0));
        assert_eq!(rx.try_get(), Some(1));
        assert_eq!(rx.try_get(), Some(2));
        assert_eq!(rx.try_get(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn put_blocks_when_full() {
        let tracker = dev_null_tracker();
        let top = toplevel(&tracker, "top");
        let (tx, rx) = channel(&top, "c", 1).unwrap();

        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut first = Box::pin(tx.put(10));
        assert!(first.as_mut().poll(&mut cx).is_ready());

        let mut second = Box::pin(tx.put(20));
        assert!(second.as_mut().poll(&mut cx).is_pending());
        assert_eq!(rx.try_get(), Some(10));
        assert!(second.as_mut().poll(&mut cx).is_ready());
        assert_eq!(rx.try_get(), Some(20));
    }
}
