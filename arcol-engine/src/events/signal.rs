// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A notification that can be raised any number of times.
//!
//! A wait started with [`listen`](Event::listen) completes at the first
//! [`notify`](Signal::notify) after it started. Notifications made while
//! nobody is waiting are not remembered.

use std::cell::{Cell, RefCell};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::Future;
use futures::future::LocalBoxFuture;

use crate::traits::Event;

#[derive(Default)]
struct SignalState {
    raised: Cell<u64>,
    waiting: RefCell<Vec<Waker>>,
}

/// A repeatable notification shared by cloning.
#[derive(Clone, Default)]
pub struct Signal {
    state: Rc<SignalState>,
}

impl Signal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake every task currently waiting.
    pub fn notify(&self) {
        self.state.raised.set(self.state.raised.get() + 1);
        for waker in self.state.waiting.borrow_mut().drain(..) {
            waker.wake();
        }
    }

    /// How many times the signal has been raised.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.state.raised.get()
    }
}

impl Event<()> for Signal {
    fn listen(&self) -> LocalBoxFuture<'static, ()> {
        Box::pin(Raised {
            state: self.state.clone(),
            since: self.state.raised.get(),
        })
    }
}

struct Raised {
    state: Rc<SignalState>,
    since: u64,
}

impl Future for Raised {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.raised.get() != self.since {
            return Poll::Ready(());
        }
        self.state.waiting.borrow_mut().push(cx.waker().clone());
        Poll::Pending
    }
}
