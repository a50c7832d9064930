// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Single-threaded executor.
//!
//! Woken tasks are polled in the order they were woken. When the run queue
//! empties, simulated time moves on to the next tick any task is waiting for.
//! A run ends when the queue is empty and no clock has anything pending.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use arcol_track::entity::Entity;
use futures::future::LocalBoxFuture;

use crate::time::clock::Clock;
use crate::time::simtime::SimTime;
use crate::types::SimResult;

struct Task {
    /// `None` once finished, so that late wakes are harmless.
    future: RefCell<Option<LocalBoxFuture<'static, SimResult>>>,
    queued: Cell<bool>,
    shared: Rc<Shared>,
}

impl Task {
    fn wake(self: &Rc<Self>) {
        if !self.queued.replace(true) {
            self.shared.run_queue.borrow_mut().push_back(self.clone());
        }
    }

    fn poll(self: &Rc<Self>) -> SimResult {
        self.queued.set(false);
        let waker = task_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        let mut slot = self.future.borrow_mut();
        let Some(future) = slot.as_mut() else {
            return Ok(());
        };
        match future.as_mut().poll(&mut cx) {
            Poll::Pending => Ok(()),
            Poll::Ready(result) => {
                *slot = None;
                result
            }
        }
    }
}

// Wakers hold a strong count on their `Rc<Task>`. Tasks never leave the
// executor's thread.
static TASK_WAKER: RawWakerVTable = RawWakerVTable::new(clone_waker, wake, wake_by_ref, drop_waker);

fn task_waker(task: Rc<Task>) -> Waker {
    let raw = RawWaker::new(Rc::into_raw(task).cast(), &TASK_WAKER);
    unsafe { Waker::from_raw(raw) }
}

unsafe fn clone_waker(data: *const ()) -> RawWaker {
    unsafe { Rc::increment_strong_count(data.cast::<Task>()) };
    RawWaker::new(data, &TASK_WAKER)
}

unsafe fn wake(data: *const ()) {
    let task = unsafe { Rc::from_raw(data.cast::<Task>()) };
    task.wake();
}

unsafe fn wake_by_ref(data: *const ()) {
    unsafe { Rc::increment_strong_count(data.cast::<Task>()) };
    unsafe { wake(data) };
}

unsafe fn drop_waker(data: *const ()) {
    drop(unsafe { Rc::from_raw(data.cast::<Task>()) });
}

struct Shared {
    run_queue: RefCell<VecDeque<Rc<Task>>>,
    time: RefCell<SimTime>,
}

impl Shared {
    fn spawn(self: &Rc<Self>, future: impl Future<Output = SimResult> + 'static) {
        let task = Rc::new(Task {
            future: RefCell::new(Some(Box::pin(future))),
            queued: Cell::new(false),
            shared: self.clone(),
        });
        task.wake();
    }
}

/// Runs the tasks of one simulation.
pub struct Executor {
    shared: Rc<Shared>,
}

impl Executor {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.shared.spawn(future);
    }

    /// Run until there is nothing left to do, or until a task fails.
    pub fn run(&self) -> SimResult {
        loop {
            while let Some(task) = self.next_task() {
                task.poll()?;
            }
            let Some(wakers) = self.shared.time.borrow_mut().advance() else {
                return Ok(());
            };
            wakers.into_iter().for_each(Waker::wake);
        }
    }

    fn next_task(&self) -> Option<Rc<Task>> {
        self.shared.run_queue.borrow_mut().pop_front()
    }

    pub fn clock(&self, freq_mhz: f64) -> Clock {
        self.shared.time.borrow_mut().clock(freq_mhz)
    }

    pub fn time_now_ns(&self) -> f64 {
        self.shared.time.borrow().now_ns()
    }
}

/// Lets components spawn tasks of their own while the simulation runs.
#[derive(Clone)]
pub struct Spawner {
    shared: Rc<Shared>,
}

impl Spawner {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.shared.spawn(future);
    }
}

/// An executor and a spawner feeding it. Time is tracked under `parent`.
pub fn new_executor_and_spawner(parent: &Rc<Entity>) -> (Executor, Spawner) {
    let shared = Rc::new(Shared {
        run_queue: RefCell::new(VecDeque::new()),
        time: RefCell::new(SimTime::new(parent)),
    });
    (
        Executor {
            shared: shared.clone(),
        },
        Spawner { shared },
    )
}
