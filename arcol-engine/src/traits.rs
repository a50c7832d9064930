// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The two seams between models and the engine.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;

use crate::types::SimResult;

/// Something a task can wait for.
///
/// Each call to `listen` starts a fresh wait, so the same event can be
/// waited on over and over.
pub trait Event<T> {
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    fn listen(&self) -> LocalBoxFuture<'static, T>;
}

/// A long-running model component.
///
/// Components are registered with the [`Engine`](crate::engine::Engine),
/// which spawns `run()` when the simulation starts.
#[async_trait(?Send)]
pub trait Runnable {
    async fn run(&self) -> SimResult;
}
