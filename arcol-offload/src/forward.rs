// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Burst forwarding primitives.
//!
//! Each function moves one whole burst, the header plus `header.count`
//! payload words, before returning. A task that only ever calls these
//! therefore never interleaves two bursts on any of its outputs.
//!
//! The payload length is trusted. A burst shorter than its header claims
//! leaves the caller waiting on `rx` forever.

use arcol_engine::channel::{ChannelRx, ChannelTx};

use crate::wire::{Header, Word};

/// Write `header` to `tx` and relay the payload unchanged.
pub async fn stream_array(header: &Header, rx: &ChannelRx<Word>, tx: &ChannelTx<Word>) {
    tx.put(header.to_word()).await;
    for _ in 0..header.count {
        let word = rx.get().await;
        tx.put(word).await;
    }
}

/// Copy the burst to both outputs, word by word.
pub async fn fork_array(
    header: &Header,
    rx: &ChannelRx<Word>,
    tx0: &ChannelTx<Word>,
    tx1: &ChannelTx<Word>,
) {
    fork_array_dest(header, rx, tx0, header.dest, tx1, header.dest).await;
}

/// Copy the burst to both outputs with each header's `dest` rewritten.
pub async fn fork_array_dest(
    header: &Header,
    rx: &ChannelRx<Word>,
    tx0: &ChannelTx<Word>,
    dest0: u32,
    tx1: &ChannelTx<Word>,
    dest1: u32,
) {
    tx0.put(header.with_dest(dest0).to_word()).await;
    tx1.put(header.with_dest(dest1).to_word()).await;
    for _ in 0..header.count {
        let word = rx.get().await;
        tx0.put(word).await;
        tx1.put(word).await;
    }
}

/// Consume the payload of a burst that has nowhere to go.
pub async fn drain_array(header: &Header, rx: &ChannelRx<Word>) {
    for _ in 0..header.count {
        rx.get().await;
    }
}
