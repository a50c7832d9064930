// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::rc::Rc;

use arcol_engine::run_simulation;
use arcol_offload::config::{Deployment, RingConfig};
use arcol_offload::test_helpers::start_ring;

/// Rank `r` arrives after `delays[r]` ticks. Returns (entered, left) for
/// every rank.
fn barrier_after(config: &RingConfig, delays: &[u64]) -> Vec<(f64, f64)> {
    let (mut engine, nodes) = start_ring(file!(), config);
    let clock = engine.default_clock();
    let times = Rc::new(RefCell::new(vec![(0.0, 0.0); nodes.len()]));

    for (node, delay) in nodes.iter().zip(delays.iter().copied()) {
        let client = node.client();
        let clock = clock.clone();
        let times = times.clone();
        engine.spawn(async move {
            clock.wait_ticks(delay).await;
            let entered = clock.time_now_ns();
            client.barrier().await?;
            times.borrow_mut()[client.rank() as usize] = (entered, clock.time_now_ns());
            Ok(())
        });
    }
    run_simulation!(engine);
    times.take()
}

/// Arrive in reverse rank order so that rank 0 is last.
fn staggered_barrier(config: &RingConfig, stagger_ticks: u64) -> Vec<(f64, f64)> {
    let size = u64::from(config.size);
    let delays: Vec<u64> = (0..size).map(|rank| (size - rank) * stagger_ticks).collect();
    barrier_after(config, &delays)
}

/// Everyone arrives at once apart from `late`, which is 500 ticks behind.
fn one_late(config: &RingConfig, late: u32) -> Vec<(f64, f64)> {
    let delays: Vec<u64> = (0..config.size)
        .map(|rank| if rank == late { 500 } else { 0 })
        .collect();
    barrier_after(config, &delays)
}

fn assert_nobody_leaves_early(times: &[(f64, f64)]) {
    let last_entry = times
        .iter()
        .map(|(entered, _)| *entered)
        .fold(0.0, f64::max);
    for (rank, (_, left)) in times.iter().enumerate() {
        assert!(*left >= last_entry, "rank {rank} left at {left}ns before {last_entry}ns");
    }
}

#[test]
fn single_rank_passes_straight_through() {
    let config = RingConfig {
        size: 1,
        ..RingConfig::default()
    };
    let times = staggered_barrier(&config, 5);
    assert_eq!(times, vec![(5.0, 5.0)]);
}

#[test]
fn staged_ring_waits_for_everyone() {
    let config = RingConfig {
        size: 6,
        link_latency_ticks: 2,
        ..RingConfig::default()
    };
    let times = staggered_barrier(&config, 10);
    assert_nobody_leaves_early(&times);

    // Rank 0 arrives last at 60ns and then waits for two trips round the ring
    assert_eq!(times[0].0, 60.0);
    assert!(times[0].1 >= 60.0 + 2.0 * 6.0 * 2.0);
}

#[test]
fn direct_ring_waits_for_everyone() {
    let config = RingConfig {
        size: 3,
        deployment: Deployment::Direct,
        link_latency_ticks: 1,
        ..RingConfig::default()
    };
    let times = staggered_barrier(&config, 4);
    assert_nobody_leaves_early(&times);
}

#[test]
fn staged_ring_waits_for_late_middle_rank() {
    for (size, late) in [(5, 3), (8, 1)] {
        let config = RingConfig {
            size,
            link_latency_ticks: 2,
            ..RingConfig::default()
        };
        let times = one_late(&config, late);
        assert_eq!(times[late as usize].0, 500.0);
        assert_nobody_leaves_early(&times);
    }
}

#[test]
fn direct_ring_waits_for_late_last_rank() {
    let config = RingConfig {
        size: 3,
        deployment: Deployment::Direct,
        ..RingConfig::default()
    };
    let times = one_late(&config, 2);
    assert_eq!(times[2].0, 500.0);
    assert_nobody_leaves_early(&times);
}

/// Every rank runs a barrier and then a broadcast of its own rank from
/// `root`. Returns what each rank ends up with.
fn barrier_then_bcast(config: &RingConfig, root: u32) -> Vec<Option<Vec<u32>>> {
    let (mut engine, nodes) = start_ring(file!(), config);
    let results = Rc::new(RefCell::new(vec![None; nodes.len()]));

    for node in &nodes {
        let client = node.client();
        let results = results.clone();
        engine.spawn(async move {
            let rank = client.rank();
            client.barrier().await?;
            let mut values = [rank; 16];
            client.bcast(&mut values, 1, root).await?;
            results.borrow_mut()[rank as usize] = Some(values.to_vec());
            Ok(())
        });
    }
    run_simulation!(engine);
    results.take()
}

#[test]
fn bcast_straight_after_barrier() {
    // The westbound half of the broadcast reaches rank 0 before its release
    // token comes back round
    for (size, root) in [(3, 1), (5, 2)] {
        let config = RingConfig {
            size,
            ..RingConfig::default()
        };
        let results = barrier_then_bcast(&config, root);
        for (rank, values) in results.iter().enumerate() {
            assert_eq!(values.as_deref(), Some(&[root; 16][..]), "rank {rank}");
        }
    }
}

#[test]
fn p2p_into_rank_0_straight_after_barrier() {
    let config = RingConfig {
        size: 3,
        link_latency_ticks: 3,
        ..RingConfig::default()
    };
    let (mut engine, nodes) = start_ring(file!(), &config);
    let received = Rc::new(RefCell::new(None));

    for node in &nodes {
        let client = node.client();
        let received = received.clone();
        engine.spawn(async move {
            client.barrier().await?;
            let mut values: Vec<u32> = (0..32).map(|i| i * (client.rank() + 1)).collect();
            // Rank 1 is one hop west of rank 0, the release token two hops east
            client.p2p(&mut values, 2, 1, 0).await?;
            if client.rank() == 0 {
                *received.borrow_mut() = Some(values);
            }
            Ok(())
        });
    }
    run_simulation!(engine);

    let expected: Vec<u32> = (0..32).map(|i| i * 2).collect();
    assert_eq!(received.take(), Some(expected));
}
