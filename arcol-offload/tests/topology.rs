// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use arcol_offload::topology::{Direction, Ring};
use proptest::prelude::*;

fn any_ring() -> impl Strategy<Value = Ring> {
    (1_u32..64).prop_flat_map(|size| (0..size).prop_map(move |rank| Ring::new(rank, size)))
}

fn ring_and_dest() -> impl Strategy<Value = (Ring, u32)> {
    any_ring().prop_flat_map(|ring| (Just(ring), 0..ring.size()))
}

/// The ranks visited travelling from the origin in `dir` until `end`.
fn walk(ring: &Ring, end: Option<u32>, dir: Direction) -> Vec<u32> {
    let mut visited = Vec::new();
    if let Some(end) = end {
        let mut rank = ring.rank();
        while rank != end {
            rank = match dir {
                Direction::East => ring.rank_east_of(rank),
                Direction::West => ring.rank_west_of(rank),
            };
            visited.push(rank);
        }
    }
    visited
}

proptest! {
    #[test]
    fn neighbours_are_inverse(ring in any_ring()) {
        prop_assert_eq!(ring.rank_east_of(ring.rank_west()), ring.rank());
        prop_assert_eq!(ring.rank_west_of(ring.rank_east()), ring.rank());
    }

    #[test]
    fn distances_go_round_once((ring, dest) in ring_and_dest()) {
        let east = ring.distance_east(dest);
        let west = ring.distance_west(dest);
        if dest == ring.rank() {
            prop_assert_eq!((east, west), (0, 0));
        } else {
            prop_assert_eq!(east + west, ring.size());
        }
    }

    #[test]
    fn shorter_way_with_ties_east((ring, dest) in ring_and_dest()) {
        let east = ring.distance_east(dest);
        let west = ring.distance_west(dest);
        prop_assert_eq!(ring.go_west(dest), west < east);
        if east == west {
            prop_assert_eq!(ring.direction_to(dest), Direction::East);
        }
    }

    #[test]
    fn bcast_arcs_cover_ring_once(ring in any_ring()) {
        let arcs = ring.bcast_arcs();
        let mut covered = walk(&ring, arcs.east, Direction::East);
        covered.extend(walk(&ring, arcs.west, Direction::West));
        covered.sort_unstable();

        let expected: Vec<u32> = (0..ring.size()).filter(|r| *r != ring.rank()).collect();
        prop_assert_eq!(covered, expected);
    }

    #[test]
    fn furthest_rank_is_east_arc_end(ring in any_ring()) {
        let furthest = ring.furthest_rank();
        prop_assert!(furthest < ring.size());
        prop_assert_eq!(ring.distance_east(furthest), ring.size() / 2);
        prop_assert!(ring.distance_east(furthest) <= ring.distance_west(furthest));
    }
}

#[test]
fn size_two_only_goes_east() {
    let ring = Ring::new(1, 2);
    assert_eq!(ring.furthest_rank(), 0);
    assert_eq!(ring.bcast_arcs().east, Some(0));
    assert_eq!(ring.bcast_arcs().west, None);
    assert_eq!(ring.direction_to(0), Direction::East);
}
