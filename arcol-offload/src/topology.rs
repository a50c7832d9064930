// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Ring arithmetic. Everything here is a pure function of `(rank, size)`.
//!
//! Ranks are laid out so that _east_ is `rank + 1` and _west_ is `rank - 1`,
//! both modulo the ring size.

use std::fmt;

/// Direction of travel around the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards `rank + 1`.
    East,
    /// Towards `rank - 1`.
    West,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::East, Direction::West];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::East => write!(f, "east"),
            Direction::West => write!(f, "west"),
        }
    }
}

/// One value per direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByDirection<T> {
    pub east: T,
    pub west: T,
}

impl<T> ByDirection<T> {
    pub fn get(&self, dir: Direction) -> &T {
        match dir {
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }
}

/// The final rank of each half of a broadcast.
///
/// `None` means that half is empty and nothing is sent that way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BcastArcs {
    pub east: Option<u32>,
    pub west: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ring {
    rank: u32,
    size: u32,
}

impl Ring {
    /// `rank` must be less than `size`.
    #[must_use]
    pub fn new(rank: u32, size: u32) -> Self {
        debug_assert!(rank < size, "rank {rank} outside ring of {size}");
        Self { rank, size }
    }

    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub fn rank_west(&self) -> u32 {
        self.rank_west_of(self.rank)
    }

    #[must_use]
    pub fn rank_east(&self) -> u32 {
        self.rank_east_of(self.rank)
    }

    #[must_use]
    pub fn rank_west_of(&self, center: u32) -> u32 {
        (center + self.size - 1) % self.size
    }

    #[must_use]
    pub fn rank_east_of(&self, center: u32) -> u32 {
        (center + 1) % self.size
    }

    /// The next rank when travelling in `dir`.
    #[must_use]
    pub fn neighbour(&self, dir: Direction) -> u32 {
        match dir {
            Direction::East => self.rank_east(),
            Direction::West => self.rank_west(),
        }
    }

    /// Hops needed to reach `dest` travelling west.
    #[must_use]
    pub fn distance_west(&self, dest: u32) -> u32 {
        if dest <= self.rank {
            self.rank - dest
        } else {
            self.rank + self.size - dest
        }
    }

    /// Hops needed to reach `dest` travelling east.
    #[must_use]
    pub fn distance_east(&self, dest: u32) -> u32 {
        if dest >= self.rank {
            dest - self.rank
        } else {
            dest + self.size - self.rank
        }
    }

    /// Whether `dest` is strictly closer going west. Ties go east.
    #[must_use]
    pub fn go_west(&self, dest: u32) -> bool {
        self.distance_west(dest) < self.distance_east(dest)
    }

    #[must_use]
    pub fn direction_to(&self, dest: u32) -> Direction {
        if self.go_west(dest) {
            Direction::West
        } else {
            Direction::East
        }
    }

    /// The rank half way round the ring.
    #[must_use]
    pub fn furthest_rank(&self) -> u32 {
        (self.rank + self.size / 2) % self.size
    }

    /// Split the rest of the ring into an east arc ending at the furthest rank
    /// and a west arc ending just east of it.
    #[must_use]
    pub fn bcast_arcs(&self) -> BcastArcs {
        let furthest = self.furthest_rank();
        let west_end = self.rank_east_of(furthest);
        let non_empty = |end: u32| (end != self.rank).then_some(end);
        BcastArcs {
            east: non_empty(furthest),
            west: non_empty(west_end),
        }
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.rank, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_wrap() {
        let ring = Ring::new(0, 5);
        assert_eq!(ring.rank_west(), 4);
        assert_eq!(ring.rank_east(), 1);

        let ring = Ring::new(4, 5);
        assert_eq!(ring.rank_east(), 0);
        assert_eq!(ring.rank_west(), 3);
    }

    #[test]
    fn tie_goes_east() {
        let ring = Ring::new(0, 4);
        assert_eq!(ring.distance_east(2), 2);
        assert_eq!(ring.distance_west(2), 2);
        assert!(!ring.go_west(2));
        assert!(ring.go_west(3));
        assert!(!ring.go_west(1));
    }

    #[test]
    fn arcs_for_small_rings() {
        assert_eq!(
            Ring::new(0, 1).bcast_arcs(),
            BcastArcs {
                east: None,
                west: None
            }
        );
        assert_eq!(
            Ring::new(1, 2).bcast_arcs(),
            BcastArcs {
                east: Some(0),
                west: None
            }
        );
        assert_eq!(
            Ring::new(0, 3).bcast_arcs(),
            BcastArcs {
                east: Some(1),
                west: Some(2)
            }
        );
        assert_eq!(
            Ring::new(2, 8).bcast_arcs(),
            BcastArcs {
                east: Some(6),
                west: Some(7)
            }
        );
    }
}
