use serde::{Deserialize, Serialize};

/// The side of the intersection a vehicle approaches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The signal axis this direction belongs to.
    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }

    /// Stable slot used by per-direction tables.
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        Direction::ALL.get(index).copied()
    }
}

/// A pair of opposing directions sharing one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    /// Directions in admission scan order.
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::NorthSouth => [Direction::North, Direction::South],
            Axis::EastWest => [Direction::East, Direction::West],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::NorthSouth => "NS",
            Axis::EastWest => "EW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// A vehicle in the simulation. Plain data: the control loop and the spawner
/// mutate it under the shared lock, snapshots carry copies of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub direction: Direction,
    pub position: Point,
    pub target: Point,
    /// Display only.
    pub color: u32,
    pub waiting: bool,
    /// Position in the direction's queue, `None` once admitted.
    pub queue_index: Option<usize>,
    pub occupying: bool,
    pub passed_crossing: bool,
}

impl Vehicle {
    /// Creates a vehicle waiting in its direction's queue at `queue_index`.
    pub fn new(
        id: u64,
        direction: Direction,
        position: Point,
        target: Point,
        color: u32,
        queue_index: usize,
    ) -> Self {
        Self {
            id,
            direction,
            position,
            target,
            color,
            waiting: true,
            queue_index: Some(queue_index),
            occupying: false,
            passed_crossing: false,
        }
    }
}
