use crate::global_variables::{
    CENTER_X, CENTER_Y, CLEANUP_MARGIN, CROSSING_OVERSHOOT, CROSS_HALF, ENTRY_MARGIN,
    EXIT_MARGIN, LANE_OFFSET, QUEUE_GAP, QUEUE_HEAD_GAP, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use crate::simulation_engine::vehicles::{Axis, Direction, Point};
use serde::Serialize;

/// Where the vehicle at `index` in `direction`'s queue should stand.
pub fn queue_slot(direction: Direction, index: usize) -> Point {
    let back = CROSS_HALF + QUEUE_HEAD_GAP + index as f64 * QUEUE_GAP;
    match direction {
        Direction::North => Point::new(CENTER_X - LANE_OFFSET, CENTER_Y - back),
        Direction::South => Point::new(CENTER_X + LANE_OFFSET, CENTER_Y + back),
        Direction::West => Point::new(CENTER_X - back, CENTER_Y - LANE_OFFSET),
        Direction::East => Point::new(CENTER_X + back, CENTER_Y + LANE_OFFSET),
    }
}

/// The point inside the intersection an admitted vehicle drives to first.
pub fn crossing_point(direction: Direction) -> Point {
    match direction {
        Direction::North => Point::new(CENTER_X - LANE_OFFSET, CENTER_Y + CROSSING_OVERSHOOT),
        Direction::South => Point::new(CENTER_X + LANE_OFFSET, CENTER_Y - CROSSING_OVERSHOOT),
        Direction::West => Point::new(CENTER_X + CROSSING_OVERSHOOT, CENTER_Y - LANE_OFFSET),
        Direction::East => Point::new(CENTER_X - CROSSING_OVERSHOOT, CENTER_Y + LANE_OFFSET),
    }
}

/// Far off-screen point on the opposite side, past the cleanup margin.
pub fn exit_point(direction: Direction) -> Point {
    match direction {
        Direction::North => Point::new(CENTER_X - LANE_OFFSET, SCREEN_HEIGHT + EXIT_MARGIN),
        Direction::South => Point::new(CENTER_X + LANE_OFFSET, -EXIT_MARGIN),
        Direction::West => Point::new(SCREEN_WIDTH + EXIT_MARGIN, CENTER_Y - LANE_OFFSET),
        Direction::East => Point::new(-EXIT_MARGIN, CENTER_Y + LANE_OFFSET),
    }
}

/// Off-screen point where a new vehicle appears.
pub fn entry_point(direction: Direction) -> Point {
    match direction {
        Direction::North => Point::new(CENTER_X - LANE_OFFSET, -ENTRY_MARGIN),
        Direction::South => Point::new(CENTER_X + LANE_OFFSET, SCREEN_HEIGHT + ENTRY_MARGIN),
        Direction::West => Point::new(-ENTRY_MARGIN, CENTER_Y - LANE_OFFSET),
        Direction::East => Point::new(SCREEN_WIDTH + ENTRY_MARGIN, CENTER_Y + LANE_OFFSET),
    }
}

/// True once a vehicle travelling from `direction` has moved past the
/// central region and no longer blocks the intersection.
pub fn has_cleared_center(direction: Direction, position: Point) -> bool {
    let half = CROSS_HALF / 2.0;
    match direction {
        Direction::North => position.y > CENTER_Y + half,
        Direction::South => position.y < CENTER_Y - half,
        Direction::West => position.x > CENTER_X + half,
        Direction::East => position.x < CENTER_X - half,
    }
}

pub fn is_outside_play_area(position: Point) -> bool {
    position.x < -CLEANUP_MARGIN
        || position.x > SCREEN_WIDTH + CLEANUP_MARGIN
        || position.y < -CLEANUP_MARGIN
        || position.y > SCREEN_HEIGHT + CLEANUP_MARGIN
}

/// How many vehicles are inside the intersection and which axis let the
/// first of them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    count: usize,
    owner: Option<Axis>,
    max: usize,
}

impl Occupancy {
    pub fn new(max: usize) -> Self {
        Self {
            count: 0,
            owner: None,
            max,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn owner(&self) -> Option<Axis> {
        self.owner
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.max
    }

    /// Registers one vehicle entering from `axis`. Returns false when full.
    pub fn enter(&mut self, axis: Axis) -> bool {
        if self.is_full() {
            return false;
        }
        if self.count == 0 {
            self.owner = Some(axis);
        }
        self.count += 1;
        true
    }

    pub fn leave(&mut self) {
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.owner = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_slots_step_back_from_the_crossing() {
        let head = queue_slot(Direction::North, 0);
        let next = queue_slot(Direction::North, 1);
        assert_eq!(head, Point::new(370.0, 218.0));
        assert_eq!(head.y - next.y, QUEUE_GAP);

        let east_head = queue_slot(Direction::East, 0);
        assert_eq!(east_head, Point::new(582.0, 430.0));
        assert_eq!(queue_slot(Direction::East, 2).x - east_head.x, 2.0 * QUEUE_GAP);
    }

    #[test]
    fn lanes_are_consistent_per_direction() {
        for direction in Direction::ALL {
            let entry = entry_point(direction);
            let slot = queue_slot(direction, 0);
            let cross = crossing_point(direction);
            let exit = exit_point(direction);
            match direction.axis() {
                Axis::NorthSouth => {
                    assert_eq!(entry.x, slot.x);
                    assert_eq!(slot.x, cross.x);
                    assert_eq!(cross.x, exit.x);
                }
                Axis::EastWest => {
                    assert_eq!(entry.y, slot.y);
                    assert_eq!(slot.y, cross.y);
                    assert_eq!(cross.y, exit.y);
                }
            }
        }
    }

    #[test]
    fn entries_stay_in_play_and_exits_do_not() {
        for direction in Direction::ALL {
            assert!(!is_outside_play_area(entry_point(direction)));
            assert!(is_outside_play_area(exit_point(direction)));
        }
    }

    #[test]
    fn crossing_point_is_past_the_center_but_not_cleared() {
        for direction in Direction::ALL {
            assert!(!has_cleared_center(direction, crossing_point(direction)));
            assert!(!has_cleared_center(direction, queue_slot(direction, 0)));
            assert!(has_cleared_center(direction, exit_point(direction)));
        }
    }

    #[test]
    fn occupancy_caps_and_tracks_owner() {
        let mut occupancy = Occupancy::new(2);
        assert!(occupancy.enter(Axis::EastWest));
        assert!(occupancy.enter(Axis::NorthSouth));
        assert!(!occupancy.enter(Axis::NorthSouth));
        assert_eq!(occupancy.count(), 2);
        assert_eq!(occupancy.owner(), Some(Axis::EastWest));

        occupancy.leave();
        occupancy.leave();
        occupancy.leave();
        assert_eq!(occupancy.count(), 0);
        assert_eq!(occupancy.owner(), None);
    }
}
