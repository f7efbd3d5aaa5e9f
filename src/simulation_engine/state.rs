use crate::config::SimConfig;
use crate::control_system::traffic_light_controller::{
    LightState, Phase, Signal, TrafficLightController,
};
use crate::global_variables::ARRIVAL_TOLERANCE;
use crate::shared_data::{Snapshot, SnapshotLights, SnapshotSignal};
use crate::simulation_engine::intersections::{
    crossing_point, entry_point, exit_point, has_cleared_center, is_outside_play_area,
    queue_slot, Occupancy,
};
use crate::simulation_engine::movement::{MotionJob, MotionResult};
use crate::simulation_engine::vehicles::{Axis, Direction, Vehicle};
use log::{debug, warn};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SharedState = Arc<Mutex<IntersectionState>>;

/// Locks the shared state. A panic in another holder leaves the data
/// structurally valid, so poisoning is ignored.
pub fn lock_state(state: &Mutex<IntersectionState>) -> MutexGuard<'_, IntersectionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Authoritative simulation state: every live vehicle, the per-direction
/// queues, both signal heads and the intersection occupancy.
#[derive(Debug)]
pub struct IntersectionState {
    // Keyed by id; ids are monotonic so iteration follows arrival order.
    vehicles: BTreeMap<u64, Vehicle>,
    queues: [VecDeque<u64>; 4],
    lights: TrafficLightController,
    occupancy: Occupancy,
    next_id: u64,
    tick: u64,
}

impl IntersectionState {
    pub fn new(config: &SimConfig) -> Self {
        let ns = Signal::new(Axis::NorthSouth, config.ns_green_ticks, config.ns_yellow_ticks);
        let ew = Signal::new(Axis::EastWest, config.ew_green_ticks, config.ew_yellow_ticks);
        Self {
            vehicles: BTreeMap::new(),
            queues: Default::default(),
            lights: TrafficLightController::new(ns, ew),
            occupancy: Occupancy::new(config.max_occupancy),
            next_id: 1,
            tick: 0,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn lights(&self) -> &TrafficLightController {
        &self.lights
    }

    /// Direct access to the signal heads, for operators overriding a light.
    pub fn lights_mut(&mut self) -> &mut TrafficLightController {
        &mut self.lights
    }

    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    pub fn vehicle(&self, id: u64) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Ids queued for `direction`, front first.
    pub fn queue(&self, direction: Direction) -> &VecDeque<u64> {
        &self.queues[direction.index()]
    }

    /// Creates a vehicle at `direction`'s entry point and appends it to
    /// that direction's queue. Returns the new id.
    pub fn spawn_vehicle(&mut self, direction: Direction, color: u32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let queue = &mut self.queues[direction.index()];
        let index = queue.len();
        queue.push_back(id);
        self.vehicles.insert(
            id,
            Vehicle::new(
                id,
                direction,
                entry_point(direction),
                queue_slot(direction, index),
                color,
                index,
            ),
        );
        debug!("Spawned vehicle {} from {:?} at queue slot {}", id, direction, index);
        id
    }

    /// Starts a new tick and steps the phase machine.
    pub fn advance_phase(&mut self) -> Option<Phase> {
        self.tick += 1;
        self.lights.update()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            phase: self.lights.phase(),
            lights: SnapshotLights {
                ns: SnapshotSignal::from(&self.lights.ns),
                ew: SnapshotSignal::from(&self.lights.ew),
            },
            occupancy: self.occupancy.count(),
            vehicles: self.vehicles.values().cloned().collect(),
        }
    }

    /// Working copy handed to the worker pool, one job per live vehicle.
    pub fn motion_jobs(&self) -> Vec<MotionJob> {
        self.vehicles.values().map(MotionJob::for_vehicle).collect()
    }

    /// Overwrites a vehicle's position. Results for vehicles that are
    /// already gone are ignored.
    pub fn apply_motion(&mut self, result: MotionResult) -> bool {
        match self.vehicles.get_mut(&result.id) {
            Some(vehicle) => {
                vehicle.position = result.position;
                true
            }
            None => false,
        }
    }

    /// Runs admission for the NS axis, then the EW axis.
    pub fn admit_waiting(&mut self) -> usize {
        self.admit_axis(Axis::NorthSouth) + self.admit_axis(Axis::EastWest)
    }

    /// Admits queue fronts of `axis` until a full pass admits nothing.
    /// Directions are scanned in `Axis::directions` order.
    fn admit_axis(&mut self, axis: Axis) -> usize {
        let mut admitted = 0;
        loop {
            let mut admitted_in_pass = false;
            for direction in axis.directions() {
                if self.occupancy.is_full() {
                    return admitted;
                }
                if self.try_admit_front(direction) {
                    admitted += 1;
                    admitted_in_pass = true;
                }
            }
            if !admitted_in_pass {
                return admitted;
            }
        }
    }

    fn try_admit_front(&mut self, direction: Direction) -> bool {
        let axis = direction.axis();
        if self.lights.signal(axis).state() != LightState::Green {
            return false;
        }
        let Some(&front_id) = self.queues[direction.index()].front() else {
            return false;
        };
        let Some(front) = self.vehicles.get_mut(&front_id) else {
            warn!("Queue {:?} references missing vehicle {}", direction, front_id);
            return false;
        };
        let head = queue_slot(direction, 0);
        if !front.waiting || front.position.distance_to(head) > ARRIVAL_TOLERANCE {
            return false;
        }
        if !self.occupancy.enter(axis) {
            return false;
        }

        front.waiting = false;
        front.occupying = true;
        front.queue_index = None;
        front.target = crossing_point(direction);
        self.queues[direction.index()].pop_front();
        self.reindex_queue(direction);
        debug!(
            "Admitted vehicle {} from {:?} (occupancy {}/{})",
            front_id,
            direction,
            self.occupancy.count(),
            self.occupancy.max()
        );
        true
    }

    fn reindex_queue(&mut self, direction: Direction) {
        for (index, id) in self.queues[direction.index()].iter().enumerate() {
            if let Some(vehicle) = self.vehicles.get_mut(id) {
                vehicle.queue_index = Some(index);
                vehicle.target = queue_slot(direction, index);
            }
        }
    }

    /// Sends vehicles that reached their crossing point on to their exit.
    pub fn detect_crossings(&mut self) -> usize {
        let mut crossed = 0;
        for vehicle in self.vehicles.values_mut() {
            if !vehicle.occupying || vehicle.passed_crossing {
                continue;
            }
            if vehicle.position.distance_to(crossing_point(vehicle.direction)) < ARRIVAL_TOLERANCE
            {
                vehicle.passed_crossing = true;
                vehicle.target = exit_point(vehicle.direction);
                crossed += 1;
            }
        }
        crossed
    }

    /// Frees the intersection slot of every vehicle past the central region.
    pub fn release_occupancy(&mut self) -> usize {
        let mut released = 0;
        for vehicle in self.vehicles.values_mut() {
            if vehicle.occupying && has_cleared_center(vehicle.direction, vehicle.position) {
                vehicle.occupying = false;
                self.occupancy.leave();
                released += 1;
            }
        }
        released
    }

    /// Drops vehicles that left the play area. Queued vehicles are kept:
    /// they leave their queue only through admission.
    pub fn remove_departed(&mut self) -> usize {
        let before = self.vehicles.len();
        self.vehicles
            .retain(|_, v| v.queue_index.is_some() || !is_outside_play_area(v.position));
        before - self.vehicles.len()
    }

    /// Checks that every queued vehicle's stored index matches its place
    /// in its direction's queue.
    pub fn queues_consistent(&self) -> bool {
        Direction::ALL.iter().all(|&direction| {
            self.queues[direction.index()]
                .iter()
                .enumerate()
                .all(|(index, id)| {
                    self.vehicles.get(id).is_some_and(|v| {
                        v.direction == direction && v.waiting && v.queue_index == Some(index)
                    })
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::vehicles::Point;

    fn state() -> IntersectionState {
        IntersectionState::new(&SimConfig::default())
    }

    fn arrive(state: &mut IntersectionState, id: u64) {
        let target = state.vehicle(id).unwrap().target;
        state.apply_motion(MotionResult { id, position: target });
    }

    fn force(state: &mut IntersectionState, axis: Axis, light: LightState) {
        state.lights_mut().signal_mut(axis).set(light, 100);
    }

    #[test]
    fn spawn_places_vehicle_at_entry_heading_for_next_slot() {
        let mut state = state();
        let first = state.spawn_vehicle(Direction::West, 1);
        let second = state.spawn_vehicle(Direction::West, 2);
        assert_eq!((first, second), (1, 2));

        let v = state.vehicle(second).unwrap();
        assert_eq!(v.position, entry_point(Direction::West));
        assert_eq!(v.target, queue_slot(Direction::West, 1));
        assert_eq!(v.queue_index, Some(1));
        assert!(v.waiting && !v.occupying && !v.passed_crossing);
        assert_eq!(state.queue(Direction::West), &VecDeque::from([1, 2]));
        assert!(state.queues_consistent());
    }

    #[test]
    fn admits_front_at_head_slot_when_green() {
        let mut state = state();
        let id = state.spawn_vehicle(Direction::North, 0);
        assert_eq!(state.admit_waiting(), 0, "still driving to its slot");

        arrive(&mut state, id);
        assert_eq!(state.admit_waiting(), 1);
        let v = state.vehicle(id).unwrap();
        assert!(v.occupying && !v.waiting);
        assert_eq!(v.queue_index, None);
        assert_eq!(v.target, crossing_point(Direction::North));
        assert!(state.queue(Direction::North).is_empty());
        assert_eq!(state.occupancy().count(), 1);
        assert_eq!(state.occupancy().owner(), Some(Axis::NorthSouth));
    }

    #[test]
    fn red_and_yellow_hold_the_queue() {
        let mut state = state();
        let id = state.spawn_vehicle(Direction::East, 0);
        arrive(&mut state, id);
        assert_eq!(state.lights().ew.state(), LightState::Red);
        assert_eq!(state.admit_waiting(), 0);

        force(&mut state, Axis::EastWest, LightState::Yellow);
        assert_eq!(state.admit_waiting(), 0);
        assert!(state.vehicle(id).unwrap().waiting);

        force(&mut state, Axis::EastWest, LightState::Green);
        assert_eq!(state.admit_waiting(), 1);
    }

    #[test]
    fn admission_reindexes_and_retargets_the_rest() {
        let mut state = state();
        let ids: Vec<u64> = (0..4).map(|_| state.spawn_vehicle(Direction::South, 0)).collect();
        for &id in &ids {
            arrive(&mut state, id);
        }

        assert_eq!(state.admit_waiting(), 1, "next vehicle is still one slot back");
        for (index, &id) in ids[1..].iter().enumerate() {
            let v = state.vehicle(id).unwrap();
            assert_eq!(v.queue_index, Some(index));
            assert_eq!(v.target, queue_slot(Direction::South, index));
        }
        assert!(state.queues_consistent());
    }

    #[test]
    fn occupancy_caps_when_both_axes_are_forced_green() {
        let mut state = state();
        for direction in [
            Direction::North,
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ] {
            let id = state.spawn_vehicle(direction, 0);
            arrive(&mut state, id);
        }
        force(&mut state, Axis::NorthSouth, LightState::Green);
        force(&mut state, Axis::EastWest, LightState::Green);

        assert_eq!(state.admit_waiting(), 3);
        assert_eq!(state.occupancy().count(), 3);
        assert_eq!(state.vehicles().filter(|v| v.waiting).count(), 2);
        assert_eq!(state.snapshot().occupying_count(), 3);
        assert!(state.queues_consistent());

        // Still capped once the second North vehicle reaches the head slot.
        let second_north = state.queue(Direction::North)[0];
        arrive(&mut state, second_north);
        assert_eq!(state.admit_waiting(), 0);
        assert_eq!(state.occupancy().count(), 3);
    }

    #[test]
    fn north_is_scanned_before_south() {
        let config = SimConfig {
            max_occupancy: 1,
            ..SimConfig::default()
        };
        let mut state = IntersectionState::new(&config);
        let south = state.spawn_vehicle(Direction::South, 0);
        let north = state.spawn_vehicle(Direction::North, 0);
        arrive(&mut state, south);
        arrive(&mut state, north);

        assert_eq!(state.admit_waiting(), 1);
        assert!(state.vehicle(north).unwrap().occupying);
        assert!(state.vehicle(south).unwrap().waiting);
    }

    #[test]
    fn crossing_sends_vehicle_to_exit_and_release_frees_the_slot() {
        let mut state = state();
        let id = state.spawn_vehicle(Direction::North, 0);
        arrive(&mut state, id);
        state.admit_waiting();

        assert_eq!(state.detect_crossings(), 0);
        arrive(&mut state, id);
        assert_eq!(state.detect_crossings(), 1);
        assert_eq!(state.detect_crossings(), 0, "flagged only once");
        let v = state.vehicle(id).unwrap();
        assert!(v.passed_crossing);
        assert_eq!(v.target, exit_point(Direction::North));
        let at_crossing = v.position;

        assert_eq!(state.release_occupancy(), 0, "crossing point is inside the center");
        let cleared = Point::new(at_crossing.x, at_crossing.y + 60.0);
        state.apply_motion(MotionResult { id, position: cleared });
        assert_eq!(state.release_occupancy(), 1);
        assert_eq!(state.occupancy().count(), 0);
        assert_eq!(state.occupancy().owner(), None);
        assert!(!state.vehicle(id).unwrap().occupying);
    }

    #[test]
    fn cleanup_removes_only_departed_vehicles() {
        let mut state = state();
        let leaving = state.spawn_vehicle(Direction::West, 0);
        let queued = state.spawn_vehicle(Direction::West, 0);
        arrive(&mut state, leaving);
        force(&mut state, Axis::EastWest, LightState::Green);
        state.admit_waiting();
        state.apply_motion(MotionResult {
            id: leaving,
            position: exit_point(Direction::West),
        });
        state.apply_motion(MotionResult {
            id: queued,
            position: Point::new(-500.0, 270.0),
        });

        assert_eq!(state.remove_departed(), 1);
        assert!(state.vehicle(leaving).is_none());
        assert!(state.vehicle(queued).is_some());
        assert_eq!(state.queue(Direction::West), &VecDeque::from([queued]));
    }

    #[test]
    fn results_for_unknown_vehicles_are_ignored() {
        let mut state = state();
        assert!(!state.apply_motion(MotionResult {
            id: 42,
            position: Point::new(1.0, 1.0),
        }));
        assert_eq!(state.vehicle_count(), 0);
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let mut state = state();
        let id = state.spawn_vehicle(Direction::East, 9);
        state.advance_phase();
        let snapshot = state.snapshot();
        arrive(&mut state, id);

        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.phase, Phase::NsGreen);
        assert_eq!(snapshot.lights.ns.state, LightState::Green);
        assert_eq!(snapshot.lights.ns.remaining_ticks, 199);
        assert_eq!(snapshot.lights.ew.state, LightState::Red);
        assert_eq!(snapshot.lights.ew.remaining_ticks, 235);
        assert_eq!(snapshot.lights.signal(Axis::EastWest), &snapshot.lights.ew);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["lights"]["ns"]["remaining_ticks"], 199);
        assert_eq!(snapshot.vehicles[0].position, entry_point(Direction::East));
        assert_eq!(snapshot.vehicles[0].color, 9);
    }
}
