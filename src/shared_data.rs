// src/shared_data.rs

use crate::control_system::traffic_light_controller::{LightState, Phase, Signal};
use crate::simulation_engine::vehicles::{Axis, Direction, Vehicle};
use serde::Serialize;

/// One signal head as seen by snapshot consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotSignal {
    pub state: LightState,
    /// Ticks until this head changes color.
    pub remaining_ticks: u32,
}

impl From<&Signal> for SnapshotSignal {
    fn from(signal: &Signal) -> Self {
        Self {
            state: signal.state(),
            remaining_ticks: signal.remaining_ticks(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotLights {
    pub ns: SnapshotSignal,
    pub ew: SnapshotSignal,
}

impl SnapshotLights {
    pub fn signal(&self, axis: Axis) -> &SnapshotSignal {
        match axis {
            Axis::NorthSouth => &self.ns,
            Axis::EastWest => &self.ew,
        }
    }
}

/// Immutable per-tick copy of everything a consumer may display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub lights: SnapshotLights,
    pub occupancy: usize,
    pub vehicles: Vec<Vehicle>,
}

impl Snapshot {
    pub fn waiting_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.waiting).count()
    }

    pub fn occupying_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.occupying).count()
    }

    pub fn vehicles_from(&self, direction: Direction) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter().filter(move |v| v.direction == direction)
    }
}
