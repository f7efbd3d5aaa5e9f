use crate::simulation_engine::vehicles::Axis;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightState {
    Green,
    Yellow,
    Red,
}

/// One signal head, shared by the two directions of an axis.
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub axis: Axis,
    pub green_ticks: u32,
    pub yellow_ticks: u32,
    state: LightState,
    remaining_ticks: u32,
}

impl Signal {
    pub fn new(axis: Axis, green_ticks: u32, yellow_ticks: u32) -> Self {
        Self {
            axis,
            green_ticks,
            yellow_ticks,
            state: LightState::Red,
            remaining_ticks: 0,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    pub fn is_green(&self) -> bool {
        self.state == LightState::Green
    }

    pub fn set(&mut self, state: LightState, ticks: u32) {
        self.state = state;
        self.remaining_ticks = ticks;
    }

    fn count_down(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }
}

/// The four signal configurations, cycled strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NsGreen,
    NsYellow,
    EwGreen,
    EwYellow,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::NsGreen => Phase::NsYellow,
            Phase::NsYellow => Phase::EwGreen,
            Phase::EwGreen => Phase::EwYellow,
            Phase::EwYellow => Phase::NsGreen,
        }
    }
}

/// Timer-driven phase machine owning both signal heads.
#[derive(Debug, Clone)]
pub struct TrafficLightController {
    pub ns: Signal,
    pub ew: Signal,
    phase: Phase,
    phase_timer: u32,
}

impl TrafficLightController {
    /// Starts in `NsGreen` with the EW head already red for the whole NS
    /// green and yellow window.
    pub fn new(ns: Signal, ew: Signal) -> Self {
        let mut controller = Self {
            ns,
            ew,
            phase: Phase::NsGreen,
            phase_timer: 0,
        };
        controller.enter(Phase::NsGreen);
        controller
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_timer(&self) -> u32 {
        self.phase_timer
    }

    /// Ticks of one full NS green → EW yellow cycle.
    pub fn cycle_ticks(&self) -> u32 {
        self.ns
            .green_ticks
            .saturating_add(self.ns.yellow_ticks)
            .saturating_add(self.ew.green_ticks)
            .saturating_add(self.ew.yellow_ticks)
    }

    pub fn signal(&self, axis: Axis) -> &Signal {
        match axis {
            Axis::NorthSouth => &self.ns,
            Axis::EastWest => &self.ew,
        }
    }

    pub fn signal_mut(&mut self, axis: Axis) -> &mut Signal {
        match axis {
            Axis::NorthSouth => &mut self.ns,
            Axis::EastWest => &mut self.ew,
        }
    }

    pub fn is_green(&self, axis: Axis) -> bool {
        self.signal(axis).is_green()
    }

    /// Advances one tick. Returns the new phase when a transition happened.
    pub fn update(&mut self) -> Option<Phase> {
        self.ns.count_down();
        self.ew.count_down();
        self.phase_timer = self.phase_timer.saturating_sub(1);
        if self.phase_timer > 0 {
            return None;
        }
        let next = self.phase.next();
        self.enter(next);
        debug!(
            "Switching to phase {:?}: NS {:?} ({} ticks), EW {:?} ({} ticks)",
            next,
            self.ns.state(),
            self.ns.remaining_ticks(),
            self.ew.state(),
            self.ew.remaining_ticks()
        );
        Some(next)
    }

    fn enter(&mut self, phase: Phase) {
        let (ns_green, ns_yellow) = (self.ns.green_ticks, self.ns.yellow_ticks);
        let (ew_green, ew_yellow) = (self.ew.green_ticks, self.ew.yellow_ticks);
        self.phase_timer = match phase {
            Phase::NsGreen => {
                self.ns.set(LightState::Green, ns_green);
                self.ew.set(LightState::Red, ns_green.saturating_add(ns_yellow));
                ns_green
            }
            Phase::NsYellow => {
                self.ns.set(LightState::Yellow, ns_yellow);
                self.ew.set(LightState::Red, ns_yellow);
                ns_yellow
            }
            Phase::EwGreen => {
                self.ew.set(LightState::Green, ew_green);
                self.ns.set(LightState::Red, ew_green.saturating_add(ew_yellow));
                ew_green
            }
            Phase::EwYellow => {
                self.ew.set(LightState::Yellow, ew_yellow);
                self.ns.set(LightState::Red, ew_yellow);
                ew_yellow
            }
        };
        self.phase = phase;
    }
}
