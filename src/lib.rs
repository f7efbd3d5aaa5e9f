//! Tick-driven simulation of vehicle flow through one four-way signalized
//! intersection.
//!
//! The [`engine::Engine`] wires together a pool of motion workers, a vehicle
//! spawner and the control loop that cycles the lights, admits queued
//! vehicles and collects departed ones. Consumers read a per-tick
//! [`shared_data::Snapshot`] and submit spawn requests; nothing else crosses
//! the engine boundary.

pub mod config;
pub mod control_system;
pub mod engine;
pub mod error;
pub mod global_variables;
pub mod shared_data;
pub mod simulation_engine;

pub use config::SimConfig;
pub use engine::Engine;
pub use error::{ConfigError, EngineError};
pub use shared_data::Snapshot;
pub use simulation_engine::vehicles::Direction;
