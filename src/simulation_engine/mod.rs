// simulation_engine/mod.rs
pub mod intersections;
pub mod movement;
pub mod simulation;
pub mod spawning;
pub mod state;
pub mod vehicles;
