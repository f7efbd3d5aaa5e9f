use crate::engine::shutdown::Shutdown;
use crate::simulation_engine::state::{lock_state, SharedState};
use crate::simulation_engine::vehicles::Direction;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Write-only handle external collaborators use to ask for a vehicle.
#[derive(Debug, Clone)]
pub struct SpawnRequests {
    tx: mpsc::Sender<Direction>,
}

impl SpawnRequests {
    pub fn new(tx: mpsc::Sender<Direction>) -> Self {
        Self { tx }
    }

    /// Best effort: a full (or closed) request queue drops the request.
    /// Returns whether it was queued.
    pub fn request(&self, direction: Direction) -> bool {
        match self.tx.try_send(direction) {
            Ok(()) => true,
            Err(_) => {
                trace!("Spawn request for {:?} dropped", direction);
                false
            }
        }
    }
}

/// Creates vehicles on a fixed cadence and on request.
pub struct Spawner {
    state: SharedState,
    requests: mpsc::Receiver<Direction>,
    rng: StdRng,
}

impl Spawner {
    pub fn new(state: SharedState, requests: mpsc::Receiver<Direction>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            state,
            requests,
            rng,
        }
    }

    /// Inserts one vehicle for `direction` under the shared lock.
    pub fn spawn(&mut self, direction: Direction) -> u64 {
        let color: u32 = self.rng.random();
        lock_state(&self.state).spawn_vehicle(direction, color)
    }

    pub fn spawn_random(&mut self) -> u64 {
        let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
        self.spawn(direction)
    }

    /// Runs until shutdown. With no cadence only requests create vehicles.
    pub async fn run(mut self, cadence: Option<Duration>, mut shutdown: Shutdown) {
        let mut ticker = cadence.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        // interval() fires immediately; the first automatic vehicle comes one period in.
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }
        debug!("Spawner started (cadence {:?})", cadence);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                request = self.requests.recv() => match request {
                    Some(direction) => {
                        self.spawn(direction);
                    }
                    None => break,
                },
                _ = next_cadence(&mut ticker) => {
                    self.spawn_random();
                }
            }
        }
        debug!("Spawner stopped");
    }
}

async fn next_cadence(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
