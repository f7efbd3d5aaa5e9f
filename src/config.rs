use crate::error::ConfigError;
use crate::global_variables::{
    DEFAULT_EW_GREEN_TICKS, DEFAULT_EW_YELLOW_TICKS, DEFAULT_MAX_OCCUPANCY,
    DEFAULT_NS_GREEN_TICKS, DEFAULT_NS_YELLOW_TICKS, DEFAULT_SPAWN_MS, DEFAULT_STEP_LENGTH,
    DEFAULT_TICK_MS, DEFAULT_WORKER_COUNT, JOB_QUEUE_CAPACITY, RESULT_QUEUE_CAPACITY,
    SNAPSHOT_QUEUE_CAPACITY, SPAWN_QUEUE_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables of one simulation run. Every field is optional in JSON and
/// falls back to the defaults in `global_variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tick_interval_ms: u64,
    /// Automatic spawn cadence; `None` spawns only on request.
    pub spawn_interval_ms: Option<u64>,
    pub spawn_seed: Option<u64>,
    pub worker_count: usize,
    pub step_length: f64,
    pub max_occupancy: usize,
    pub ns_green_ticks: u32,
    pub ns_yellow_ticks: u32,
    pub ew_green_ticks: u32,
    pub ew_yellow_ticks: u32,
    pub job_queue_capacity: usize,
    pub result_queue_capacity: usize,
    pub spawn_queue_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            spawn_interval_ms: Some(DEFAULT_SPAWN_MS),
            spawn_seed: None,
            worker_count: DEFAULT_WORKER_COUNT,
            step_length: DEFAULT_STEP_LENGTH,
            max_occupancy: DEFAULT_MAX_OCCUPANCY,
            ns_green_ticks: DEFAULT_NS_GREEN_TICKS,
            ns_yellow_ticks: DEFAULT_NS_YELLOW_TICKS,
            ew_green_ticks: DEFAULT_EW_GREEN_TICKS,
            ew_yellow_ticks: DEFAULT_EW_YELLOW_TICKS,
            job_queue_capacity: JOB_QUEUE_CAPACITY,
            result_queue_capacity: RESULT_QUEUE_CAPACITY,
            spawn_queue_capacity: SPAWN_QUEUE_CAPACITY,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.spawn_interval_ms == Some(0) {
            return Err(ConfigError::Invalid("spawn_interval_ms must be positive".into()));
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid("worker_count must be positive".into()));
        }
        if !(self.step_length.is_finite() && self.step_length > 0.0) {
            return Err(ConfigError::Invalid("step_length must be a positive number".into()));
        }
        if self.max_occupancy == 0 {
            return Err(ConfigError::Invalid("max_occupancy must be positive".into()));
        }
        let durations = [
            ("ns_green_ticks", self.ns_green_ticks),
            ("ns_yellow_ticks", self.ns_yellow_ticks),
            ("ew_green_ticks", self.ew_green_ticks),
            ("ew_yellow_ticks", self.ew_yellow_ticks),
        ];
        for (name, ticks) in durations {
            if ticks == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        let ns_cycle = self.ns_green_ticks.checked_add(self.ns_yellow_ticks);
        let ew_cycle = self.ew_green_ticks.checked_add(self.ew_yellow_ticks);
        match (ns_cycle, ew_cycle) {
            (Some(ns), Some(ew)) if ns.checked_add(ew).is_some() => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "signal durations overflow one light cycle".into(),
                ))
            }
        }
        let capacities = [
            ("job_queue_capacity", self.job_queue_capacity),
            ("result_queue_capacity", self.result_queue_capacity),
            ("spawn_queue_capacity", self.spawn_queue_capacity),
        ];
        for (name, capacity) in capacities {
            if capacity == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn spawn_interval(&self) -> Option<Duration> {
        self.spawn_interval_ms.map(Duration::from_millis)
    }

    pub fn snapshot_capacity(&self) -> usize {
        SNAPSHOT_QUEUE_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(60));
        assert_eq!(config.spawn_interval(), Some(Duration::from_millis(900)));
        assert_eq!(config.max_occupancy, 3);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config =
            SimConfig::from_json_str(r#"{ "worker_count": 8, "spawn_interval_ms": null }"#)
                .unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.spawn_interval_ms, None);
        assert_eq!(config.ns_green_ticks, DEFAULT_NS_GREEN_TICKS);
    }

    #[test]
    fn rejects_zero_durations() {
        let err = SimConfig::from_json_str(r#"{ "ew_yellow_ticks": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("ew_yellow_ticks")));
    }

    #[test]
    fn rejects_durations_that_overflow_a_cycle() {
        let err = SimConfig::from_json_str(r#"{ "ns_green_ticks": 4294967295, "ns_yellow_ticks": 1 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("overflow")));

        let whole_cycle = SimConfig {
            ns_green_ticks: u32::MAX / 2,
            ns_yellow_ticks: 1,
            ew_green_ticks: u32::MAX / 2,
            ew_yellow_ticks: 2,
            ..SimConfig::default()
        };
        assert!(whole_cycle.validate().is_err());

        let largest = SimConfig {
            ns_green_ticks: u32::MAX - 3,
            ns_yellow_ticks: 1,
            ew_green_ticks: 1,
            ew_yellow_ticks: 1,
            ..SimConfig::default()
        };
        largest.validate().unwrap();
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SimConfig::from_json_str("{ worker_count: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SimConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("here.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("sim_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "tick_interval_ms": 10, "spawn_seed": 7 }"#).unwrap();
        let config = SimConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.spawn_seed, Some(7));
    }
}
