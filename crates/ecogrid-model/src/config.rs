//! Run configuration (`ecogrid.toml`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::types::{CapacityShare, Objective, StrategyKind};

/// Latency threshold used by the carbon-aware-naive heuristic by default.
pub const DEFAULT_NAIVE_LATENCY_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Last simulated hour; the run covers hours `0..=timesteps`.
    pub timesteps: usize,
    /// Routing ticks per hour.
    pub sub_intervals_per_hour: u32,
    /// Upper bound on servers across all regions.
    pub max_servers: u64,
    /// Latency bound for the carbon objective. Absent means unbounded.
    pub max_latency: Option<f64>,
    /// Request units one server absorbs per tick.
    pub server_capacity: u64,
    pub objective: Objective,
    pub strategy: StrategyKind,
    /// Fixed hourly request rate for every region, replacing the demand series.
    pub constant_request_rate: Option<u64>,
    /// First hour of the input series used by the run.
    pub start_offset: usize,
    pub capacity_share: CapacityShare,
    /// Threshold separating "near" from "far" servers for carbon-aware-naive.
    pub naive_latency_threshold: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timesteps: 24,
            sub_intervals_per_hour: 6,
            max_servers: 1000,
            max_latency: None,
            server_capacity: 1_000_000,
            objective: Objective::Carbon,
            strategy: StrategyKind::Lp,
            constant_request_rate: None,
            start_offset: 0,
            capacity_share: CapacityShare::PerServer,
            naive_latency_threshold: DEFAULT_NAIVE_LATENCY_THRESHOLD,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ModelResult<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ModelResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of hours the run reads from the series.
    pub fn hours(&self) -> usize {
        self.timesteps + 1
    }

    /// Latency bound as a float; `f64::INFINITY` when unbounded.
    pub fn latency_bound(&self) -> f64 {
        self.max_latency.unwrap_or(f64::INFINITY)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.sub_intervals_per_hour == 0 {
            return Err(ModelError::Config(
                "sub_intervals_per_hour must be at least 1".to_string(),
            ));
        }
        if self.server_capacity == 0 {
            return Err(ModelError::Config(
                "server_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(bound) = self.max_latency
            && (bound.is_nan() || bound < 0.0)
        {
            return Err(ModelError::Config(format!(
                "max_latency must be non-negative, got {bound}"
            )));
        }
        if self.naive_latency_threshold.is_nan() || self.naive_latency_threshold < 0.0 {
            return Err(ModelError::Config(format!(
                "naive_latency_threshold must be non-negative, got {}",
                self.naive_latency_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = SimConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("timesteps = 24"));

        let back = SimConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn parse_partial_file_fills_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
timesteps = 2
objective = "latency"
strategy = "carbon-aware-naive"
max_latency = 80.0
"#,
        )
        .unwrap();

        assert_eq!(config.timesteps, 2);
        assert_eq!(config.hours(), 3);
        assert_eq!(config.objective, Objective::Latency);
        assert_eq!(config.strategy, StrategyKind::CarbonAwareNaive);
        assert_eq!(config.latency_bound(), 80.0);
        assert_eq!(config.sub_intervals_per_hour, 6);
    }

    #[test]
    fn missing_bound_is_infinite() {
        assert!(SimConfig::default().latency_bound().is_infinite());
    }

    #[test]
    fn zero_ticks_rejected() {
        let err = SimConfig::from_toml_str("sub_intervals_per_hour = 0").unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }

    #[test]
    fn negative_bound_rejected() {
        let config = SimConfig {
            max_latency: Some(-1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecogrid.toml");
        std::fs::write(&path, "max_servers = 8\nserver_capacity = 10\n").unwrap();

        let config = SimConfig::from_file(&path).unwrap();
        assert_eq!(config.max_servers, 8);
        assert_eq!(config.server_capacity, 10);
    }
}
