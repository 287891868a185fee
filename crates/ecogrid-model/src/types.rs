//! Selectors shared by the configuration, the optimizer, and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// What the optimizer minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Σ x[i][j] · carbon_intensity[j], subject to the latency bound.
    #[default]
    Carbon,
    /// Σ x[i][j] · latency[i][j]; the latency bound is not applied.
    Latency,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Carbon => "carbon",
            Objective::Latency => "latency",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "carbon" => Ok(Objective::Carbon),
            "latency" => Ok(Objective::Latency),
            other => Err(ModelError::Config(format!(
                "unknown objective '{other}' (expected carbon or latency)"
            ))),
        }
    }
}

/// How requests are assigned each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Exact integer program for both placement and routing.
    #[default]
    Lp,
    /// Fill the lowest-latency servers first.
    LatencyGreedy,
    /// Fill the lowest-carbon servers first.
    CarbonGreedy,
    /// Prefer servers within a latency threshold, carbon-sorted.
    CarbonAwareNaive,
    /// Replay recorded per-destination traffic.
    Replay,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Lp => "lp",
            StrategyKind::LatencyGreedy => "latency-greedy",
            StrategyKind::CarbonGreedy => "carbon-greedy",
            StrategyKind::CarbonAwareNaive => "carbon-aware-naive",
            StrategyKind::Replay => "replay",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the kebab-case form and the snake_case spelling.
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "lp" => Ok(StrategyKind::Lp),
            "latency-greedy" => Ok(StrategyKind::LatencyGreedy),
            "carbon-greedy" => Ok(StrategyKind::CarbonGreedy),
            "carbon-aware-naive" => Ok(StrategyKind::CarbonAwareNaive),
            "replay" => Ok(StrategyKind::Replay),
            other => Err(ModelError::Config(format!("unknown strategy '{other}'"))),
        }
    }
}

/// How destination capacity is expressed to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapacityShare {
    /// Each server offers its full capacity every tick.
    #[default]
    PerServer,
    /// A destination offers `ceil(count·capacity / ticks_per_hour)` per tick.
    ///
    /// Rounding up keeps every tick routable on a fleet sized for the hour:
    /// tick demand is floored per origin, so it never needs more than the
    /// hourly plan's share.
    PerTick,
}

impl CapacityShare {
    /// Capacity a destination offers to one routing call.
    pub fn destination_capacity(&self, servers: u64, capacity: u64, ticks_per_hour: u32) -> u64 {
        let full = servers.saturating_mul(capacity);
        match self {
            CapacityShare::PerServer => full,
            CapacityShare::PerTick => full.div_ceil(u64::from(ticks_per_hour.max(1))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_parses_case_insensitively() {
        assert_eq!("Carbon".parse::<Objective>().unwrap(), Objective::Carbon);
        assert_eq!("latency".parse::<Objective>().unwrap(), Objective::Latency);
        assert!("cost".parse::<Objective>().is_err());
    }

    #[test]
    fn strategy_accepts_snake_case() {
        assert_eq!(
            "carbon_aware_naive".parse::<StrategyKind>().unwrap(),
            StrategyKind::CarbonAwareNaive
        );
        assert_eq!(
            "latency-greedy".parse::<StrategyKind>().unwrap(),
            StrategyKind::LatencyGreedy
        );
        assert_eq!(StrategyKind::CarbonGreedy.to_string(), "carbon-greedy");
    }

    #[test]
    fn per_tick_share_divides_capacity() {
        let share = CapacityShare::PerTick;
        assert_eq!(share.destination_capacity(3, 10, 6), 5); // 30 / 6
        assert_eq!(share.destination_capacity(1, 5, 2), 3);
        assert_eq!(CapacityShare::PerServer.destination_capacity(3, 10, 6), 30);
        // A zero tick count is treated as one tick.
        assert_eq!(share.destination_capacity(1, 10, 0), 10);
    }
}
