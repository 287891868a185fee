//! Routing strategies — LP, greedy baselines, replay.

use serde::{Deserialize, Serialize};

use ecogrid_model::{SimConfig, StrategyKind};

use crate::greedy::GreedyPolicy;

/// How the router assigns each tick's load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RoutingStrategy {
    /// Solve the routing program.
    #[default]
    Lp,
    LatencyGreedy,
    CarbonGreedy,
    CarbonAwareNaive { latency_threshold: f64 },
    /// Replay recorded per-destination traffic.
    Replay,
}

impl RoutingStrategy {
    pub fn from_config(config: &SimConfig) -> Self {
        match config.strategy {
            StrategyKind::Lp => Self::Lp,
            StrategyKind::LatencyGreedy => Self::LatencyGreedy,
            StrategyKind::CarbonGreedy => Self::CarbonGreedy,
            StrategyKind::CarbonAwareNaive => Self::CarbonAwareNaive {
                latency_threshold: config.naive_latency_threshold,
            },
            StrategyKind::Replay => Self::Replay,
        }
    }

    /// The greedy policy this strategy routes with, if any.
    pub fn greedy_policy(&self) -> Option<GreedyPolicy> {
        match self {
            Self::LatencyGreedy => Some(GreedyPolicy::LatencyGreedy),
            Self::CarbonGreedy => Some(GreedyPolicy::CarbonGreedy),
            Self::CarbonAwareNaive { latency_threshold } => Some(GreedyPolicy::CarbonAwareNaive {
                latency_threshold: *latency_threshold,
            }),
            Self::Lp | Self::Replay => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lp => "lp",
            Self::LatencyGreedy => "latency-greedy",
            Self::CarbonGreedy => "carbon-greedy",
            Self::CarbonAwareNaive { .. } => "carbon-aware-naive",
            Self::Replay => "replay",
        }
    }
}
