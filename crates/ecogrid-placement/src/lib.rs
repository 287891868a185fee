//! ecogrid-placement — where servers go, and where requests go.
//!
//! Two decisions are made per simulated hour:
//!
//! - **Provision** — how many servers each region should run, sized against
//!   the hour's demand forecast
//! - **Route** — per tick, how much of each region's load goes to each
//!   destination given the fleet that was provisioned
//!
//! # Components
//!
//! - **`lp`** — integer programs for both decisions, solved by `good_lp`
//! - **`greedy`** — latency / carbon / naive carbon-aware fill baselines
//! - **`replay`** — recorded per-destination traffic, no solver
//! - **`strategy`** — `RoutingStrategy`, the configured router variant
//! - **`optimizer`** — `Optimizer`, the facade the simulation drives

pub mod error;
pub mod greedy;
pub mod lp;
pub mod optimizer;
pub mod replay;
pub mod strategy;

pub use error::{InfeasibilitySnapshot, OptimizerError, OptimizerResult, Phase};
pub use greedy::{FillOutcome, GreedyPolicy, GreedyRouting, fill_sequential, rank_servers, route_greedy};
pub use lp::{LpProblem, LpSolution};
pub use optimizer::{Optimizer, OptimizerSettings, PlacementResult, RoutingResult};
pub use strategy::RoutingStrategy;
