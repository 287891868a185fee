//! ecogrid-model — the static inputs of a fleet simulation.
//!
//! Everything here is loaded once before a run and never mutated while it
//! executes:
//!
//! - **`region`** — `RegionCatalog` (names + sanitized latency matrix) and
//!   `RegionModel` (per-region carbon-intensity and demand series)
//! - **`request`** — `RequestBatch`, the per-tick aggregated demand of a region
//! - **`config`** — `SimConfig`, parsed from TOML
//! - **`scenario`** — JSON scenario documents that build a `RegionModel`
//! - **`types`** — objective / strategy / capacity-share selectors

pub mod config;
pub mod error;
pub mod region;
pub mod request;
pub mod scenario;
pub mod types;

pub use config::SimConfig;
pub use error::{ModelError, ModelResult};
pub use region::{LATENCY_PENALTY, RegionCatalog, RegionId, RegionModel, RegionSeries};
pub use request::{RequestBatch, build_batches};
pub use scenario::{Scenario, ScenarioRegion};
pub use types::{CapacityShare, Objective, StrategyKind};
