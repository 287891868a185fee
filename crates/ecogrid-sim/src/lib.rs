//! ecogrid-sim — the discrete-time simulation driver.
//!
//! ```text
//! for hour t in 0..=T
//!   forecast → Optimizer::provision → ServerFleet::apply_placement
//!   for tick k in 0..ticks_per_hour
//!     batches → Optimizer::route → ServerFleet::apply_load
//!     IntervalRecord → MetricsSink
//!     ServerFleet::reset_utilization
//! ```
//!
//! The run is single-threaded and deterministic. The first error aborts it.

pub mod driver;
pub mod error;

pub use driver::Simulation;
pub use error::{SimError, SimResult};
