//! ecogrid-fleet — the mutable server fleet.
//!
//! The fleet owns every [`Server`] in insertion order. It changes in exactly
//! three ways, all driven by the simulation loop:
//!
//! ```text
//! ServerFleet
//!   ├── apply_placement() ← once per hour, minimal-churn migration
//!   ├── apply_load()      ← once per tick, first-fit per region
//!   └── reset_utilization() ← at every tick boundary
//! ```

pub mod error;
pub mod fleet;
pub mod server;

pub use error::{FleetError, FleetResult};
pub use fleet::{LoadReport, MigrationReport, ServerFleet};
pub use server::{Server, ServerId};
