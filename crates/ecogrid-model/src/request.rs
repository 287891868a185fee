//! Per-tick request batches.

use serde::{Deserialize, Serialize};

use crate::region::{RegionId, RegionModel};

/// Aggregated demand from one region for the current tick.
///
/// A request is one unit of uniform cost; `load` counts units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBatch {
    pub origin: RegionId,
    pub load: u64,
}

impl RequestBatch {
    pub fn new(origin: RegionId, load: u64) -> Self {
        Self { origin, load }
    }
}

/// Build one batch per region for hour `t`.
///
/// `constant_rate` replaces the demand series when set. With
/// `ticks_per_hour` the hourly rate is split evenly across ticks (integer
/// floor); without it the full hourly rate is returned, which is what the
/// hourly provisioning step uses as its forecast.
pub fn build_batches(
    model: &RegionModel,
    t: usize,
    ticks_per_hour: Option<u32>,
    constant_rate: Option<u64>,
) -> Vec<RequestBatch> {
    (0..model.region_count())
        .map(|region| {
            let hourly = match constant_rate {
                Some(rate) => rate,
                None => model.demand(region, t).max(0.0).floor() as u64,
            };
            let load = match ticks_per_hour {
                Some(ticks) => hourly / u64::from(ticks.max(1)),
                None => hourly,
            };
            RequestBatch::new(region, load)
        })
        .collect()
}

/// Loads of `batches`, in region order.
pub fn loads(batches: &[RequestBatch]) -> Vec<u64> {
    batches.iter().map(|b| b.load).collect()
}
