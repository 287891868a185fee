//! Replay of recorded per-destination traffic.
//!
//! No optimization happens: the hour's recorded `breakdown[origin][dest]`
//! decides both the fleet (enough servers at each destination to absorb
//! what it received) and the routing (the recorded flows split evenly
//! across ticks).

use ecogrid_model::{ModelResult, RegionModel};

/// Hourly load per `[origin][dest]` at hour `t`, floored to whole requests.
pub fn hourly_flows(model: &RegionModel, t: usize) -> ModelResult<Vec<Vec<u64>>> {
    (0..model.region_count())
        .map(|origin| {
            Ok(model
                .demand_breakdown(origin, t)?
                .iter()
                .map(|v| v.max(0.0).floor() as u64)
                .collect())
        })
        .collect()
}

/// Servers per destination: `ceil(incoming / capacity)`.
pub fn replay_servers(flows: &[Vec<u64>], server_capacity: u64) -> Vec<u64> {
    let n = flows.len();
    (0..n)
        .map(|dest| {
            let incoming: u64 = flows.iter().map(|row| row[dest]).sum();
            incoming.div_ceil(server_capacity.max(1))
        })
        .collect()
}

/// The per-tick share of each recorded flow.
pub fn replay_routing(flows: &[Vec<u64>], ticks_per_hour: u32) -> Vec<Vec<u64>> {
    let ticks = u64::from(ticks_per_hour.max(1));
    flows
        .iter()
        .map(|row| row.iter().map(|v| v / ticks).collect())
        .collect()
}
