//! Greedy routing baselines.
//!
//! Each policy ranks the fleet's servers for a batch's origin, then
//! [`fill_sequential`] walks the ranking taking as much load as each server
//! still has room for. Load left over once every server is full is dropped.
//!
//! Ranking uses a stable sort over fleet order, so servers with equal keys
//! keep the order the fleet holds them in.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ecogrid_fleet::Server;
use ecogrid_model::RequestBatch;

/// How servers are ranked for one origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GreedyPolicy {
    /// Nearest servers first.
    LatencyGreedy,
    /// Cleanest servers first.
    CarbonGreedy,
    /// Cleanest servers within `latency_threshold` first, then the cleanest
    /// of the rest.
    CarbonAwareNaive { latency_threshold: f64 },
}

/// Result of filling one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillOutcome {
    /// `(server position, load)` in fill order.
    pub pushes: Vec<(usize, u64)>,
    pub dropped: u64,
}

/// Routing produced by a greedy policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreedyRouting {
    pub routing: Vec<Vec<u64>>,
    pub dropped: Vec<u64>,
}

/// Rank server positions for a batch from `origin`.
pub fn rank_servers(
    policy: &GreedyPolicy,
    origin: usize,
    servers: &[Server],
    latency: &[Vec<f64>],
    carbon_intensity: &[f64],
) -> Vec<usize> {
    let lat = |idx: usize| latency[origin][servers[idx].region()];
    let ci = |idx: usize| carbon_intensity[servers[idx].region()];

    let mut order: Vec<usize> = (0..servers.len()).collect();
    match policy {
        GreedyPolicy::LatencyGreedy => order.sort_by(|&a, &b| lat(a).total_cmp(&lat(b))),
        GreedyPolicy::CarbonGreedy => order.sort_by(|&a, &b| ci(a).total_cmp(&ci(b))),
        GreedyPolicy::CarbonAwareNaive { latency_threshold } => {
            let far = |idx: usize| lat(idx) > *latency_threshold;
            order.sort_by(|&a, &b| match far(a).cmp(&far(b)) {
                Ordering::Equal => ci(a).total_cmp(&ci(b)),
                other => other,
            });
        }
    }
    order
}

/// Fill `load` over `remaining` in order.
///
/// `remaining` holds `(server position, capacity left)` pairs and is
/// decremented in place. A server with less room than the outstanding load
/// takes exactly its room; empty servers are skipped.
pub fn fill_sequential(remaining: &mut [(usize, u64)], mut load: u64) -> FillOutcome {
    let mut pushes = Vec::new();
    for (server, left) in remaining.iter_mut() {
        if load == 0 {
            break;
        }
        if *left == 0 {
            continue;
        }
        let take = load.min(*left);
        *left -= take;
        load -= take;
        pushes.push((*server, take));
    }
    FillOutcome {
        pushes,
        dropped: load,
    }
}

/// Route every batch with `policy`, origins in region order.
///
/// `server_offer` is what one server may take in this call; servers also
/// never exceed their remaining utilization headroom.
pub fn route_greedy(
    policy: &GreedyPolicy,
    batches: &[RequestBatch],
    servers: &[Server],
    latency: &[Vec<f64>],
    carbon_intensity: &[f64],
    server_offer: u64,
) -> GreedyRouting {
    let n = latency.len();
    let mut routing = vec![vec![0u64; n]; n];
    let mut dropped = vec![0u64; n];
    let mut room: Vec<u64> = servers
        .iter()
        .map(|s| server_offer.min(s.utilization_left()))
        .collect();

    for batch in batches {
        let order = rank_servers(policy, batch.origin, servers, latency, carbon_intensity);
        let mut ranked: Vec<(usize, u64)> = order.iter().map(|&idx| (idx, room[idx])).collect();

        let outcome = fill_sequential(&mut ranked, batch.load);
        for &(idx, left) in &ranked {
            room[idx] = left;
        }
        for &(idx, load) in &outcome.pushes {
            routing[batch.origin][servers[idx].region()] += load;
        }
        dropped[batch.origin] += outcome.dropped;

        if outcome.dropped > 0 {
            warn!(
                origin = batch.origin,
                load = batch.load,
                dropped = outcome.dropped,
                "greedy routing ran out of capacity"
            );
        } else {
            debug!(origin = batch.origin, servers = outcome.pushes.len(), "batch placed");
        }
    }

    GreedyRouting { routing, dropped }
}
