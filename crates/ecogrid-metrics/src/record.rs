//! Per-interval records.
//!
//! A record is built once per tick from the tick's routing matrix and the
//! fleet state after the load was applied. Vectors are indexed by region.

use serde::{Deserialize, Serialize};

/// Raw inputs for one interval.
#[derive(Debug, Clone, Copy)]
pub struct IntervalInputs<'a> {
    pub timestep: usize,
    pub sub_interval: usize,
    /// `routing[origin][dest]`.
    pub routing: &'a [Vec<u64>],
    /// Load the router could not place, per origin.
    pub routing_dropped: &'a [u64],
    /// Load that reached a destination without server room, per destination.
    pub overflow: &'a [u64],
    pub latency: &'a [Vec<f64>],
    pub carbon_intensity: &'a [f64],
    pub utilization: &'a [u64],
    pub server_counts: &'a [u64],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub timestep: usize,
    pub sub_interval: usize,
    /// Offered load per origin, routed or not.
    pub demand: Vec<u64>,
    /// Routed load per origin.
    pub requests_from: Vec<u64>,
    /// Routed load per destination.
    pub requests_to: Vec<u64>,
    pub carbon_intensity: Vec<f64>,
    /// Served load times carbon intensity, per destination.
    pub carbon_emissions: Vec<f64>,
    /// Request-weighted latency of each origin's routed load.
    pub latency: Vec<f64>,
    /// Router drops at the origin plus overflow at the destination.
    pub dropped: Vec<u64>,
    pub utilization: Vec<u64>,
    pub server_counts: Vec<u64>,
    pub total_demand: u64,
    pub total_requests: u64,
    pub total_emissions: f64,
    pub total_dropped: u64,
    pub total_servers: u64,
    /// Request-weighted latency over every routed request.
    pub mean_latency: f64,
}

/// One region's slice of an interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub timestep: usize,
    pub sub_interval: usize,
    pub region: String,
    pub demand: u64,
    pub requests_from: u64,
    pub requests_to: u64,
    pub carbon_intensity: f64,
    pub carbon_emissions: f64,
    pub latency: f64,
    pub dropped: u64,
    pub utilization: u64,
    pub servers: u64,
}

impl IntervalRecord {
    pub fn from_inputs(inputs: IntervalInputs<'_>) -> Self {
        let n = inputs.routing.len();

        let requests_from: Vec<u64> = inputs.routing.iter().map(|row| row.iter().sum()).collect();
        let requests_to: Vec<u64> = (0..n)
            .map(|j| inputs.routing.iter().map(|row| row[j]).sum())
            .collect();

        let demand: Vec<u64> = requests_from
            .iter()
            .zip(inputs.routing_dropped)
            .map(|(routed, dropped)| routed + dropped)
            .collect();

        let dropped: Vec<u64> = inputs
            .routing_dropped
            .iter()
            .zip(inputs.overflow)
            .map(|(a, b)| a + b)
            .collect();

        let carbon_emissions: Vec<f64> = (0..n)
            .map(|j| {
                let served = requests_to[j].saturating_sub(inputs.overflow[j]);
                served as f64 * inputs.carbon_intensity[j]
            })
            .collect();

        let weighted: Vec<f64> = inputs
            .routing
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, &x)| x as f64 * inputs.latency[i][j])
                    .sum()
            })
            .collect();
        let latency = weighted
            .iter()
            .zip(&requests_from)
            .map(|(w, &r)| if r == 0 { 0.0 } else { w / r as f64 })
            .collect();

        let total_requests: u64 = requests_from.iter().sum();
        let mean_latency = if total_requests == 0 {
            0.0
        } else {
            weighted.iter().sum::<f64>() / total_requests as f64
        };

        Self {
            timestep: inputs.timestep,
            sub_interval: inputs.sub_interval,
            total_demand: demand.iter().sum(),
            total_requests,
            total_emissions: carbon_emissions.iter().sum(),
            total_dropped: dropped.iter().sum(),
            total_servers: inputs.server_counts.iter().sum(),
            mean_latency,
            demand,
            requests_from,
            requests_to,
            carbon_intensity: inputs.carbon_intensity.to_vec(),
            carbon_emissions,
            latency,
            dropped,
            utilization: inputs.utilization.to_vec(),
            server_counts: inputs.server_counts.to_vec(),
        }
    }

    pub fn region_count(&self) -> usize {
        self.requests_from.len()
    }

    /// Flatten to one row per region. Regions past the end of `names` are
    /// labelled by index.
    pub fn rows(&self, names: &[String]) -> Vec<FlatRow> {
        (0..self.region_count())
            .map(|r| FlatRow {
                timestep: self.timestep,
                sub_interval: self.sub_interval,
                region: names.get(r).cloned().unwrap_or_else(|| r.to_string()),
                demand: self.demand[r],
                requests_from: self.requests_from[r],
                requests_to: self.requests_to[r],
                carbon_intensity: self.carbon_intensity[r],
                carbon_emissions: self.carbon_emissions[r],
                latency: self.latency[r],
                dropped: self.dropped[r],
                utilization: self.utilization[r],
                servers: self.server_counts[r],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IntervalRecord {
        let routing = vec![vec![10, 2], vec![0, 3]];
        let latency = vec![vec![0.0, 5.0], vec![5.0, 0.0]];
        IntervalRecord::from_inputs(IntervalInputs {
            timestep: 3,
            sub_interval: 1,
            routing: &routing,
            routing_dropped: &[1, 0],
            overflow: &[0, 2],
            latency: &latency,
            carbon_intensity: &[100.0, 50.0],
            utilization: &[10, 3],
            server_counts: &[1, 1],
        })
    }

    #[test]
    fn aggregates_per_region_and_totals() {
        let r = record();

        assert_eq!(r.requests_from, vec![12, 3]);
        assert_eq!(r.requests_to, vec![10, 5]);
        assert_eq!(r.demand, vec![13, 3]);
        assert_eq!(r.dropped, vec![1, 2]);
        // Region 1 received 5 but only served 3.
        assert_eq!(r.carbon_emissions, vec![1000.0, 150.0]);
        assert_eq!(r.total_emissions, 1150.0);
        assert_eq!(r.total_demand, 16);
        assert_eq!(r.total_requests, 15);
        assert_eq!(r.total_dropped, 3);
        assert_eq!(r.total_servers, 2);
    }

    #[test]
    fn latency_is_request_weighted() {
        let r = record();

        assert!((r.latency[0] - 10.0 / 12.0).abs() < 1e-9);
        assert_eq!(r.latency[1], 0.0);
        assert!((r.mean_latency - 10.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn idle_interval_has_zero_latency() {
        let routing = vec![vec![0, 0], vec![0, 0]];
        let latency = vec![vec![0.0, 5.0], vec![5.0, 0.0]];
        let r = IntervalRecord::from_inputs(IntervalInputs {
            timestep: 0,
            sub_interval: 0,
            routing: &routing,
            routing_dropped: &[0, 0],
            overflow: &[0, 0],
            latency: &latency,
            carbon_intensity: &[1.0, 1.0],
            utilization: &[0, 0],
            server_counts: &[0, 0],
        });
        assert_eq!(r.mean_latency, 0.0);
        assert_eq!(r.latency, vec![0.0, 0.0]);
    }

    #[test]
    fn rows_flatten_one_per_region() {
        let rows = record().rows(&["us-west".to_string()]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region, "us-west");
        assert_eq!(rows[1].region, "1");
        assert_eq!(rows[1].requests_to, 5);
        assert_eq!(rows[1].dropped, 2);
        assert!(rows.iter().all(|row| row.timestep == 3 && row.sub_interval == 1));
    }
}
