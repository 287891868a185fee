//! ServerFleet — per-region server accounting.
//!
//! Servers live in a single vector in insertion order. Every per-region view
//! is derived from it on demand; there is no cached count that could drift
//! from the servers actually held.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ecogrid_model::RegionId;

use crate::error::{FleetError, FleetResult};
use crate::server::{Server, ServerId};

/// Servers added and removed per region by one migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub added: Vec<u64>,
    pub removed: Vec<u64>,
}

impl MigrationReport {
    /// Total instances added plus removed.
    pub fn churn(&self) -> u64 {
        self.added.iter().sum::<u64>() + self.removed.iter().sum::<u64>()
    }

    pub fn is_noop(&self) -> bool {
        self.churn() == 0
    }
}

/// Outcome of pushing one routing matrix onto the fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Load that reached servers, per destination region.
    pub served: Vec<u64>,
    /// Load with no server capacity left, per destination region.
    pub dropped: Vec<u64>,
}

impl LoadReport {
    pub fn total_dropped(&self) -> u64 {
        self.dropped.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct ServerFleet {
    region_count: usize,
    capacity: u64,
    servers: Vec<Server>,
    next_id: ServerId,
}

impl ServerFleet {
    /// An empty fleet over `region_count` regions whose servers all have
    /// `capacity` request units.
    pub fn new(region_count: usize, capacity: u64) -> Self {
        Self {
            region_count,
            capacity,
            servers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn region_count(&self) -> usize {
        self.region_count
    }

    /// Per-server capacity.
    pub fn server_capacity(&self) -> u64 {
        self.capacity
    }

    /// All servers in fleet order.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    // ── Derived views ──────────────────────────────────────────────

    pub fn counts_per_region(&self) -> Vec<u64> {
        let mut counts = vec![0; self.region_count];
        for s in &self.servers {
            counts[s.region()] += 1;
        }
        counts
    }

    pub fn capacity_per_region(&self) -> Vec<u64> {
        self.counts_per_region()
            .into_iter()
            .map(|n| n * self.capacity)
            .collect()
    }

    pub fn utilization_per_region(&self) -> Vec<u64> {
        let mut used = vec![0; self.region_count];
        for s in &self.servers {
            used[s.region()] += s.utilization();
        }
        used
    }

    pub fn utilization_left_per_region(&self) -> Vec<u64> {
        let mut left = vec![0; self.region_count];
        for s in &self.servers {
            left[s.region()] += s.utilization_left();
        }
        left
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Migrate to `target[region]` servers with minimal churn.
    ///
    /// Surplus regions lose exactly the surplus, oldest servers first.
    /// Deficit regions gain fresh servers appended at the end of the fleet.
    pub fn apply_placement(&mut self, target: &[u64]) -> FleetResult<MigrationReport> {
        self.check_shape(target.len())?;

        let current = self.counts_per_region();
        let mut report = MigrationReport {
            added: vec![0; self.region_count],
            removed: vec![0; self.region_count],
        };
        for region in 0..self.region_count {
            if target[region] > current[region] {
                report.added[region] = target[region] - current[region];
            } else {
                report.removed[region] = current[region] - target[region];
            }
        }

        let mut to_remove = report.removed.clone();
        self.servers.retain(|s| {
            let pending = &mut to_remove[s.region()];
            if *pending > 0 {
                *pending -= 1;
                false
            } else {
                true
            }
        });

        for (region, &n) in report.added.iter().enumerate() {
            for _ in 0..n {
                let id = self.next_id;
                self.next_id += 1;
                self.servers.push(Server::new(id, region, self.capacity));
            }
        }

        let after = self.counts_per_region();
        for region in 0..self.region_count {
            if after[region] != target[region] {
                return Err(FleetError::ConsistencyFault {
                    region,
                    expected: target[region],
                    actual: after[region],
                });
            }
        }

        if report.is_noop() {
            debug!(servers = self.len(), "fleet already at target, no migration");
        } else {
            info!(
                from = ?current,
                to = ?after,
                churn = report.churn(),
                "migrated fleet"
            );
        }
        Ok(report)
    }

    /// Push a routing matrix `routing[origin][dest]` onto the fleet.
    ///
    /// Each destination's column sum is spread first-fit over that region's
    /// servers in fleet order; whatever does not fit is dropped.
    pub fn apply_load(&mut self, routing: &[Vec<u64>]) -> FleetResult<LoadReport> {
        self.check_shape(routing.len())?;

        let mut incoming = vec![0u64; self.region_count];
        for row in routing {
            self.check_shape(row.len())?;
            for (dest, &load) in row.iter().enumerate() {
                incoming[dest] += load;
            }
        }

        let mut report = LoadReport {
            served: vec![0; self.region_count],
            dropped: vec![0; self.region_count],
        };
        for (region, &load) in incoming.iter().enumerate() {
            let dropped = self.fill_region(region, load);
            report.served[region] = load - dropped;
            report.dropped[region] = dropped;
            if dropped > 0 {
                warn!(region, load, dropped, "insufficient server capacity, dropping load");
            }
        }
        Ok(report)
    }

    pub fn reset_utilization(&mut self) {
        for s in &mut self.servers {
            s.reset_utilization();
        }
    }

    fn fill_region(&mut self, region: RegionId, mut load: u64) -> u64 {
        for s in self.servers.iter_mut().filter(|s| s.region() == region) {
            if load == 0 {
                break;
            }
            let take = load.min(s.utilization_left());
            if take > 0 {
                s.push(take);
                load -= take;
            }
        }
        load
    }

    fn check_shape(&self, actual: usize) -> FleetResult<()> {
        if actual != self.region_count {
            return Err(FleetError::ShapeMismatch {
                expected: self.region_count,
                actual,
            });
        }
        Ok(())
    }
}
