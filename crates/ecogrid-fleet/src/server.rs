//! A single server.

use serde::{Deserialize, Serialize};

use ecogrid_model::RegionId;

/// Monotonic identifier assigned by the fleet.
pub type ServerId = u64;

/// A server with fixed capacity living in one region.
///
/// `utilization <= capacity` holds after every mutation; pushing past
/// capacity is a programming fault and panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    id: ServerId,
    region: RegionId,
    capacity: u64,
    utilization: u64,
}

impl Server {
    pub fn new(id: ServerId, region: RegionId, capacity: u64) -> Self {
        Self {
            id,
            region,
            capacity,
            utilization: 0,
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn utilization(&self) -> u64 {
        self.utilization
    }

    pub fn utilization_left(&self) -> u64 {
        self.capacity - self.utilization
    }

    /// Add `load` request units.
    ///
    /// # Panics
    ///
    /// If the server would exceed its capacity.
    pub fn push(&mut self, load: u64) {
        assert!(
            load <= self.utilization_left(),
            "server {} overloaded: utilization {} + load {} > capacity {}",
            self.id,
            self.utilization,
            load,
            self.capacity
        );
        self.utilization += load;
    }

    pub fn reset_utilization(&mut self) {
        self.utilization = 0;
    }
}
