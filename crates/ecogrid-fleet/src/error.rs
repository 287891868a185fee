//! Fleet error types.

use thiserror::Error;

pub type FleetResult<T> = Result<T, FleetError>;

#[derive(Debug, Error)]
pub enum FleetError {
    /// Post-migration count differs from the requested placement. Never
    /// expected in correct operation.
    #[error(
        "fleet consistency fault in region {region}: expected {expected} servers, found {actual}"
    )]
    ConsistencyFault {
        region: usize,
        expected: u64,
        actual: u64,
    },

    #[error("shape mismatch: expected {expected} regions, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}
