//! Simulation error types.

use thiserror::Error;

use ecogrid_fleet::FleetError;
use ecogrid_metrics::MetricsError;
use ecogrid_model::ModelError;
use ecogrid_placement::OptimizerError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("fleet error: {0}")]
    Fleet(#[from] FleetError),

    #[error("optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

pub type SimResult<T> = Result<T, SimError>;
