//! Optimizer error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecogrid_model::ModelError;

/// Which optimization step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Provision,
    Route,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Provision => f.write_str("provision"),
            Phase::Route => f.write_str("route"),
        }
    }
}

/// Inputs of a solve that came back infeasible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfeasibilitySnapshot {
    pub phase: Phase,
    /// Load per origin region.
    pub demand: Vec<u64>,
    /// Capacity per destination region. Empty for provisioning, where
    /// capacity is a decision variable.
    pub capacity: Vec<u64>,
    /// Total demand.
    pub total_demand: u64,
    /// Most capacity the solver could have offered in total.
    pub total_capacity: u64,
    pub max_latency: f64,
    pub latency: Vec<Vec<f64>>,
    pub carbon_intensity: Vec<f64>,
}

impl fmt::Display for InfeasibilitySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} infeasible: total demand {} vs total capacity {} (max latency {})",
            self.phase, self.total_demand, self.total_capacity, self.max_latency
        )?;
        writeln!(f, "  demand:   {:?}", self.demand)?;
        if !self.capacity.is_empty() {
            writeln!(f, "  capacity: {:?}", self.capacity)?;
        }
        writeln!(f, "  carbon:   {:?}", self.carbon_intensity)?;
        write!(f, "  latency:  {:?}", self.latency)
    }
}

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("infeasible optimization: {0}")]
    Infeasible(Box<InfeasibilitySnapshot>),

    #[error("{phase} solver failed: {message}")]
    Solver { phase: Phase, message: String },

    #[error("shape mismatch: expected {expected} regions, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

pub type OptimizerResult<T> = Result<T, OptimizerError>;
