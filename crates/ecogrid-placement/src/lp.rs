//! Integer programs for provisioning and routing.
//!
//! Both programs share the routing variables `x[i][j]` (load from origin `i`
//! served in region `j`) and their constraints:
//!
//! - every origin's demand is routed in full: `Σ_j x[i][j] = demand[i]`
//! - no destination exceeds its capacity
//! - in carbon mode with a finite bound, `x[i][j]·(latency[i][j] − bound) ≤ 0`
//!
//! Provisioning adds integer server counts `s[j]` bounded by `max_servers`
//! and makes destination capacity `s[j]·capacity`. Routing takes capacity as
//! given.
//!
//! The solver is `good_lp` over its pure-Rust `microlp` backend.

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    microlp, variable,
};
use tracing::debug;

use ecogrid_model::Objective;

use crate::error::{InfeasibilitySnapshot, OptimizerError, OptimizerResult, Phase};

/// The static part of one optimization: demand, geography, and the
/// objective.
#[derive(Debug, Clone, Copy)]
pub struct LpProblem<'a> {
    pub demand: &'a [u64],
    pub latency: &'a [Vec<f64>],
    pub carbon_intensity: &'a [f64],
    /// `f64::INFINITY` disables the latency constraint.
    pub max_latency: f64,
    pub objective: Objective,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// `routing[origin][dest]`.
    pub routing: Vec<Vec<u64>>,
    /// Server counts per region; only set by provisioning.
    pub servers: Option<Vec<u64>>,
    pub objective_value: f64,
}

impl<'a> LpProblem<'a> {
    pub fn region_count(&self) -> usize {
        self.demand.len()
    }

    /// Choose server counts and a tentative routing for the hour.
    ///
    /// Each region keeps at most the servers its routed load needs, so
    /// regions that serve nothing get zero.
    pub fn provision(&self, server_capacity: u64, max_servers: u64) -> OptimizerResult<LpSolution> {
        self.check_shape()?;
        let n = self.region_count();

        let mut vars = ProblemVariables::new();
        let x = Self::routing_variables(&mut vars, n);
        let s: Vec<Variable> = (0..n)
            .map(|_| vars.add(variable().integer().min(0)))
            .collect();

        let mut model = vars.minimise(self.objective_expression(&x)).using(microlp);

        let fleet_size: Expression = s.iter().copied().sum();
        let max = max_servers as f64;
        model.add_constraint(constraint!(fleet_size <= max));

        let cap = server_capacity as f64;
        for j in 0..n {
            let incoming: Expression = (0..n).map(|i| x[i][j]).sum();
            let offered = cap * s[j];
            model.add_constraint(constraint!(incoming <= offered));
        }
        self.add_shared_constraints(&mut model, &x);

        let solution = model.solve().map_err(|e| {
            self.solve_error(
                e,
                Phase::Provision,
                Vec::new(),
                max_servers.saturating_mul(server_capacity),
            )
        })?;

        let routing = Self::read_routing(&solution, &x);
        let mut servers: Vec<u64> = s.iter().map(|v| round(solution.value(*v))).collect();

        // Server counts carry no cost, so the solver may over-provision.
        // Keep only what the routed load needs; idle regions drop to zero.
        for (j, count) in servers.iter_mut().enumerate() {
            let incoming: u64 = routing.iter().map(|row| row[j]).sum();
            *count = (*count).min(incoming.div_ceil(server_capacity.max(1)));
        }

        let objective_value = self.evaluate(&routing);
        debug!(servers = ?servers, objective = objective_value, "provision solved");
        Ok(LpSolution {
            routing,
            servers: Some(servers),
            objective_value,
        })
    }

    /// Route the tick's demand onto fixed destination capacity.
    pub fn route(&self, capacity: &[u64]) -> OptimizerResult<LpSolution> {
        self.check_shape()?;
        let n = self.region_count();
        if capacity.len() != n {
            return Err(OptimizerError::ShapeMismatch {
                expected: n,
                actual: capacity.len(),
            });
        }

        let mut vars = ProblemVariables::new();
        let x = Self::routing_variables(&mut vars, n);
        let mut model = vars.minimise(self.objective_expression(&x)).using(microlp);

        for (j, &c) in capacity.iter().enumerate() {
            let incoming: Expression = (0..n).map(|i| x[i][j]).sum();
            let offered = c as f64;
            model.add_constraint(constraint!(incoming <= offered));
        }
        self.add_shared_constraints(&mut model, &x);

        let solution = model.solve().map_err(|e| {
            self.solve_error(e, Phase::Route, capacity.to_vec(), capacity.iter().sum())
        })?;

        let routing = Self::read_routing(&solution, &x);
        let objective_value = self.evaluate(&routing);
        debug!(routing = ?routing, objective = objective_value, "route solved");
        Ok(LpSolution {
            routing,
            servers: None,
            objective_value,
        })
    }

    /// Objective value of an arbitrary routing under this problem's cost.
    pub fn evaluate(&self, routing: &[Vec<u64>]) -> f64 {
        routing
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
            .map(|(i, j, v)| v as f64 * self.cost(i, j))
            .sum()
    }

    fn cost(&self, origin: usize, dest: usize) -> f64 {
        match self.objective {
            Objective::Carbon => self.carbon_intensity[dest],
            Objective::Latency => self.latency[origin][dest],
        }
    }

    fn latency_bound_applies(&self) -> bool {
        self.objective == Objective::Carbon && self.max_latency.is_finite()
    }

    fn routing_variables(vars: &mut ProblemVariables, n: usize) -> Vec<Vec<Variable>> {
        (0..n)
            .map(|_| {
                (0..n)
                    .map(|_| vars.add(variable().integer().min(0)))
                    .collect()
            })
            .collect()
    }

    fn objective_expression(&self, x: &[Vec<Variable>]) -> Expression {
        let n = x.len();
        let mut objective = Expression::with_capacity(n * n);
        for (i, row) in x.iter().enumerate() {
            for (j, var) in row.iter().enumerate() {
                objective.add_mul(self.cost(i, j), *var);
            }
        }
        objective
    }

    fn add_shared_constraints<M: SolverModel>(&self, model: &mut M, x: &[Vec<Variable>]) {
        for (i, row) in x.iter().enumerate() {
            let routed: Expression = row.iter().copied().sum();
            let demand = self.demand[i] as f64;
            model.add_constraint(constraint!(routed == demand));
        }

        if !self.latency_bound_applies() {
            return;
        }
        for (i, row) in x.iter().enumerate() {
            for (j, var) in row.iter().enumerate() {
                let excess = self.latency[i][j] - self.max_latency;
                // Non-positive coefficients are satisfied by every x >= 0.
                if excess > 0.0 {
                    let weighted = excess * *var;
                    model.add_constraint(constraint!(weighted <= 0.0));
                }
            }
        }
    }

    fn read_routing(solution: &impl Solution, x: &[Vec<Variable>]) -> Vec<Vec<u64>> {
        x.iter()
            .map(|row| row.iter().map(|v| round(solution.value(*v))).collect())
            .collect()
    }

    fn check_shape(&self) -> OptimizerResult<()> {
        let n = self.region_count();
        let bad = [
            self.latency.len(),
            self.carbon_intensity.len(),
        ]
        .into_iter()
        .chain(self.latency.iter().map(Vec::len))
        .find(|&len| len != n);

        match bad {
            Some(actual) => Err(OptimizerError::ShapeMismatch { expected: n, actual }),
            None => Ok(()),
        }
    }

    fn solve_error(
        &self,
        err: ResolutionError,
        phase: Phase,
        capacity: Vec<u64>,
        total_capacity: u64,
    ) -> OptimizerError {
        match err {
            ResolutionError::Infeasible => {
                OptimizerError::Infeasible(Box::new(InfeasibilitySnapshot {
                    phase,
                    demand: self.demand.to_vec(),
                    capacity,
                    total_demand: self.demand.iter().sum(),
                    total_capacity,
                    max_latency: self.max_latency,
                    latency: self.latency.to_vec(),
                    carbon_intensity: self.carbon_intensity.to_vec(),
                }))
            }
            other => OptimizerError::Solver {
                phase,
                message: other.to_string(),
            },
        }
    }
}

fn round(value: f64) -> u64 {
    value.round().max(0.0) as u64
}
