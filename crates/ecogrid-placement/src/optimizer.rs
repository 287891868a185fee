//! Optimizer — the provisioning and routing entry points the simulation
//! calls.
//!
//! Provisioning always solves the placement program, except under replay
//! where recorded traffic sizes the fleet directly. Routing dispatches on the
//! configured [`RoutingStrategy`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use ecogrid_fleet::ServerFleet;
use ecogrid_model::{CapacityShare, Objective, RegionModel, RequestBatch, SimConfig, request};

use crate::error::{OptimizerError, OptimizerResult};
use crate::greedy::route_greedy;
use crate::lp::LpProblem;
use crate::replay::{hourly_flows, replay_routing, replay_servers};
use crate::strategy::RoutingStrategy;

/// Numeric knobs shared by every decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub objective: Objective,
    pub max_servers: u64,
    /// `f64::INFINITY` when unbounded.
    pub max_latency: f64,
    pub server_capacity: u64,
    pub ticks_per_hour: u32,
    pub capacity_share: CapacityShare,
}

impl OptimizerSettings {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            objective: config.objective,
            max_servers: config.max_servers,
            max_latency: config.latency_bound(),
            server_capacity: config.server_capacity,
            ticks_per_hour: config.sub_intervals_per_hour,
            capacity_share: config.capacity_share,
        }
    }

    /// What one server offers a single routing call.
    pub fn server_offer(&self) -> u64 {
        self.capacity_share
            .destination_capacity(1, self.server_capacity, self.ticks_per_hour)
    }
}

/// Server counts for the hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub servers: Vec<u64>,
    /// The routing the placement was sized against.
    pub tentative: Vec<Vec<u64>>,
    pub objective_value: f64,
}

impl PlacementResult {
    pub fn total_servers(&self) -> u64 {
        self.servers.iter().sum()
    }
}

/// Load assignment for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// `assignments[origin][dest]`.
    pub assignments: Vec<Vec<u64>>,
    /// Unplaced load per origin.
    pub dropped: Vec<u64>,
    pub objective_value: f64,
}

impl RoutingResult {
    /// Every batch dropped, nothing routed.
    pub fn drop_all(batches: &[RequestBatch], regions: usize) -> Self {
        let mut dropped = vec![0; regions];
        for b in batches {
            dropped[b.origin] += b.load;
        }
        Self {
            assignments: vec![vec![0; regions]; regions],
            dropped,
            objective_value: 0.0,
        }
    }

    /// Routed load per origin.
    pub fn requests_from(&self) -> Vec<u64> {
        self.assignments.iter().map(|row| row.iter().sum()).collect()
    }

    /// Routed load per destination.
    pub fn requests_to(&self) -> Vec<u64> {
        let n = self.assignments.len();
        (0..n)
            .map(|j| self.assignments.iter().map(|row| row[j]).sum())
            .collect()
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct Optimizer {
    settings: OptimizerSettings,
    strategy: RoutingStrategy,
}

impl Optimizer {
    pub fn new(settings: OptimizerSettings, strategy: RoutingStrategy) -> Self {
        Self { settings, strategy }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            OptimizerSettings::from_config(config),
            RoutingStrategy::from_config(config),
        )
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    pub fn strategy(&self) -> &RoutingStrategy {
        &self.strategy
    }

    /// Decide the hour's server placement from its demand forecast.
    pub fn provision(
        &self,
        forecast: &[RequestBatch],
        fleet: &ServerFleet,
        model: &RegionModel,
        t: usize,
    ) -> OptimizerResult<PlacementResult> {
        let demand = self.demand_vector(forecast, model.region_count())?;
        let carbon = model.carbon_intensities(t);
        let problem = self.problem(&demand, model, &carbon);

        let result = match self.strategy {
            RoutingStrategy::Replay => {
                let flows = hourly_flows(model, t)?;
                PlacementResult {
                    servers: replay_servers(&flows, self.settings.server_capacity),
                    objective_value: problem.evaluate(&flows),
                    tentative: flows,
                }
            }
            _ => {
                let solution = problem
                    .provision(self.settings.server_capacity, self.settings.max_servers)?;
                PlacementResult {
                    servers: solution.servers.unwrap_or_else(|| vec![0; demand.len()]),
                    tentative: solution.routing,
                    objective_value: solution.objective_value,
                }
            }
        };

        debug!(
            hour = t,
            current = ?fleet.counts_per_region(),
            target = ?result.servers,
            objective = result.objective_value,
            "placement decided"
        );
        Ok(result)
    }

    /// Assign one tick's batches onto the current fleet.
    pub fn route(
        &self,
        batches: &[RequestBatch],
        fleet: &ServerFleet,
        model: &RegionModel,
        t: usize,
    ) -> OptimizerResult<RoutingResult> {
        let n = model.region_count();
        let demand = self.demand_vector(batches, n)?;
        let carbon = model.carbon_intensities(t);
        let problem = self.problem(&demand, model, &carbon);

        let result = if let Some(policy) = self.strategy.greedy_policy() {
            let greedy = route_greedy(
                &policy,
                batches,
                fleet.servers(),
                model.catalog().latency_matrix(),
                &carbon,
                self.settings.server_offer(),
            );
            RoutingResult {
                objective_value: problem.evaluate(&greedy.routing),
                assignments: greedy.routing,
                dropped: greedy.dropped,
            }
        } else if self.strategy == RoutingStrategy::Replay {
            let flows = hourly_flows(model, t)?;
            let assignments = replay_routing(&flows, self.settings.ticks_per_hour);
            RoutingResult {
                objective_value: problem.evaluate(&assignments),
                assignments,
                dropped: vec![0; n],
            }
        } else {
            let capacity: Vec<u64> = fleet
                .counts_per_region()
                .into_iter()
                .map(|count| {
                    self.settings.capacity_share.destination_capacity(
                        count,
                        self.settings.server_capacity,
                        self.settings.ticks_per_hour,
                    )
                })
                .collect();
            let solution = problem.route(&capacity)?;
            RoutingResult {
                assignments: solution.routing,
                dropped: vec![0; n],
                objective_value: solution.objective_value,
            }
        };

        debug!(
            hour = t,
            strategy = self.strategy.name(),
            dropped = result.total_dropped(),
            objective = result.objective_value,
            "tick routed"
        );
        Ok(result)
    }

    fn problem<'a>(
        &self,
        demand: &'a [u64],
        model: &'a RegionModel,
        carbon: &'a [f64],
    ) -> LpProblem<'a> {
        LpProblem {
            demand,
            latency: model.catalog().latency_matrix(),
            carbon_intensity: carbon,
            max_latency: self.settings.max_latency,
            objective: self.settings.objective,
        }
    }

    /// Loads indexed by origin region.
    fn demand_vector(&self, batches: &[RequestBatch], regions: usize) -> OptimizerResult<Vec<u64>> {
        if batches.len() != regions {
            return Err(OptimizerError::ShapeMismatch {
                expected: regions,
                actual: batches.len(),
            });
        }
        if batches.iter().enumerate().all(|(i, b)| b.origin == i) {
            return Ok(request::loads(batches));
        }
        let mut demand = vec![0; regions];
        for b in batches {
            if b.origin >= regions {
                return Err(OptimizerError::ShapeMismatch {
                    expected: regions,
                    actual: b.origin + 1,
                });
            }
            demand[b.origin] += b.load;
        }
        Ok(demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecogrid_model::{RegionCatalog, RegionSeries, StrategyKind, build_batches};

    fn model() -> RegionModel {
        let catalog = RegionCatalog::new(
            vec!["a".into(), "b".into()],
            vec![vec![0.0, 5.0], vec![5.0, 0.0]],
        )
        .unwrap();
        RegionModel::new(
            catalog,
            vec![
                RegionSeries::new(vec![300.0], vec![12.0])
                    .with_breakdown(vec![vec![8.0, 4.0]]),
                RegionSeries::new(vec![100.0], vec![0.0])
                    .with_breakdown(vec![vec![0.0, 0.0]]),
            ],
        )
        .unwrap()
    }

    fn config(strategy: StrategyKind, objective: Objective) -> SimConfig {
        SimConfig {
            timesteps: 0,
            sub_intervals_per_hour: 1,
            max_servers: 4,
            server_capacity: 10,
            objective,
            strategy,
            ..Default::default()
        }
    }

    fn fleet(counts: &[u64]) -> ServerFleet {
        let mut fleet = ServerFleet::new(counts.len(), 10);
        fleet.apply_placement(counts).unwrap();
        fleet
    }

    #[test]
    fn lp_route_latency_objective() {
        let model = model();
        let optimizer = Optimizer::from_config(&config(StrategyKind::Lp, Objective::Latency));
        let batches = build_batches(&model, 0, Some(1), None);

        let result = optimizer.route(&batches, &fleet(&[1, 1]), &model, 0).unwrap();

        assert_eq!(result.assignments, vec![vec![10, 2], vec![0, 0]]);
        assert_eq!(result.requests_from(), vec![12, 0]);
        assert_eq!(result.requests_to(), vec![10, 2]);
        assert_eq!(result.total_dropped(), 0);
    }

    #[test]
    fn provision_carbon_objective_prefers_clean_region() {
        let model = model();
        let optimizer = Optimizer::from_config(&config(StrategyKind::Lp, Objective::Carbon));
        let forecast = build_batches(&model, 0, None, None);

        let placement = optimizer
            .provision(&forecast, &ServerFleet::new(2, 10), &model, 0)
            .unwrap();

        assert_eq!(placement.servers, vec![0, 2]);
        assert_eq!(placement.tentative, vec![vec![0, 12], vec![0, 0]]);
        assert_eq!(placement.total_servers(), 2);
    }

    #[test]
    fn greedy_route_uses_fleet_servers() {
        let model = model();
        let optimizer =
            Optimizer::from_config(&config(StrategyKind::CarbonGreedy, Objective::Carbon));
        let batches = build_batches(&model, 0, Some(1), None);

        let result = optimizer.route(&batches, &fleet(&[1, 1]), &model, 0).unwrap();

        // Region b is cleaner, so it fills first.
        assert_eq!(result.assignments, vec![vec![2, 10], vec![0, 0]]);
        assert_eq!(result.objective_value, 2.0 * 300.0 + 10.0 * 100.0);
    }

    #[test]
    fn replay_sizes_fleet_from_recorded_flows() {
        let model = model();
        let optimizer = Optimizer::from_config(&config(StrategyKind::Replay, Objective::Carbon));
        let forecast = build_batches(&model, 0, None, None);

        let placement = optimizer
            .provision(&forecast, &ServerFleet::new(2, 10), &model, 0)
            .unwrap();
        assert_eq!(placement.servers, vec![1, 1]);

        let route = optimizer.route(&forecast, &fleet(&[1, 1]), &model, 0).unwrap();
        assert_eq!(route.assignments, vec![vec![8, 4], vec![0, 0]]);
    }

    #[test]
    fn per_tick_share_divides_route_capacity() {
        let model = model();
        let mut cfg = config(StrategyKind::Lp, Objective::Latency);
        cfg.sub_intervals_per_hour = 2;
        cfg.capacity_share = CapacityShare::PerTick;
        let optimizer = Optimizer::from_config(&cfg);
        // 12 / 2 ticks = 6 per tick; each server offers 5.
        let batches = build_batches(&model, 0, Some(2), None);

        let result = optimizer.route(&batches, &fleet(&[1, 1]), &model, 0).unwrap();

        assert_eq!(result.assignments, vec![vec![5, 1], vec![0, 0]]);
    }

    #[test]
    fn drop_all_accounts_every_batch() {
        let batches = vec![RequestBatch::new(0, 7), RequestBatch::new(1, 3)];
        let result = RoutingResult::drop_all(&batches, 2);

        assert_eq!(result.dropped, vec![7, 3]);
        assert_eq!(result.requests_to(), vec![0, 0]);
    }

    #[test]
    fn batch_count_must_match_regions() {
        let model = model();
        let optimizer = Optimizer::from_config(&config(StrategyKind::Lp, Objective::Latency));
        let err = optimizer
            .route(&[RequestBatch::new(0, 1)], &fleet(&[1, 1]), &model, 0)
            .unwrap_err();
        assert!(matches!(err, OptimizerError::ShapeMismatch { .. }));
    }
}
