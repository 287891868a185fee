//! Simulation — owns the fleet and sequences every decision.

use tracing::{debug, info};

use ecogrid_fleet::ServerFleet;
use ecogrid_metrics::{IntervalInputs, IntervalRecord, MetricsSink, RunSummary};
use ecogrid_model::{RegionModel, Scenario, SimConfig, StrategyKind, build_batches};
use ecogrid_placement::{Optimizer, PlacementResult, RoutingResult};

use crate::error::SimResult;

pub struct Simulation {
    config: SimConfig,
    model: RegionModel,
    optimizer: Optimizer,
    fleet: ServerFleet,
}

impl Simulation {
    /// Build a simulation over a model whose hour 0 is the first simulated
    /// hour.
    pub fn new(config: SimConfig, model: RegionModel) -> SimResult<Self> {
        config.validate()?;
        model.ensure_horizon(config.hours())?;
        if config.strategy == StrategyKind::Replay {
            for region in 0..model.region_count() {
                model.demand_breakdown(region, 0)?;
            }
        }

        let optimizer = Optimizer::from_config(&config);
        let fleet = ServerFleet::new(model.region_count(), config.server_capacity);
        Ok(Self {
            config,
            model,
            optimizer,
            fleet,
        })
    }

    /// Build from a scenario, windowed at the configured start offset.
    pub fn from_scenario(config: SimConfig, scenario: Scenario) -> SimResult<Self> {
        let model = scenario.into_windowed_model(&config)?;
        Self::new(config, model)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn model(&self) -> &RegionModel {
        &self.model
    }

    pub fn fleet(&self) -> &ServerFleet {
        &self.fleet
    }

    pub fn region_names(&self) -> &[String] {
        self.model.catalog().names()
    }

    /// Run every hour, sending one record per tick to `sink`.
    pub fn run(&mut self, sink: &mut dyn MetricsSink) -> SimResult<RunSummary> {
        let mut summary = RunSummary::new(self.model.region_count());
        info!(
            regions = self.model.region_count(),
            hours = self.config.hours(),
            ticks = self.config.sub_intervals_per_hour,
            objective = %self.config.objective,
            strategy = self.optimizer.strategy().name(),
            "simulation started"
        );

        for t in 0..self.config.hours() {
            self.step_hour(t, sink, &mut summary)?;
        }
        sink.flush()?;

        info!(
            intervals = summary.intervals,
            requests = summary.total_requests,
            dropped = summary.total_dropped,
            emissions = summary.total_emissions,
            churn = summary.total_churn,
            "simulation finished"
        );
        Ok(summary)
    }

    /// Provision hour `t`, then route each of its ticks.
    pub fn step_hour(
        &mut self,
        t: usize,
        sink: &mut dyn MetricsSink,
        summary: &mut RunSummary,
    ) -> SimResult<PlacementResult> {
        let placement = self.provision(t)?;
        let migration = self.fleet.apply_placement(&placement.servers)?;
        summary.record_migration(migration.churn());

        info!(
            hour = t,
            servers = placement.total_servers(),
            added = migration.added.iter().sum::<u64>(),
            removed = migration.removed.iter().sum::<u64>(),
            "hour provisioned"
        );

        for k in 0..self.config.sub_intervals_per_hour as usize {
            let record = self.step_tick(t, k)?;
            sink.record(&record)?;
            summary.observe(&record);
        }

        self.log_hour_report(t);
        Ok(placement)
    }

    /// Route one tick against the current fleet and build its record.
    ///
    /// Utilization is reset before returning, so the record is the only
    /// trace of the tick's load.
    pub fn step_tick(&mut self, t: usize, k: usize) -> SimResult<IntervalRecord> {
        let batches = build_batches(
            &self.model,
            t,
            Some(self.config.sub_intervals_per_hour),
            self.config.constant_request_rate,
        );

        let routing = if self.fleet.is_empty() {
            debug!(hour = t, tick = k, "fleet is empty, dropping every batch");
            RoutingResult::drop_all(&batches, self.model.region_count())
        } else {
            self.optimizer.route(&batches, &self.fleet, &self.model, t)?
        };

        let load = self.fleet.apply_load(&routing.assignments)?;

        let carbon = self.model.carbon_intensities(t);
        let utilization = self.fleet.utilization_per_region();
        let counts = self.fleet.counts_per_region();
        let record = IntervalRecord::from_inputs(IntervalInputs {
            timestep: t,
            sub_interval: k,
            routing: &routing.assignments,
            routing_dropped: &routing.dropped,
            overflow: &load.dropped,
            latency: self.model.catalog().latency_matrix(),
            carbon_intensity: &carbon,
            utilization: &utilization,
            server_counts: &counts,
        });

        debug!(
            hour = t,
            tick = k,
            requests = record.total_requests,
            dropped = record.total_dropped,
            mean_latency = record.mean_latency,
            "tick recorded"
        );

        self.fleet.reset_utilization();
        Ok(record)
    }

    fn provision(&self, t: usize) -> SimResult<PlacementResult> {
        let forecast = build_batches(&self.model, t, None, self.config.constant_request_rate);
        Ok(self.optimizer.provision(&forecast, &self.fleet, &self.model, t)?)
    }

    fn log_hour_report(&self, t: usize) {
        let counts = self.fleet.counts_per_region();
        for (region, name) in self.region_names().iter().enumerate() {
            debug!(
                hour = t,
                region = %name,
                demand = self.model.demand(region, t),
                servers = counts[region],
                "hour report"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecogrid_metrics::MemorySink;
    use ecogrid_model::{Objective, RegionCatalog, RegionSeries};

    fn two_regions(demand_a: f64, hours: usize) -> RegionModel {
        let catalog = RegionCatalog::new(
            vec!["a".into(), "b".into()],
            vec![vec![0.0, 5.0], vec![5.0, 0.0]],
        )
        .unwrap();
        RegionModel::new(
            catalog,
            vec![
                RegionSeries::new(vec![100.0; hours], vec![demand_a; hours]),
                RegionSeries::new(vec![100.0; hours], vec![0.0; hours]),
            ],
        )
        .unwrap()
    }

    fn config(timesteps: usize) -> SimConfig {
        SimConfig {
            timesteps,
            sub_intervals_per_hour: 1,
            max_servers: 2,
            server_capacity: 10,
            objective: Objective::Latency,
            ..Default::default()
        }
    }

    #[test]
    fn new_rejects_short_model() {
        let err = Simulation::new(config(3), two_regions(12.0, 2)).err().unwrap();
        assert!(err.to_string().contains("data alignment"));
    }

    #[test]
    fn replay_without_breakdown_is_rejected() {
        let cfg = SimConfig {
            strategy: StrategyKind::Replay,
            ..config(0)
        };
        let err = Simulation::new(cfg, two_regions(12.0, 1)).err().unwrap();
        assert!(matches!(
            err,
            crate::SimError::Model(ecogrid_model::ModelError::MissingBreakdown(_))
        ));
    }

    #[test]
    fn one_record_per_tick() {
        let cfg = SimConfig {
            sub_intervals_per_hour: 3,
            max_servers: 10,
            ..config(2)
        };
        let mut sim = Simulation::new(cfg, two_regions(12.0, 3)).unwrap();
        let mut sink = MemorySink::new();

        let summary = sim.run(&mut sink).unwrap();

        assert_eq!(sink.records().len(), 9);
        assert_eq!(summary.intervals, 9);
        let order: Vec<_> = sink
            .records()
            .iter()
            .map(|r| (r.timestep, r.sub_interval))
            .collect();
        assert_eq!(order[0], (0, 0));
        assert_eq!(order[4], (1, 1));
        assert_eq!(order[8], (2, 2));
    }

    #[test]
    fn step_hour_places_and_routes() {
        let mut sim = Simulation::new(config(0), two_regions(12.0, 1)).unwrap();
        let mut sink = MemorySink::new();
        let mut summary = RunSummary::new(2);

        let placement = sim.step_hour(0, &mut sink, &mut summary).unwrap();

        assert_eq!(placement.servers, vec![2, 0]);
        assert_eq!(sim.fleet().counts_per_region(), vec![2, 0]);
        let record = &sink.records()[0];
        assert_eq!(record.utilization, vec![12, 0]);
        assert_eq!(record.total_dropped, 0);
        // Utilization does not outlive the tick.
        assert_eq!(sim.fleet().utilization_per_region(), vec![0, 0]);
        assert_eq!(summary.total_churn, 2);
    }

    #[test]
    fn empty_fleet_drops_every_batch() {
        let catalog = RegionCatalog::new(
            vec!["a".into(), "b".into()],
            vec![vec![0.0, 5.0], vec![5.0, 0.0]],
        )
        .unwrap();
        // Nothing recorded, so replay provisions no servers.
        let model = RegionModel::new(
            catalog,
            vec![
                RegionSeries::new(vec![1.0], vec![12.0]).with_breakdown(vec![vec![0.0, 0.0]]),
                RegionSeries::new(vec![1.0], vec![4.0]).with_breakdown(vec![vec![0.0, 0.0]]),
            ],
        )
        .unwrap();
        let cfg = SimConfig {
            strategy: StrategyKind::Replay,
            ..config(0)
        };
        let mut sim = Simulation::new(cfg, model).unwrap();
        let mut sink = MemorySink::new();

        let summary = sim.run(&mut sink).unwrap();

        let record = &sink.records()[0];
        assert_eq!(record.dropped, vec![12, 4]);
        assert_eq!(record.total_requests, 0);
        assert_eq!(summary.total_dropped, 16);
    }
}
