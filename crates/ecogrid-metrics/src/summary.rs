//! Run summary — totals folded over the interval log.

use serde::{Deserialize, Serialize};

use crate::record::IntervalRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub intervals: usize,
    pub total_demand: u64,
    pub total_requests: u64,
    pub total_dropped: u64,
    pub total_emissions: f64,
    pub peak_servers: u64,
    pub total_churn: u64,
    pub requests_from: Vec<u64>,
    pub requests_to: Vec<u64>,
    pub emissions: Vec<f64>,
    pub dropped: Vec<u64>,
    /// Request-weighted mean latency, kept current by `observe`.
    mean_latency: f64,
}

impl RunSummary {
    pub fn new(regions: usize) -> Self {
        Self {
            requests_from: vec![0; regions],
            requests_to: vec![0; regions],
            emissions: vec![0.0; regions],
            dropped: vec![0; regions],
            ..Default::default()
        }
    }

    pub fn observe(&mut self, record: &IntervalRecord) {
        self.intervals += 1;
        self.total_demand += record.total_demand;
        let before = self.total_requests;
        self.total_requests += record.total_requests;
        if self.total_requests > 0 {
            self.mean_latency = (self.mean_latency * before as f64
                + record.mean_latency * record.total_requests as f64)
                / self.total_requests as f64;
        }
        self.total_dropped += record.total_dropped;
        self.total_emissions += record.total_emissions;
        self.peak_servers = self.peak_servers.max(record.total_servers);

        add_into(&mut self.requests_from, &record.requests_from);
        add_into(&mut self.requests_to, &record.requests_to);
        add_into(&mut self.dropped, &record.dropped);
        if self.emissions.len() < record.carbon_emissions.len() {
            self.emissions.resize(record.carbon_emissions.len(), 0.0);
        }
        for (acc, v) in self.emissions.iter_mut().zip(&record.carbon_emissions) {
            *acc += v;
        }
    }

    pub fn record_migration(&mut self, churn: u64) {
        self.total_churn += churn;
    }

    /// Request-weighted mean latency over the whole run.
    pub fn mean_latency(&self) -> f64 {
        self.mean_latency
    }

    /// Fraction of offered load that was dropped.
    pub fn drop_rate(&self) -> f64 {
        if self.total_demand == 0 {
            0.0
        } else {
            self.total_dropped as f64 / self.total_demand as f64
        }
    }
}

fn add_into(acc: &mut Vec<u64>, values: &[u64]) {
    if acc.len() < values.len() {
        acc.resize(values.len(), 0);
    }
    for (a, v) in acc.iter_mut().zip(values) {
        *a += v;
    }
}

/// Render a summary as a plain-text table.
pub fn render_summary(summary: &RunSummary, names: &[String]) -> String {
    let mut out = String::new();

    out.push_str("run summary\n");
    out.push_str(&format!("  intervals      {}\n", summary.intervals));
    out.push_str(&format!("  demand         {}\n", summary.total_demand));
    out.push_str(&format!("  routed         {}\n", summary.total_requests));
    out.push_str(&format!(
        "  dropped        {} ({:.2}%)\n",
        summary.total_dropped,
        summary.drop_rate() * 100.0
    ));
    out.push_str(&format!("  emissions      {:.2}\n", summary.total_emissions));
    out.push_str(&format!("  mean latency   {:.2}\n", summary.mean_latency()));
    out.push_str(&format!("  peak servers   {}\n", summary.peak_servers));
    out.push_str(&format!("  churn          {}\n", summary.total_churn));

    out.push('\n');
    out.push_str(&format!(
        "{:<20} {:>12} {:>12} {:>16} {:>10}\n",
        "region", "from", "to", "emissions", "dropped"
    ));
    for r in 0..summary.requests_from.len() {
        let name = names.get(r).map(String::as_str).unwrap_or("?");
        out.push_str(&format!(
            "{:<20} {:>12} {:>12} {:>16.2} {:>10}\n",
            name,
            summary.requests_from[r],
            summary.requests_to.get(r).copied().unwrap_or(0),
            summary.emissions.get(r).copied().unwrap_or(0.0),
            summary.dropped.get(r).copied().unwrap_or(0),
        ));
    }

    out
}
