//! Region catalog and per-region time series.
//!
//! The catalog fixes the region order used everywhere else: every vector
//! indexed by region (placements, routing rows and columns, metrics) uses
//! the catalog position as its index.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ModelError, ModelResult};

/// Latency substituted for missing (NaN) entries in the source matrix.
pub const LATENCY_PENALTY: f64 = 1e6;

/// Position of a region in its [`RegionCatalog`].
pub type RegionId = usize;

/// Region names plus the pairwise latency matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCatalog {
    names: Vec<String>,
    /// `latency[from][to]`, NaN-free.
    latency: Vec<Vec<f64>>,
}

impl RegionCatalog {
    /// Build a catalog, replacing NaN latencies with [`LATENCY_PENALTY`].
    ///
    /// The matrix must be square and match the number of names. Negative or
    /// infinite latencies are rejected.
    pub fn new(names: Vec<String>, mut latency: Vec<Vec<f64>>) -> ModelResult<Self> {
        let n = names.len();
        if latency.len() != n {
            return Err(ModelError::ShapeMismatch(format!(
                "latency matrix has {} rows for {n} regions",
                latency.len()
            )));
        }

        let mut sanitized = 0usize;
        for (from, row) in latency.iter_mut().enumerate() {
            if row.len() != n {
                return Err(ModelError::ShapeMismatch(format!(
                    "latency row {from} has {} columns for {n} regions",
                    row.len()
                )));
            }
            for (to, value) in row.iter_mut().enumerate() {
                if value.is_nan() {
                    *value = LATENCY_PENALTY;
                    sanitized += 1;
                } else if *value < 0.0 || value.is_infinite() {
                    return Err(ModelError::InvalidLatency {
                        from,
                        to,
                        value: *value,
                    });
                }
            }
        }

        if sanitized > 0 {
            warn!(
                entries = sanitized,
                penalty = LATENCY_PENALTY,
                "NaN values in latency matrix replaced with penalty"
            );
        }

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ModelError::DuplicateRegion(name.clone()));
            }
        }

        Ok(Self { names, latency })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, id: RegionId) -> &str {
        &self.names[id]
    }

    pub fn index_of(&self, name: &str) -> Option<RegionId> {
        self.names.iter().position(|n| n == name)
    }

    /// Round-trip latency from `from` to `to`.
    pub fn latency(&self, from: RegionId, to: RegionId) -> f64 {
        self.latency[from][to]
    }

    pub fn latency_matrix(&self) -> &[Vec<f64>] {
        &self.latency
    }
}

/// Hourly series for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSeries {
    /// Carbon intensity per hour (gCO2/kWh or any consistent unit).
    pub carbon_intensity: Vec<f64>,
    /// Requests originating in this region per hour.
    pub demand: Vec<f64>,
    /// Optional `breakdown[t][dest]`: requests from this region to `dest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_breakdown: Option<Vec<Vec<f64>>>,
}

impl RegionSeries {
    pub fn new(carbon_intensity: Vec<f64>, demand: Vec<f64>) -> Self {
        Self {
            carbon_intensity,
            demand,
            demand_breakdown: None,
        }
    }

    pub fn with_breakdown(mut self, breakdown: Vec<Vec<f64>>) -> Self {
        self.demand_breakdown = Some(breakdown);
        self
    }

    fn len(&self) -> usize {
        let base = self.carbon_intensity.len().min(self.demand.len());
        match &self.demand_breakdown {
            Some(b) => base.min(b.len()),
            None => base,
        }
    }
}

/// Immutable per-region data for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionModel {
    catalog: RegionCatalog,
    series: Vec<RegionSeries>,
    /// Number of hours every series covers.
    horizon: usize,
}

impl RegionModel {
    /// Pair a catalog with one series per region, in catalog order.
    pub fn new(catalog: RegionCatalog, series: Vec<RegionSeries>) -> ModelResult<Self> {
        if series.len() != catalog.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} series for {} regions",
                series.len(),
                catalog.len()
            )));
        }

        for (id, s) in series.iter().enumerate() {
            validate_series(catalog.name(id), s, catalog.len())?;
        }

        let horizon = series.iter().map(RegionSeries::len).min().unwrap_or(0);
        Ok(Self {
            catalog,
            series,
            horizon,
        })
    }

    /// Slice every series to `[start, start + hours)`.
    ///
    /// Fails with [`ModelError::DataAlignment`] when the window runs past the
    /// end of the data.
    pub fn window(&self, start: usize, hours: usize) -> ModelResult<Self> {
        let end = start.saturating_add(hours);
        if end > self.horizon {
            return Err(ModelError::DataAlignment {
                start,
                end,
                available: self.horizon,
            });
        }

        let series = self
            .series
            .iter()
            .map(|s| RegionSeries {
                carbon_intensity: s.carbon_intensity[start..end].to_vec(),
                demand: s.demand[start..end].to_vec(),
                demand_breakdown: s.demand_breakdown.as_ref().map(|b| b[start..end].to_vec()),
            })
            .collect();

        Ok(Self {
            catalog: self.catalog.clone(),
            series,
            horizon: hours,
        })
    }

    /// Check that hours `[0, hours)` are all available.
    pub fn ensure_horizon(&self, hours: usize) -> ModelResult<()> {
        if hours > self.horizon {
            return Err(ModelError::DataAlignment {
                start: 0,
                end: hours,
                available: self.horizon,
            });
        }
        Ok(())
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn region_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn carbon_intensity(&self, region: RegionId, t: usize) -> f64 {
        self.series[region].carbon_intensity[t]
    }

    /// Carbon intensity of every region at hour `t`, in catalog order.
    pub fn carbon_intensities(&self, t: usize) -> Vec<f64> {
        self.series.iter().map(|s| s.carbon_intensity[t]).collect()
    }

    pub fn demand(&self, region: RegionId, t: usize) -> f64 {
        self.series[region].demand[t]
    }

    pub fn has_breakdown(&self) -> bool {
        self.series.iter().all(|s| s.demand_breakdown.is_some())
    }

    /// Requests from `region` to each destination at hour `t`.
    pub fn demand_breakdown(&self, region: RegionId, t: usize) -> ModelResult<&[f64]> {
        self.series[region]
            .demand_breakdown
            .as_ref()
            .map(|b| b[t].as_slice())
            .ok_or_else(|| ModelError::MissingBreakdown(self.catalog.name(region).to_string()))
    }
}

fn validate_series(name: &str, s: &RegionSeries, regions: usize) -> ModelResult<()> {
    let invalid = |reason: String| ModelError::InvalidSeries {
        region: name.to_string(),
        reason,
    };

    if let Some((t, v)) = s
        .carbon_intensity
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(invalid(format!("carbon intensity {v} at hour {t}")));
    }
    if let Some((t, v)) = s
        .demand
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(invalid(format!("demand {v} at hour {t}")));
    }
    if let Some(breakdown) = &s.demand_breakdown {
        for (t, row) in breakdown.iter().enumerate() {
            if row.len() != regions {
                return Err(invalid(format!(
                    "breakdown at hour {t} has {} destinations for {regions} regions",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(invalid(format!("negative or non-finite breakdown at hour {t}")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn two_region_model(hours: usize) -> RegionModel {
        let catalog =
            RegionCatalog::new(names(&["east", "west"]), vec![vec![0.0, 5.0], vec![5.0, 0.0]])
                .unwrap();
        let series = vec![
            RegionSeries::new((0..hours).map(|h| 100.0 + h as f64).collect(), vec![12.0; hours]),
            RegionSeries::new((0..hours).map(|h| 300.0 - h as f64).collect(), vec![0.0; hours]),
        ];
        RegionModel::new(catalog, series).unwrap()
    }

    #[test]
    fn nan_latency_becomes_penalty() {
        let catalog = RegionCatalog::new(
            names(&["a", "b"]),
            vec![vec![0.0, f64::NAN], vec![7.0, 0.0]],
        )
        .unwrap();

        assert_eq!(catalog.latency(0, 1), LATENCY_PENALTY);
        assert_eq!(catalog.latency(1, 0), 7.0);
    }

    #[test]
    fn rejects_non_square_latency() {
        let err = RegionCatalog::new(names(&["a", "b"]), vec![vec![0.0, 1.0], vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch(_)));
    }

    #[test]
    fn rejects_negative_latency() {
        let err = RegionCatalog::new(names(&["a"]), vec![vec![-1.0]]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidLatency { from: 0, to: 0, .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = RegionCatalog::new(names(&["a", "a"]), vec![vec![0.0; 2]; 2]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateRegion(ref name) if name == "a"));
        assert_eq!(err.to_string(), "duplicate region name: a");
    }

    #[test]
    fn index_of_finds_region() {
        let model = two_region_model(3);
        assert_eq!(model.catalog().index_of("west"), Some(1));
        assert_eq!(model.catalog().index_of("north"), None);
    }

    #[test]
    fn horizon_is_shortest_series() {
        let catalog = RegionCatalog::new(names(&["a", "b"]), vec![vec![0.0; 2]; 2]).unwrap();
        let model = RegionModel::new(
            catalog,
            vec![
                RegionSeries::new(vec![1.0; 5], vec![1.0; 4]),
                RegionSeries::new(vec![1.0; 6], vec![1.0; 6]),
            ],
        )
        .unwrap();
        assert_eq!(model.horizon(), 4);
    }

    #[test]
    fn window_slices_series() {
        let model = two_region_model(10);
        let w = model.window(2, 3).unwrap();

        assert_eq!(w.horizon(), 3);
        assert_eq!(w.carbon_intensity(0, 0), 102.0);
        assert_eq!(w.carbon_intensities(2), vec![104.0, 296.0]);
    }

    #[test]
    fn window_past_end_is_alignment_fault() {
        let model = two_region_model(5);
        let err = model.window(3, 3).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DataAlignment {
                start: 3,
                end: 6,
                available: 5
            }
        ));
    }

    #[test]
    fn negative_demand_is_rejected() {
        let catalog = RegionCatalog::new(names(&["a"]), vec![vec![0.0]]).unwrap();
        let err = RegionModel::new(catalog, vec![RegionSeries::new(vec![1.0], vec![-2.0])])
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidSeries { .. }));
    }

    #[test]
    fn breakdown_missing_is_reported() {
        let model = two_region_model(2);
        assert!(!model.has_breakdown());
        assert!(matches!(
            model.demand_breakdown(0, 0),
            Err(ModelError::MissingBreakdown(name)) if name == "east"
        ));
    }

    #[test]
    fn breakdown_width_must_match_regions() {
        let catalog = RegionCatalog::new(names(&["a", "b"]), vec![vec![0.0; 2]; 2]).unwrap();
        let err = RegionModel::new(
            catalog,
            vec![
                RegionSeries::new(vec![1.0], vec![1.0]).with_breakdown(vec![vec![1.0]]),
                RegionSeries::new(vec![1.0], vec![1.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidSeries { .. }));
    }
}
