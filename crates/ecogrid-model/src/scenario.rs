//! JSON scenario documents.
//!
//! A scenario carries everything the core consumes: region names, hourly
//! series, and the latency table. `null` latency entries stand for missing
//! measurements and are replaced by the catalog's penalty.
//!
//! ```json
//! {
//!   "regions": [
//!     { "name": "US-CAL-CISO", "carbon_intensity": [210.0, 190.5], "demand": [1200, 900] },
//!     { "name": "US-TEX-ERCO", "carbon_intensity": [400.0, 420.0], "demand": [800, 700] }
//!   ],
//!   "latency": [[0.0, 35.2], [null, 0.0]]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::ModelResult;
use crate::region::{RegionCatalog, RegionModel, RegionSeries};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRegion {
    pub name: String,
    pub carbon_intensity: Vec<f64>,
    pub demand: Vec<f64>,
    /// `demand_to[t][dest]`, used by replay runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_to: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub regions: Vec<ScenarioRegion>,
    pub latency: Vec<Vec<Option<f64>>>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build the full (unwindowed) region model.
    pub fn into_model(self) -> ModelResult<RegionModel> {
        let names = self.regions.iter().map(|r| r.name.clone()).collect();
        let latency = self
            .latency
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();
        let catalog = RegionCatalog::new(names, latency)?;

        let series = self
            .regions
            .into_iter()
            .map(|r| {
                let series = RegionSeries::new(r.carbon_intensity, r.demand);
                match r.demand_to {
                    Some(b) => series.with_breakdown(b),
                    None => series,
                }
            })
            .collect();

        RegionModel::new(catalog, series)
    }

    /// Build the region model windowed to the hours `config` simulates.
    pub fn into_windowed_model(self, config: &SimConfig) -> ModelResult<RegionModel> {
        self.into_model()?.window(config.start_offset, config.hours())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::region::LATENCY_PENALTY;

    const DOC: &str = r#"{
        "regions": [
            { "name": "a", "carbon_intensity": [100, 110, 120, 130], "demand": [10, 20, 30, 40] },
            { "name": "b", "carbon_intensity": [50, 60, 70, 80], "demand": [1, 2, 3, 4] }
        ],
        "latency": [[0.0, 12.5], [null, 0.0]]
    }"#;

    #[test]
    fn parses_and_sanitizes() {
        let model = Scenario::from_json_str(DOC).unwrap().into_model().unwrap();

        assert_eq!(model.region_count(), 2);
        assert_eq!(model.horizon(), 4);
        assert_eq!(model.catalog().latency(0, 1), 12.5);
        assert_eq!(model.catalog().latency(1, 0), LATENCY_PENALTY);
    }

    #[test]
    fn windowed_model_respects_offset() {
        let config = SimConfig {
            timesteps: 1,
            start_offset: 2,
            ..Default::default()
        };
        let model = Scenario::from_json_str(DOC)
            .unwrap()
            .into_windowed_model(&config)
            .unwrap();

        assert_eq!(model.horizon(), 2);
        assert_eq!(model.demand(0, 0), 30.0);
    }

    #[test]
    fn offset_past_data_is_alignment_fault() {
        let config = SimConfig {
            timesteps: 3,
            start_offset: 1,
            ..Default::default()
        };
        let err = Scenario::from_json_str(DOC)
            .unwrap()
            .into_windowed_model(&config)
            .unwrap_err();
        assert!(matches!(err, ModelError::DataAlignment { .. }));
    }

    #[test]
    fn demand_to_becomes_breakdown() {
        let doc = r#"{
            "regions": [
                { "name": "a", "carbon_intensity": [1], "demand": [3], "demand_to": [[1, 2]] },
                { "name": "b", "carbon_intensity": [1], "demand": [0], "demand_to": [[0, 0]] }
            ],
            "latency": [[0, 1], [1, 0]]
        }"#;
        let model = Scenario::from_json_str(doc).unwrap().into_model().unwrap();

        assert!(model.has_breakdown());
        assert_eq!(model.demand_breakdown(0, 0).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            Scenario::from_json_str("{ nope"),
            Err(ModelError::Json(_))
        ));
    }
}
