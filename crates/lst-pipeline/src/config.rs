//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::resolve::DEFAULT_WINDOWS_DAYS;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Candidate trailing-day windows, narrowest first.
    pub windows_days: Vec<u32>,
    /// Wall-clock bound for a single window attempt.
    pub attempt_timeout_secs: u64,
    /// Sample budget for the heatmap product.
    pub heatmap_points: u32,
    /// Default hotspot threshold in Celsius.
    pub default_threshold_c: f64,
    /// Default bound on planting points.
    pub default_max_planting_points: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            windows_days: DEFAULT_WINDOWS_DAYS.to_vec(),
            attempt_timeout_secs: 30,
            heatmap_points: 500,
            default_threshold_c: 35.0,
            default_max_planting_points: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.windows_days, vec![30, 90, 180]);
        assert_eq!(config.default_threshold_c, 35.0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "windows_days": [15, 60] }"#).unwrap();
        assert_eq!(config.windows_days, vec![15, 60]);
        assert_eq!(config.heatmap_points, 500);
    }
}
