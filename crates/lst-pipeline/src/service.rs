//! Service facade exposing the three temperature products.
//!
//! `LstService` holds the process-wide imagery client handle, the city
//! registry, and the pipeline configuration. Every operation validates
//! its parameters before the first remote call, resolves an image
//! through the window expander, and shapes the product into a report
//! envelope. Operations have no side effects beyond the imagery calls;
//! nothing is cached between invocations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};

use lst_common::{City, CityRegistry, LstError, LstResult};

use crate::config::PipelineConfig;
use crate::hotspots::{self, PlantingPoint};
use crate::imagery::ImageryService;
use crate::resolve::{ResolvedWindow, WindowExpander};
use crate::sample::{self, HeatmapPoint};
use crate::source::LstSource;
use crate::stats::{self, Statistics};

/// The analysis period a product was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// The trailing-day window that actually produced the data.
    pub days: u32,
}

impl Period {
    fn from_resolved(resolved: &ResolvedWindow) -> Self {
        Self {
            start: resolved.range.start,
            end: resolved.range.end,
            days: resolved.days_used,
        }
    }
}

/// Summary statistics product.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsReport {
    pub city: String,
    pub source: LstSource,
    pub statistics: Statistics,
    pub period: Period,
}

/// Heatmap product: normalized points ready for rendering. An empty
/// point set is a valid, renderable result.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapReport {
    pub city: String,
    pub source: LstSource,
    pub points: Vec<HeatmapPoint>,
    pub period: Period,
}

/// Planting-points product: above-threshold pixels with raw values.
#[derive(Debug, Clone, Serialize)]
pub struct PlantingReport {
    pub city: String,
    pub source: LstSource,
    pub threshold: f64,
    pub points_count: usize,
    pub points: Vec<PlantingPoint>,
    pub period: Period,
}

/// Entry points for the temperature pipeline.
pub struct LstService {
    imagery: Arc<dyn ImageryService>,
    cities: CityRegistry,
    expander: WindowExpander,
    config: PipelineConfig,
}

impl LstService {
    pub fn new(
        imagery: Arc<dyn ImageryService>,
        cities: CityRegistry,
        config: PipelineConfig,
    ) -> Self {
        let expander = WindowExpander::new(config.windows_days.clone())
            .with_attempt_timeout(Duration::from_secs(config.attempt_timeout_secs));
        Self {
            imagery,
            cities,
            expander,
            config,
        }
    }

    /// The registry of cities this service can answer for.
    pub fn cities(&self) -> &CityRegistry {
        &self.cities
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn city(&self, city_id: &str) -> LstResult<&City> {
        self.cities.get(city_id).ok_or_else(|| {
            LstError::invalid_parameter("city", format!("unknown city '{}'", city_id))
        })
    }

    /// Temperature statistics for a circular region around a city.
    #[instrument(skip(self))]
    pub async fn get_statistics(
        &self,
        city_id: &str,
        source: LstSource,
        radius_km: f64,
    ) -> LstResult<StatisticsReport> {
        let city = self.city(city_id)?;
        let resolved = self
            .expander
            .resolve(self.imagery.as_ref(), city.center, radius_km, source)
            .await?;

        let statistics = stats::reduce(
            self.imagery.as_ref(),
            &resolved.image,
            &resolved.region,
            source.spec().native_scale_m,
        )
        .await?;

        if !statistics.has_data() {
            // The probe accepted this window but the full reduction
            // came back empty; report missing data, never zeros.
            warn!(city = city_id, days = resolved.days_used, "reduction empty after usable probe");
            return Err(LstError::NoData {
                windows_attempted: self.expander.windows_days().to_vec(),
            });
        }

        Ok(StatisticsReport {
            city: city.name.clone(),
            source,
            statistics: statistics.rounded(),
            period: Period::from_resolved(&resolved),
        })
    }

    /// Display-normalized heatmap points for a circular region.
    #[instrument(skip(self))]
    pub async fn get_heatmap(
        &self,
        city_id: &str,
        source: LstSource,
        radius_km: f64,
    ) -> LstResult<HeatmapReport> {
        let city = self.city(city_id)?;
        let resolved = self
            .expander
            .resolve(self.imagery.as_ref(), city.center, radius_km, source)
            .await?;

        let points = sample::sample_and_normalize(
            self.imagery.as_ref(),
            &resolved.image,
            &resolved.region,
            source.spec().native_scale_m,
            self.config.heatmap_points,
        )
        .await?;

        Ok(HeatmapReport {
            city: city.name.clone(),
            source,
            points,
            period: Period::from_resolved(&resolved),
        })
    }

    /// Above-threshold planting candidates for a circular region.
    ///
    /// Resolves a fresh image; nothing is shared with a previous
    /// heatmap or statistics invocation.
    #[instrument(skip(self))]
    pub async fn get_planting_points(
        &self,
        city_id: &str,
        source: LstSource,
        radius_km: f64,
        threshold_c: f64,
        max_points: u32,
    ) -> LstResult<PlantingReport> {
        let city = self.city(city_id)?;
        if max_points == 0 {
            return Err(LstError::invalid_parameter(
                "max_points",
                "must be greater than zero",
            ));
        }

        let resolved = self
            .expander
            .resolve(self.imagery.as_ref(), city.center, radius_km, source)
            .await?;

        let points = hotspots::extract_hotspots(
            self.imagery.as_ref(),
            &resolved.image,
            &resolved.region,
            threshold_c,
            max_points,
            source.spec().native_scale_m,
        )
        .await?;

        Ok(PlantingReport {
            city: city.name.clone(),
            source,
            threshold: threshold_c,
            points_count: points.len(),
            points,
            period: Period::from_resolved(&resolved),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{stats_map, ScriptedImagery};

    fn service(imagery: Arc<ScriptedImagery>) -> LstService {
        LstService::new(imagery, CityRegistry::builtin(), PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_unknown_city_makes_no_imagery_call() {
        let imagery = Arc::new(ScriptedImagery::new());
        let svc = service(imagery.clone());

        let err = svc
            .get_statistics("gotham", LstSource::Modis, 10.0)
            .await
            .unwrap_err();

        assert!(matches!(err, LstError::InvalidParameter { .. }));
        assert_eq!(imagery.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_radius_makes_no_imagery_call() {
        let imagery = Arc::new(ScriptedImagery::new());
        let svc = service(imagery.clone());

        let err = svc
            .get_heatmap("sao_paulo", LstSource::Modis, 0.0)
            .await
            .unwrap_err();

        assert!(matches!(err, LstError::InvalidParameter { .. }));
        assert_eq!(imagery.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_statistics_report() {
        let imagery = Arc::new(
            ScriptedImagery::new()
                .with_granules(Ok(vec![ScriptedImagery::granule("g-1")]))
                // Window probe, then the full reduction.
                .with_reduce(stats_map(&[("min", Some(17.0)), ("max", Some(42.0))]))
                .with_reduce(stats_map(&[
                    ("min", Some(17.314)),
                    ("max", Some(42.086)),
                    ("mean", Some(28.775)),
                    ("stdDev", Some(4.251)),
                ])),
        );
        let svc = service(imagery.clone());

        let report = svc
            .get_statistics("sao_paulo", LstSource::Modis, 10.0)
            .await
            .unwrap();

        assert_eq!(report.city, "São Paulo");
        assert_eq!(report.period.days, 30);
        assert_eq!(report.statistics.min, Some(17.31));
        assert_eq!(report.statistics.max, Some(42.09));
        assert_eq!(report.statistics.std_dev, Some(4.25));
        assert_eq!(imagery.reduce_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_final_reduction_is_no_data() {
        let imagery = Arc::new(
            ScriptedImagery::new()
                .with_granules(Ok(vec![ScriptedImagery::granule("g-1")]))
                .with_reduce(stats_map(&[("min", Some(20.0)), ("max", Some(30.0))]))
                .with_reduce(stats_map(&[("min", None), ("max", None), ("mean", None)])),
        );
        let svc = service(imagery);

        let err = svc
            .get_statistics("recife", LstSource::Modis, 5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, LstError::NoData { .. }));
    }

    #[tokio::test]
    async fn test_heatmap_report() {
        let imagery = Arc::new(
            ScriptedImagery::new()
                .with_granules(Ok(vec![ScriptedImagery::granule("g-1")]))
                .with_reduce(stats_map(&[("min", Some(18.0)), ("max", Some(39.0))]))
                .with_samples(vec![
                    ScriptedImagery::sample(-22.90, -43.18, Some(24.0)),
                    ScriptedImagery::sample(-22.92, -43.16, Some(39.0)),
                ]),
        );
        let svc = service(imagery.clone());

        let report = svc
            .get_heatmap("rio_janeiro", LstSource::Modis, 12.0)
            .await
            .unwrap();

        assert_eq!(report.city, "Rio de Janeiro");
        assert_eq!(report.points.len(), 2);
        assert!(report.points.iter().all(|p| (0.05..=0.95).contains(&p.intensity)));
        assert_eq!(imagery.sample_calls(), 1);
    }

    #[tokio::test]
    async fn test_planting_report_resolves_fresh_image() {
        let imagery = Arc::new(
            ScriptedImagery::new()
                .with_granules(Ok(vec![ScriptedImagery::granule("g-1")]))
                .with_reduce(stats_map(&[("min", Some(25.0)), ("max", Some(44.0))]))
                .with_samples(vec![
                    ScriptedImagery::sample(-25.42, -49.28, Some(37.519)),
                    ScriptedImagery::sample(-25.44, -49.26, Some(35.0)),
                ]),
        );
        let svc = service(imagery.clone());

        let report = svc
            .get_planting_points("curitiba", LstSource::Modis, 10.0, 35.0, 30)
            .await
            .unwrap();

        assert_eq!(report.city, "Curitiba");
        assert_eq!(report.threshold, 35.0);
        assert_eq!(report.points_count, 1);
        assert_eq!(report.points[0].temperature_c, 37.52);
        // One granule listing for this invocation's own resolution.
        assert_eq!(imagery.list_calls(), 1);
        assert_eq!(imagery.mask_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_max_points_makes_no_imagery_call() {
        let imagery = Arc::new(ScriptedImagery::new());
        let svc = service(imagery.clone());

        let err = svc
            .get_planting_points("salvador", LstSource::Landsat, 10.0, 35.0, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, LstError::InvalidParameter { .. }));
        assert_eq!(imagery.list_calls(), 0);
    }
}
