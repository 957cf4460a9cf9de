//! Adaptive temporal window expansion.
//!
//! Satellite LST coverage is patchy: clouds can blank out a city for
//! weeks. The expander walks an ordered list of trailing-day windows
//! (narrowest first), resolves an image per window, and accepts the
//! first one whose min/max probe reports usable pixels. Wider windows
//! are never attempted once a narrower one succeeds.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use lst_common::{DateRange, LatLon, LstError, LstResult, Region};

use crate::imagery::{ImageryError, ImageryService, Reducer, ResolvedImage};
use crate::source::LstSource;

/// Candidate windows in trailing days, narrowest first.
pub const DEFAULT_WINDOWS_DAYS: [u32; 3] = [30, 90, 180];

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedWindow {
    pub image: ResolvedImage,
    pub region: Region,
    pub range: DateRange,
    /// The trailing-day window that produced usable data.
    pub days_used: u32,
}

/// Drives retries over widening date ranges.
#[derive(Debug, Clone)]
pub struct WindowExpander {
    windows_days: Vec<u32>,
    attempt_timeout: Duration,
}

impl WindowExpander {
    /// Expander over the given candidate windows, tried in order.
    pub fn new(windows_days: Vec<u32>) -> Self {
        Self {
            windows_days,
            attempt_timeout: Duration::from_secs(30),
        }
    }

    /// Bound the wall-clock time of a single window attempt. A timeout
    /// is treated like a failed imagery query: log and advance.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn windows_days(&self) -> &[u32] {
        &self.windows_days
    }

    /// Resolve a temperature image for `radius_km` around `center`.
    ///
    /// Returns the first window yielding usable statistics, or
    /// [`LstError::NoData`] when every candidate window is exhausted.
    pub async fn resolve(
        &self,
        imagery: &dyn ImageryService,
        center: LatLon,
        radius_km: f64,
        source: LstSource,
    ) -> LstResult<ResolvedWindow> {
        for &days in &self.windows_days {
            let range = DateRange::trailing_days(Utc::now(), days);
            // The region is rebuilt per attempt; nothing is cached
            // across attempts.
            let region = Region::circle(center, radius_km)?;

            match timeout(
                self.attempt_timeout,
                self.try_window(imagery, &region, &range, source),
            )
            .await
            {
                Ok(Ok(Some(image))) => {
                    info!(days, source = %source, "window yielded usable data");
                    return Ok(ResolvedWindow {
                        image,
                        region,
                        range,
                        days_used: days,
                    });
                }
                Ok(Ok(None)) => {
                    debug!(days, source = %source, "no usable pixels in window, widening");
                }
                Ok(Err(e)) => {
                    warn!(days, source = %source, error = %e, "imagery query failed, trying next window");
                }
                Err(_) => {
                    warn!(days, source = %source, "window attempt timed out, trying next window");
                }
            }
        }

        Err(LstError::NoData {
            windows_attempted: self.windows_days.clone(),
        })
    }

    /// Resolve one window and probe it for usable pixels.
    async fn try_window(
        &self,
        imagery: &dyn ImageryService,
        region: &Region,
        range: &DateRange,
        source: LstSource,
    ) -> Result<Option<ResolvedImage>, ImageryError> {
        let spec = source.spec();
        let image = spec.resolve(imagery, region, range).await?;

        let probe = imagery
            .reduce_region(&image, region, PROBE_REDUCERS, spec.native_scale_m)
            .await?;

        if stats_present(&probe, PROBE_REDUCERS) {
            Ok(Some(image))
        } else {
            Ok(None)
        }
    }
}

impl Default for WindowExpander {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOWS_DAYS.to_vec())
    }
}

const PROBE_REDUCERS: &[Reducer] = &[Reducer::Min, Reducer::Max];

/// Usability test for a reduction result: every expected key present
/// and non-null. Legitimately zero-valued statistics count as usable;
/// only absent or null values trigger window expansion.
fn stats_present(values: &HashMap<String, Option<f64>>, expected: &[Reducer]) -> bool {
    expected
        .iter()
        .all(|r| matches!(values.get(r.key()), Some(Some(_))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{stats_map, ScriptedImagery};

    fn center() -> LatLon {
        LatLon::new(-23.55, -46.63)
    }

    #[test]
    fn test_stats_present_accepts_zero_values() {
        // An all-zero but present result is a valid cold region, not
        // missing data.
        let values = stats_map(&[("min", Some(0.0)), ("max", Some(0.0))]);
        assert!(stats_present(&values, PROBE_REDUCERS));
    }

    #[test]
    fn test_stats_present_rejects_nulls_and_missing_keys() {
        let nulls = stats_map(&[("min", None), ("max", None)]);
        assert!(!stats_present(&nulls, PROBE_REDUCERS));

        let partial = stats_map(&[("min", Some(12.0))]);
        assert!(!stats_present(&partial, PROBE_REDUCERS));
    }

    #[tokio::test]
    async fn test_expands_until_usable_window() {
        // Scenario: no granules for 30 and 90 days, data at 180.
        let imagery = ScriptedImagery::new()
            .with_granules(Ok(vec![]))
            .with_reduce(stats_map(&[("min", None), ("max", None)]))
            .with_granules(Ok(vec![]))
            .with_reduce(stats_map(&[("min", None), ("max", None)]))
            .with_granules(Ok(vec![ScriptedImagery::granule("g-1")]))
            .with_reduce(stats_map(&[("min", Some(18.2)), ("max", Some(41.0))]));

        let expander = WindowExpander::default();
        let resolved = expander
            .resolve(&imagery, center(), 10.0, LstSource::Modis)
            .await
            .unwrap();

        assert_eq!(resolved.days_used, 180);
        assert_eq!(imagery.list_calls(), 3);
        assert_eq!(resolved.range.num_days(), 180);
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_usable_window() {
        let imagery = ScriptedImagery::new()
            .with_granules(Ok(vec![ScriptedImagery::granule("g-1")]))
            .with_reduce(stats_map(&[("min", Some(20.0)), ("max", Some(35.0))]));

        let expander = WindowExpander::default();
        let resolved = expander
            .resolve(&imagery, center(), 10.0, LstSource::Modis)
            .await
            .unwrap();

        assert_eq!(resolved.days_used, 30);
        // Wider windows must never be attempted after a success.
        assert_eq!(imagery.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_all_windows_empty_is_no_data() {
        let mut imagery = ScriptedImagery::new();
        for _ in 0..3 {
            imagery = imagery
                .with_granules(Ok(vec![]))
                .with_reduce(stats_map(&[("min", None), ("max", None)]));
        }

        let expander = WindowExpander::default();
        let err = expander
            .resolve(&imagery, center(), 10.0, LstSource::Landsat)
            .await
            .unwrap_err();

        match err {
            LstError::NoData { windows_attempted } => {
                assert_eq!(windows_attempted, vec![30, 90, 180]);
            }
            other => panic!("expected NoData, got {:?}", other),
        }
        assert_eq!(imagery.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_single_window_failure_is_absorbed() {
        // A transport error on the first window must not abort the
        // resolution; the second window succeeds.
        let imagery = ScriptedImagery::new()
            .with_granules(Err(ScriptedImagery::transport_error("connection reset")))
            .with_granules(Ok(vec![ScriptedImagery::granule("g-2")]))
            .with_reduce(stats_map(&[("min", Some(15.0)), ("max", Some(28.5))]));

        let expander = WindowExpander::default();
        let resolved = expander
            .resolve(&imagery, center(), 10.0, LstSource::Modis)
            .await
            .unwrap();

        assert_eq!(resolved.days_used, 90);
        assert_eq!(imagery.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_radius_reported_before_any_imagery_call() {
        let imagery = ScriptedImagery::new();
        let expander = WindowExpander::default();

        let err = expander
            .resolve(&imagery, center(), 0.0, LstSource::Modis)
            .await
            .unwrap_err();

        assert!(matches!(err, LstError::InvalidParameter { .. }));
        assert_eq!(imagery.list_calls(), 0);
    }
}
