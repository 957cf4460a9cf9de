//! Hotspot extraction for intervention planning.
//!
//! Masks the resolved image to pixels strictly above a temperature
//! threshold and samples a bounded set of candidate sites (e.g. for
//! tree planting). Points carry the raw Celsius value, not a display
//! intensity.

use serde::Serialize;

use lst_common::{LstError, LstResult, Region};

use crate::imagery::{ImageryService, ResolvedImage};
use crate::stats::round2;

/// A candidate intervention site: one above-threshold pixel with its
/// raw temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlantingPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "temperature")]
    pub temperature_c: f64,
}

/// Extract up to `max_points` pixels strictly above `threshold_c`.
///
/// Samples whose temperature is absent (mask boundaries) are silently
/// skipped. Every emitted point's temperature strictly exceeds the
/// threshold and is rounded to 2 decimals.
pub async fn extract_hotspots(
    imagery: &dyn ImageryService,
    image: &ResolvedImage,
    region: &Region,
    threshold_c: f64,
    max_points: u32,
    scale_m: f64,
) -> LstResult<Vec<PlantingPoint>> {
    if max_points == 0 {
        return Err(LstError::invalid_parameter(
            "max_points",
            "must be greater than zero",
        ));
    }

    let masked = imagery
        .mask_greater_than(image, threshold_c)
        .await
        .map_err(|e| LstError::service(e.to_string()))?;

    let samples = imagery
        .sample_region(&masked, region, scale_m, max_points)
        .await
        .map_err(|e| LstError::service(e.to_string()))?;

    let mut points = Vec::with_capacity(samples.len());
    for sample in samples {
        let Some(t) = sample.value else {
            continue;
        };
        // The mask should already exclude these, but never emit a point
        // at or below the threshold.
        if t <= threshold_c {
            continue;
        }
        points.push(PlantingPoint {
            lat: sample.location.lat,
            lon: sample.location.lon,
            temperature_c: round2(t),
        });
    }

    Ok(points)
}
