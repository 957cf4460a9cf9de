//! Bounded point sampling and display normalization.
//!
//! Draws up to a budget of pixel samples from the resolved image and
//! rescales their temperatures into a fixed display range for heatmap
//! rendering. Normalization is against the sampled set's own min/max,
//! not the region-wide statistics, so the rendered gradient always uses
//! the full intensity range of what is actually shown.

use serde::Serialize;

use lst_common::{LatLon, LstError, LstResult, Region};

use crate::imagery::{ImageryService, ResolvedImage};

/// Lower clamp for display intensity: extremes never saturate to the
/// pure background color.
pub const INTENSITY_FLOOR: f64 = 0.05;
/// Upper clamp for display intensity: extremes never saturate to the
/// pure hot color.
pub const INTENSITY_CEILING: f64 = 0.95;
/// Guard against division by a degenerate (near-zero) temperature range.
pub const RANGE_EPSILON: f64 = 0.001;

/// One sampled pixel with its raw Celsius value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPoint {
    pub location: LatLon,
    pub temperature_c: f64,
}

/// A display-normalized sample, intensity in
/// [`INTENSITY_FLOOR`, `INTENSITY_CEILING`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// A normalized sample set with the basis used to normalize it, so the
/// mapping is invertible: `t = intensity * range + t_min` for samples
/// inside the clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSamples {
    pub points: Vec<HeatmapPoint>,
    pub t_min: f64,
    pub range: f64,
}

/// Min–max normalize a sampled set into heatmap points.
///
/// Input order is preserved. An empty input yields an empty result.
pub fn normalize(samples: &[RawPoint]) -> NormalizedSamples {
    if samples.is_empty() {
        return NormalizedSamples {
            points: Vec::new(),
            t_min: 0.0,
            range: RANGE_EPSILON,
        };
    }

    let mut t_min = f64::INFINITY;
    let mut t_max = f64::NEG_INFINITY;
    for s in samples {
        t_min = t_min.min(s.temperature_c);
        t_max = t_max.max(s.temperature_c);
    }
    let range = (t_max - t_min).max(RANGE_EPSILON);

    let points = samples
        .iter()
        .map(|s| HeatmapPoint {
            lat: s.location.lat,
            lon: s.location.lon,
            intensity: ((s.temperature_c - t_min) / range)
                .clamp(INTENSITY_FLOOR, INTENSITY_CEILING),
        })
        .collect();

    NormalizedSamples {
        points,
        t_min,
        range,
    }
}

/// Sample up to `num_points` pixels of `image` within `region` at
/// `scale_m` resolution and normalize them for display.
///
/// Samples without a temperature value (mask boundaries) are excluded
/// before normalization. Zero usable samples is a valid, renderable
/// empty result, not an error.
pub async fn sample_and_normalize(
    imagery: &dyn ImageryService,
    image: &ResolvedImage,
    region: &Region,
    scale_m: f64,
    num_points: u32,
) -> LstResult<Vec<HeatmapPoint>> {
    if num_points == 0 {
        return Err(LstError::invalid_parameter(
            "num_points",
            "must be greater than zero",
        ));
    }

    let samples = imagery
        .sample_region(image, region, scale_m, num_points)
        .await
        .map_err(|e| LstError::service(e.to_string()))?;

    let raw: Vec<RawPoint> = samples
        .into_iter()
        .filter_map(|s| {
            s.value.map(|temperature_c| RawPoint {
                location: s.location,
                temperature_c,
            })
        })
        .collect();

    Ok(normalize(&raw).points)
}
