//! Contract with the remote imagery service.
//!
//! The imagery service stores the satellite archives and executes every
//! pixel-level operation: granule search, per-granule band transforms,
//! temporal aggregation, regional reduction, sampling, and threshold
//! masking. This module defines the minimal client-side contract plus
//! the records that cross it. Rasters never leave the service; the
//! client only holds opaque handles.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lst_common::{DateRange, LatLon, Region};

/// Errors from a single imagery-service call.
///
/// All variants are transient from the pipeline's point of view: the
/// window expander absorbs them per attempt and moves to the next
/// candidate window.
#[derive(Debug, Error)]
pub enum ImageryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("imagery backend rejected request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("malformed imagery response: {0}")]
    Protocol(String),

    #[error("imagery request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ImageryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ImageryError::Timeout
        } else {
            ImageryError::Transport(err.to_string())
        }
    }
}

/// Result type alias for imagery-service calls.
pub type ImageryResult<T> = Result<T, ImageryError>;

/// One satellite capture intersecting a region and date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGranule {
    pub id: String,
    pub acquired: DateTime<Utc>,
    /// Scene-level cloud cover percentage, when the source reports one.
    pub cloud_cover: Option<f64>,
}

/// Server-side handle to a single-band raster derived from one granule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBand {
    pub handle: String,
}

/// Server-side handle to the aggregated temperature raster in Celsius.
///
/// Only produced by [`ImageryService::aggregate`] (or re-masked by
/// [`ImageryService::mask_greater_than`]); the sole input to reduction,
/// sampling, and hotspot extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub handle: String,
    pub band: String,
}

/// Per-pixel temporal aggregation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateMethod {
    Mean,
    Median,
}

/// Source-specific granule predicates applied at listing time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranuleFilter {
    /// Keep granules whose scene cloud cover is below the bound (percent).
    CloudCoverBelow(f64),
}

/// Pixel interpolation applied when the transformed band is resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    Nearest,
    Bilinear,
    Bicubic,
}

/// Per-pixel validity test against a quality-control band.
///
/// A pixel is kept iff `qc & bit_mask == expect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMask {
    pub band: String,
    pub bit_mask: u32,
    pub expect: u32,
}

/// Band transform the service applies to each granule: select the
/// temperature band, convert digital numbers to Celsius
/// (`value * scale + offset`), mask invalid pixels, resample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTransform {
    pub band: String,
    pub scale: f64,
    pub offset: f64,
    pub quality: Option<QualityMask>,
    pub resample: Resampling,
}

/// Spatial reducers the service can run over a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Reducer {
    Min,
    Max,
    Mean,
    StdDev,
}

impl Reducer {
    /// Key under which the service reports this reducer's value.
    pub fn key(&self) -> &'static str {
        match self {
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::Mean => "mean",
            Reducer::StdDev => "stdDev",
        }
    }
}

/// One sampled pixel: coordinates plus the band value, which is absent
/// for pixels on mask boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSample {
    pub location: LatLon,
    pub value: Option<f64>,
}

/// Client contract for the remote imagery service.
///
/// Every call is a network round trip and may fail with a transient
/// [`ImageryError`]; callers must treat failures as retryable only at
/// the window granularity, never by substituting fabricated data.
#[async_trait]
pub trait ImageryService: Send + Sync {
    /// List granules of `collection` intersecting `region` within
    /// `range`, after applying source-specific `filters`.
    async fn list_granules(
        &self,
        collection: &str,
        region: &Region,
        range: &DateRange,
        filters: &[GranuleFilter],
    ) -> ImageryResult<Vec<RawGranule>>;

    /// Apply a band transform to one granule.
    async fn apply_transform(
        &self,
        granule: &RawGranule,
        transform: &BandTransform,
    ) -> ImageryResult<ResolvedBand>;

    /// Aggregate transformed bands per pixel into a single image.
    ///
    /// An empty `bands` sequence is valid and yields an image with no
    /// valid pixels, not an error.
    async fn aggregate(
        &self,
        bands: Vec<ResolvedBand>,
        band_name: &str,
        method: AggregateMethod,
    ) -> ImageryResult<ResolvedImage>;

    /// Run spatial reducers over `region` at `scale_m` resolution.
    ///
    /// The result maps each reducer key to its value, or to `None` when
    /// the region contains no valid pixels. A missing key and an
    /// explicit null are both "absent".
    async fn reduce_region(
        &self,
        image: &ResolvedImage,
        region: &Region,
        reducers: &[Reducer],
        scale_m: f64,
    ) -> ImageryResult<HashMap<String, Option<f64>>>;

    /// Draw up to `num_points` pixel samples within `region` at
    /// `scale_m` resolution. Masked-out pixels are never sampled, but
    /// samples at mask boundaries may carry an absent value.
    async fn sample_region(
        &self,
        image: &ResolvedImage,
        region: &Region,
        scale_m: f64,
        num_points: u32,
    ) -> ImageryResult<Vec<RegionSample>>;

    /// Mask the image to pixels strictly greater than `threshold`.
    async fn mask_greater_than(
        &self,
        image: &ResolvedImage,
        threshold: f64,
    ) -> ImageryResult<ResolvedImage>;
}
