//! Satellite source adapters.
//!
//! Each supported source carries a fixed [`SourceSpec`]: collection id,
//! temperature band, digital-number conversion, quality mask, temporal
//! aggregation method, and any granule-level pre-filter. Adding a source
//! means adding a variant and a spec, nothing else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lst_common::{DateRange, LstError, LstResult, Region};

use crate::imagery::{
    AggregateMethod, BandTransform, GranuleFilter, ImageryResult, ImageryService, QualityMask,
    Resampling, ResolvedImage,
};

/// Satellite data source for land-surface temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LstSource {
    Modis,
    Landsat,
}

impl LstSource {
    /// Parse a source tag; unknown tags are `InvalidParameter`.
    pub fn parse(s: &str) -> LstResult<Self> {
        s.parse()
    }

    /// The fixed parameters of this source.
    pub fn spec(&self) -> &'static SourceSpec {
        match self {
            LstSource::Modis => &MODIS,
            LstSource::Landsat => &LANDSAT,
        }
    }
}

impl FromStr for LstSource {
    type Err = LstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modis" => Ok(LstSource::Modis),
            "landsat" => Ok(LstSource::Landsat),
            other => Err(LstError::invalid_parameter(
                "source",
                format!("unknown source '{}', expected 'modis' or 'landsat'", other),
            )),
        }
    }
}

impl fmt::Display for LstSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LstSource::Modis => write!(f, "modis"),
            LstSource::Landsat => write!(f, "landsat"),
        }
    }
}

/// Fixed parameters of one satellite source.
///
/// `scale`/`offset_celsius` convert stored digital numbers directly to
/// Celsius: `t = dn * scale + offset_celsius`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub collection: &'static str,
    pub band: &'static str,
    pub scale: f64,
    pub offset_celsius: f64,
    pub quality_band: &'static str,
    pub quality_bit_mask: u32,
    pub quality_expect: u32,
    pub aggregation: AggregateMethod,
    /// Scene-level cloud-cover bound in percent, applied at listing time.
    pub max_cloud_cover: Option<f64>,
    /// Native pixel size, used as the default reduction/sampling scale.
    pub native_scale_m: f64,
}

/// MODIS Terra daily LST: DN * 0.02 Kelvin, QC_Day two low bits clear.
pub static MODIS: SourceSpec = SourceSpec {
    collection: "MODIS/061/MOD11A1",
    band: "LST_Day_1km",
    scale: 0.02,
    offset_celsius: -273.15,
    quality_band: "QC_Day",
    quality_bit_mask: 0b11,
    quality_expect: 0,
    aggregation: AggregateMethod::Mean,
    max_cloud_cover: None,
    native_scale_m: 1000.0,
};

/// Landsat 8 Collection 2 Level 2 surface temperature:
/// DN * 0.00341802 + 149.0 Kelvin, QA_PIXEL cloud bit clear.
pub static LANDSAT: SourceSpec = SourceSpec {
    collection: "LANDSAT/LC08/C02/T1_L2",
    band: "ST_B10",
    scale: 0.003_418_02,
    offset_celsius: 149.0 - 273.15,
    quality_band: "QA_PIXEL",
    quality_bit_mask: 1 << 3,
    quality_expect: 0,
    aggregation: AggregateMethod::Median,
    max_cloud_cover: Some(20.0),
    native_scale_m: 30.0,
};

impl SourceSpec {
    /// Band transform the imagery service applies to each granule.
    ///
    /// Bilinear resampling keeps point sampling smooth across the
    /// coarse native grid.
    pub fn transform(&self) -> BandTransform {
        BandTransform {
            band: self.band.to_string(),
            scale: self.scale,
            offset: self.offset_celsius,
            quality: Some(QualityMask {
                band: self.quality_band.to_string(),
                bit_mask: self.quality_bit_mask,
                expect: self.quality_expect,
            }),
            resample: Resampling::Bilinear,
        }
    }

    /// Granule-level predicates for this source.
    pub fn granule_filters(&self) -> Vec<GranuleFilter> {
        self.max_cloud_cover
            .map(GranuleFilter::CloudCoverBelow)
            .into_iter()
            .collect()
    }

    /// Resolve the temperature image for `region` over `range`.
    ///
    /// Zero matching granules is a normal outcome and yields an image
    /// with no valid pixels; the caller's statistics probe decides
    /// whether the result is usable.
    pub async fn resolve(
        &self,
        imagery: &dyn ImageryService,
        region: &Region,
        range: &DateRange,
    ) -> ImageryResult<ResolvedImage> {
        let filters = self.granule_filters();
        let granules = imagery
            .list_granules(self.collection, region, range, &filters)
            .await?;
        debug!(
            collection = self.collection,
            granules = granules.len(),
            "resolving temperature image"
        );

        let transform = self.transform();
        let mut bands = Vec::with_capacity(granules.len());
        for granule in &granules {
            bands.push(imagery.apply_transform(granule, &transform).await?);
        }

        imagery.aggregate(bands, self.band, self.aggregation).await
    }
}
