//! Regional temperature statistics.

use serde::Serialize;

use lst_common::{LstError, LstResult, Region};

use crate::imagery::{ImageryService, Reducer, ResolvedImage};

/// Summary statistics in Celsius over the valid pixels of a resolved
/// image within a region.
///
/// Absent fields serialize as JSON null: "no data" is a distinct state
/// from a legitimately zero statistic, and callers must be able to tell
/// them apart.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Statistics {
    /// Whether the reduction produced the required statistics.
    /// `std_dev` is optional and does not participate.
    pub fn has_data(&self) -> bool {
        self.min.is_some() && self.max.is_some() && self.mean.is_some()
    }

    /// Round all present fields to 2 decimals for presentation.
    pub fn rounded(self) -> Self {
        Self {
            min: self.min.map(round2),
            max: self.max.map(round2),
            mean: self.mean.map(round2),
            std_dev: self.std_dev.map(round2),
        }
    }
}

/// Round a Celsius value to 2 decimal digits.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

const FULL_REDUCERS: &[Reducer] = &[Reducer::Min, Reducer::Max, Reducer::Mean, Reducer::StdDev];

/// Reduce `image` over `region` at `scale_m` resolution.
///
/// Fields the service reports as null or omits entirely stay `None`;
/// no placeholder zeros are ever substituted.
pub async fn reduce(
    imagery: &dyn ImageryService,
    image: &ResolvedImage,
    region: &Region,
    scale_m: f64,
) -> LstResult<Statistics> {
    let values = imagery
        .reduce_region(image, region, FULL_REDUCERS, scale_m)
        .await
        .map_err(|e| LstError::service(e.to_string()))?;

    let get = |r: Reducer| values.get(r.key()).copied().flatten();
    Ok(Statistics {
        min: get(Reducer::Min),
        max: get(Reducer::Max),
        mean: get(Reducer::Mean),
        std_dev: get(Reducer::StdDev),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{stats_map, ScriptedImagery};
    use lst_common::LatLon;

    fn image() -> ResolvedImage {
        ResolvedImage {
            handle: "image-0".to_string(),
            band: "LST_Day_1km".to_string(),
        }
    }

    fn region() -> Region {
        Region::circle(LatLon::new(-15.78, -47.93), 10.0).unwrap()
    }

    #[tokio::test]
    async fn test_reduce_orders_min_mean_max() {
        let imagery = ScriptedImagery::new().with_reduce(stats_map(&[
            ("min", Some(17.31)),
            ("max", Some(42.08)),
            ("mean", Some(28.77)),
            ("stdDev", Some(4.2)),
        ]));

        let stats = reduce(&imagery, &image(), &region(), 1000.0).await.unwrap();
        assert!(stats.has_data());
        assert!(stats.min.unwrap() <= stats.mean.unwrap());
        assert!(stats.mean.unwrap() <= stats.max.unwrap());
        assert_eq!(stats.std_dev, Some(4.2));
    }

    #[tokio::test]
    async fn test_missing_fields_stay_undefined() {
        // A reducer key the service omits must not become zero.
        let imagery = ScriptedImagery::new()
            .with_reduce(stats_map(&[("min", Some(0.0)), ("max", None)]));

        let stats = reduce(&imagery, &image(), &region(), 1000.0).await.unwrap();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, None);
        assert_eq!(stats.mean, None);
        assert!(!stats.has_data());
    }

    #[test]
    fn test_rounding() {
        let stats = Statistics {
            min: Some(17.3149),
            max: Some(42.086),
            mean: Some(28.7701),
            std_dev: None,
        };
        let rounded = stats.rounded();
        assert_eq!(rounded.min, Some(17.31));
        assert_eq!(rounded.max, Some(42.09));
        assert_eq!(rounded.mean, Some(28.77));
        assert_eq!(rounded.std_dev, None);
    }

    #[test]
    fn test_null_serializes_distinct_from_zero() {
        let stats = Statistics {
            min: Some(0.0),
            max: None,
            mean: None,
            std_dev: None,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["min"], 0.0);
        assert!(json["max"].is_null());
    }
}
