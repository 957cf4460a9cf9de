//! Geographic primitives used to scope imagery queries.

use serde::{Deserialize, Serialize};

use crate::error::{LstError, LstResult};

/// Meters per degree of latitude (WGS84 mean).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A geographic point in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this bounding box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Center point of the bounding box.
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Clamp to valid geographic coordinates.
    pub fn clamp_to_valid(&self) -> Self {
        Self {
            min_lon: self.min_lon.clamp(-180.0, 180.0),
            min_lat: self.min_lat.clamp(-90.0, 90.0),
            max_lon: self.max_lon.clamp(-180.0, 180.0),
            max_lat: self.max_lat.clamp(-90.0, 90.0),
        }
    }
}

/// Query geometry scoping every imagery request.
///
/// Immutable once built; a Region is created per pipeline attempt and
/// discarded with the request that created it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Region {
    /// Circular buffer around a center point, radius in meters.
    Circle { center: LatLon, radius_m: f64 },
    /// Rectangular extent.
    Rect { bounds: BoundingBox },
}

impl Region {
    /// Build a circular region of `radius_km` kilometers around `center`.
    ///
    /// The radius must be strictly positive; NaN and non-positive values
    /// are rejected as `InvalidParameter`.
    pub fn circle(center: LatLon, radius_km: f64) -> LstResult<Self> {
        if !(radius_km > 0.0) || !radius_km.is_finite() {
            return Err(LstError::invalid_parameter(
                "radius_km",
                format!("must be a positive number, got {}", radius_km),
            ));
        }
        Ok(Region::Circle {
            center,
            radius_m: radius_km * 1000.0,
        })
    }

    /// Build a rectangular region.
    pub fn rect(bounds: BoundingBox) -> Self {
        Region::Rect { bounds }
    }

    /// Rectangular envelope of this region.
    ///
    /// For circles the envelope is derived from the meter radius using
    /// the local degrees-per-meter at the center latitude.
    pub fn bounding_box(&self) -> BoundingBox {
        match *self {
            Region::Rect { bounds } => bounds,
            Region::Circle { center, radius_m } => {
                let dlat = radius_m / METERS_PER_DEGREE;
                let cos_lat = center.lat.to_radians().cos().max(1e-6);
                let dlon = radius_m / (METERS_PER_DEGREE * cos_lat);
                BoundingBox::new(
                    center.lon - dlon,
                    center.lat - dlat,
                    center.lon + dlon,
                    center.lat + dlat,
                )
                .clamp_to_valid()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_region() {
        let region = Region::circle(LatLon::new(-23.55, -46.63), 10.0).unwrap();
        match region {
            Region::Circle { center, radius_m } => {
                assert_eq!(radius_m, 10_000.0);
                assert_eq!(center.lat, -23.55);
            }
            _ => panic!("expected circle"),
        }
    }

    #[test]
    fn test_zero_radius_rejected() {
        let err = Region::circle(LatLon::new(0.0, 0.0), 0.0).unwrap_err();
        assert!(matches!(err, LstError::InvalidParameter { .. }));
    }

    #[test]
    fn test_negative_and_nan_radius_rejected() {
        assert!(Region::circle(LatLon::new(0.0, 0.0), -5.0).is_err());
        assert!(Region::circle(LatLon::new(0.0, 0.0), f64::NAN).is_err());
    }

    #[test]
    fn test_circle_bounding_box_contains_center() {
        let center = LatLon::new(-22.91, -43.17);
        let region = Region::circle(center, 15.0).unwrap();
        let bbox = region.bounding_box();
        assert!(bbox.contains(center.lon, center.lat));
        // 15km is roughly 0.13 degrees of latitude
        assert!(bbox.height() > 0.25 && bbox.height() < 0.30);
    }

    #[test]
    fn test_bbox_center() {
        let bbox = BoundingBox::new(-46.82, -23.79, -46.36, -23.38);
        let c = bbox.center();
        assert!((c.lon - (-46.59)).abs() < 1e-9);
        assert!((c.lat - (-23.585)).abs() < 1e-9);
    }
}
