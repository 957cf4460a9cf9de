//! Common types shared across the urban-lst services.

pub mod city;
pub mod error;
pub mod geo;
pub mod time;

pub use city::{City, CityRegistry};
pub use error::{LstError, LstResult};
pub use geo::{BoundingBox, LatLon, Region};
pub use time::DateRange;
