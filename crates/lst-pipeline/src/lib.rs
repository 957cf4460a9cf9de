//! Land-surface-temperature retrieval and normalization pipeline.
//!
//! Resolves satellite LST observations for a circular region around a
//! city and reduces them into three products:
//! - summary statistics (min/max/mean/stdDev in Celsius),
//! - a bounded, display-normalized point set for heatmap rendering,
//! - above-threshold "hotspot" points for tree-planting prioritization.
//!
//! All pixel work (filtering, aggregation, reduction, sampling) runs on
//! a remote imagery service reached through the [`imagery::ImageryService`]
//! trait; this crate owns source selection, adaptive temporal window
//! expansion, and the normalization policy.

pub mod client;
pub mod config;
pub mod hotspots;
pub mod imagery;
pub mod resolve;
pub mod sample;
pub mod service;
pub mod source;
pub mod stats;
pub mod testdata;

pub use client::{HttpImageryService, ImageryClientConfig};
pub use config::PipelineConfig;
pub use hotspots::PlantingPoint;
pub use imagery::{ImageryError, ImageryResult, ImageryService};
pub use resolve::{ResolvedWindow, WindowExpander};
pub use sample::HeatmapPoint;
pub use service::{HeatmapReport, LstService, Period, PlantingReport, StatisticsReport};
pub use source::{LstSource, SourceSpec};
pub use stats::Statistics;
