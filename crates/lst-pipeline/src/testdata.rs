//! Scripted imagery-service double for tests.
//!
//! Responses are queued per operation and popped in call order, so a
//! test scripts exactly one pipeline run and can assert on call counts
//! afterwards (e.g. the window expander's short-circuit property).
//! Popping an empty queue panics: that is a scripting bug in the test,
//! not a runtime condition.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use lst_common::{DateRange, LatLon, Region};

use crate::imagery::{
    AggregateMethod, BandTransform, GranuleFilter, ImageryError, ImageryResult, ImageryService,
    RawGranule, Reducer, RegionSample, ResolvedBand, ResolvedImage,
};

/// Build a reduction result from `(key, value)` pairs.
pub fn stats_map(entries: &[(&str, Option<f64>)]) -> HashMap<String, Option<f64>> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

#[derive(Default)]
struct Counters {
    list: AtomicUsize,
    transform: AtomicUsize,
    aggregate: AtomicUsize,
    reduce: AtomicUsize,
    sample: AtomicUsize,
    mask: AtomicUsize,
}

/// Imagery-service double with queued responses and call counters.
#[derive(Default)]
pub struct ScriptedImagery {
    granules: Mutex<VecDeque<ImageryResult<Vec<RawGranule>>>>,
    reductions: Mutex<VecDeque<HashMap<String, Option<f64>>>>,
    samples: Mutex<VecDeque<Vec<RegionSample>>>,
    masked_thresholds: Mutex<Vec<f64>>,
    counters: Counters,
}

impl ScriptedImagery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `list_granules` call.
    pub fn with_granules(self, response: ImageryResult<Vec<RawGranule>>) -> Self {
        self.granules.lock().unwrap().push_back(response);
        self
    }

    /// Queue a response for the next `reduce_region` call.
    pub fn with_reduce(self, values: HashMap<String, Option<f64>>) -> Self {
        self.reductions.lock().unwrap().push_back(values);
        self
    }

    /// Queue a response for the next `sample_region` call.
    pub fn with_samples(self, samples: Vec<RegionSample>) -> Self {
        self.samples.lock().unwrap().push_back(samples);
        self
    }

    /// A granule fixture with a fixed acquisition date.
    pub fn granule(id: &str) -> RawGranule {
        RawGranule {
            id: id.to_string(),
            acquired: Utc.with_ymd_and_hms(2025, 5, 1, 13, 30, 0).unwrap(),
            cloud_cover: Some(5.0),
        }
    }

    /// A sample fixture.
    pub fn sample(lat: f64, lon: f64, value: Option<f64>) -> RegionSample {
        RegionSample {
            location: LatLon::new(lat, lon),
            value,
        }
    }

    pub fn list_calls(&self) -> usize {
        self.counters.list.load(Ordering::SeqCst)
    }

    pub fn transform_calls(&self) -> usize {
        self.counters.transform.load(Ordering::SeqCst)
    }

    pub fn aggregate_calls(&self) -> usize {
        self.counters.aggregate.load(Ordering::SeqCst)
    }

    pub fn reduce_calls(&self) -> usize {
        self.counters.reduce.load(Ordering::SeqCst)
    }

    pub fn sample_calls(&self) -> usize {
        self.counters.sample.load(Ordering::SeqCst)
    }

    pub fn mask_calls(&self) -> usize {
        self.counters.mask.load(Ordering::SeqCst)
    }

    /// Thresholds passed to `mask_greater_than`, in call order.
    pub fn masked_thresholds(&self) -> Vec<f64> {
        self.masked_thresholds.lock().unwrap().clone()
    }

    /// Convenience: a transport failure for scripting failed attempts.
    pub fn transport_error(msg: &str) -> ImageryError {
        ImageryError::Transport(msg.to_string())
    }
}

#[async_trait]
impl ImageryService for ScriptedImagery {
    async fn list_granules(
        &self,
        _collection: &str,
        _region: &Region,
        _range: &DateRange,
        _filters: &[GranuleFilter],
    ) -> ImageryResult<Vec<RawGranule>> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        self.granules
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted granule response left")
    }

    async fn apply_transform(
        &self,
        granule: &RawGranule,
        _transform: &BandTransform,
    ) -> ImageryResult<ResolvedBand> {
        let n = self.counters.transform.fetch_add(1, Ordering::SeqCst);
        Ok(ResolvedBand {
            handle: format!("band-{}-{}", granule.id, n),
        })
    }

    async fn aggregate(
        &self,
        _bands: Vec<ResolvedBand>,
        band_name: &str,
        _method: AggregateMethod,
    ) -> ImageryResult<ResolvedImage> {
        let n = self.counters.aggregate.fetch_add(1, Ordering::SeqCst);
        Ok(ResolvedImage {
            handle: format!("image-{}", n),
            band: band_name.to_string(),
        })
    }

    async fn reduce_region(
        &self,
        _image: &ResolvedImage,
        _region: &Region,
        _reducers: &[Reducer],
        _scale_m: f64,
    ) -> ImageryResult<HashMap<String, Option<f64>>> {
        self.counters.reduce.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .reductions
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reduction left"))
    }

    async fn sample_region(
        &self,
        _image: &ResolvedImage,
        _region: &Region,
        _scale_m: f64,
        _num_points: u32,
    ) -> ImageryResult<Vec<RegionSample>> {
        self.counters.sample.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .samples
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted sample set left"))
    }

    async fn mask_greater_than(
        &self,
        image: &ResolvedImage,
        threshold: f64,
    ) -> ImageryResult<ResolvedImage> {
        let n = self.counters.mask.fetch_add(1, Ordering::SeqCst);
        self.masked_thresholds.lock().unwrap().push(threshold);
        Ok(ResolvedImage {
            handle: format!("{}-masked-{}", image.handle, n),
            band: image.band.clone(),
        })
    }
}
