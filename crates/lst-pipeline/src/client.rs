//! HTTP client for the imagery service.
//!
//! Speaks a small JSON protocol against a configured endpoint. The
//! client is acquired once at process start via
//! [`HttpImageryService::connect`], which performs a health handshake so
//! startup failures are reported explicitly instead of surfacing as the
//! first query's error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use lst_common::{DateRange, Region};

use crate::imagery::{
    AggregateMethod, BandTransform, GranuleFilter, ImageryError, ImageryResult, ImageryService,
    RawGranule, Reducer, RegionSample, ResolvedBand, ResolvedImage,
};

/// Configuration for the imagery-service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageryClientConfig {
    /// Base URL of the imagery service, without trailing slash.
    pub base_url: String,
    /// Project identifier forwarded with every request.
    pub project: Option<String>,
    /// Bearer token, when the endpoint requires one.
    pub api_token: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ImageryClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8089".to_string(),
            project: None,
            api_token: None,
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

/// JSON-over-HTTP implementation of [`ImageryService`].
pub struct HttpImageryService {
    client: Client,
    config: ImageryClientConfig,
}

impl HttpImageryService {
    /// Build the client and verify the service is reachable.
    pub async fn connect(config: ImageryClientConfig) -> ImageryResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(project) = &config.project {
            let value = header::HeaderValue::from_str(project)
                .map_err(|e| ImageryError::Protocol(format!("invalid project id: {}", e)))?;
            headers.insert("x-imagery-project", value);
        }
        if let Some(token) = &config.api_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ImageryError::Protocol(format!("invalid api token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ImageryError::Transport(e.to_string()))?;

        let service = Self { client, config };
        service.health_check().await?;
        info!(base_url = %service.config.base_url, "imagery service client ready");
        Ok(service)
    }

    async fn health_check(&self) -> ImageryResult<()> {
        let url = self.url("/v1/health");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(backend_error(response.status(), "health check failed".to_string()));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ImageryResult<R> {
        let url = self.url(path);
        debug!(url = %url, "imagery request");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(backend_error(status, message));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ImageryError::Protocol(e.to_string()))
    }
}

fn backend_error(status: StatusCode, message: String) -> ImageryError {
    ImageryError::Backend {
        status: status.as_u16(),
        message,
    }
}

// Wire records for the JSON protocol.

#[derive(Serialize)]
struct SearchRequest<'a> {
    collection: &'a str,
    region: &'a Region,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filters: &'a [GranuleFilter],
}

#[derive(Deserialize)]
struct SearchResponse {
    granules: Vec<RawGranule>,
}

#[derive(Serialize)]
struct TransformRequest<'a> {
    granule: &'a str,
    transform: &'a BandTransform,
}

#[derive(Deserialize)]
struct TransformResponse {
    band: ResolvedBand,
}

#[derive(Serialize)]
struct AggregateRequest<'a> {
    bands: Vec<&'a str>,
    band_name: &'a str,
    method: AggregateMethod,
}

#[derive(Deserialize)]
struct ImageResponse {
    image: ResolvedImage,
}

#[derive(Serialize)]
struct ReduceRequest<'a> {
    image: &'a str,
    region: &'a Region,
    reducers: &'a [Reducer],
    scale_m: f64,
}

#[derive(Deserialize)]
struct ReduceResponse {
    values: HashMap<String, Option<f64>>,
}

#[derive(Serialize)]
struct SampleRequest<'a> {
    image: &'a str,
    region: &'a Region,
    scale_m: f64,
    num_points: u32,
}

#[derive(Deserialize)]
struct SampleResponse {
    samples: Vec<RegionSample>,
}

#[derive(Serialize)]
struct MaskRequest<'a> {
    image: &'a str,
    greater_than: f64,
}

#[async_trait]
impl ImageryService for HttpImageryService {
    #[instrument(skip_all, fields(collection = collection))]
    async fn list_granules(
        &self,
        collection: &str,
        region: &Region,
        range: &DateRange,
        filters: &[GranuleFilter],
    ) -> ImageryResult<Vec<RawGranule>> {
        let request = SearchRequest {
            collection,
            region,
            start: range.start,
            end: range.end,
            filters,
        };
        let response: SearchResponse = self.post("/v1/granules/search", &request).await?;
        debug!(count = response.granules.len(), "listed granules");
        Ok(response.granules)
    }

    async fn apply_transform(
        &self,
        granule: &RawGranule,
        transform: &BandTransform,
    ) -> ImageryResult<ResolvedBand> {
        let request = TransformRequest {
            granule: &granule.id,
            transform,
        };
        let response: TransformResponse = self.post("/v1/granules/transform", &request).await?;
        Ok(response.band)
    }

    async fn aggregate(
        &self,
        bands: Vec<ResolvedBand>,
        band_name: &str,
        method: AggregateMethod,
    ) -> ImageryResult<ResolvedImage> {
        let request = AggregateRequest {
            bands: bands.iter().map(|b| b.handle.as_str()).collect(),
            band_name,
            method,
        };
        let response: ImageResponse = self.post("/v1/bands/aggregate", &request).await?;
        Ok(response.image)
    }

    async fn reduce_region(
        &self,
        image: &ResolvedImage,
        region: &Region,
        reducers: &[Reducer],
        scale_m: f64,
    ) -> ImageryResult<HashMap<String, Option<f64>>> {
        let request = ReduceRequest {
            image: &image.handle,
            region,
            reducers,
            scale_m,
        };
        let response: ReduceResponse = self.post("/v1/images/reduce", &request).await?;
        Ok(response.values)
    }

    async fn sample_region(
        &self,
        image: &ResolvedImage,
        region: &Region,
        scale_m: f64,
        num_points: u32,
    ) -> ImageryResult<Vec<RegionSample>> {
        let request = SampleRequest {
            image: &image.handle,
            region,
            scale_m,
            num_points,
        };
        let response: SampleResponse = self.post("/v1/images/sample", &request).await?;
        Ok(response.samples)
    }

    async fn mask_greater_than(
        &self,
        image: &ResolvedImage,
        threshold: f64,
    ) -> ImageryResult<ResolvedImage> {
        let request = MaskRequest {
            image: &image.handle,
            greater_than: threshold,
        };
        let response: ImageResponse = self.post("/v1/images/mask", &request).await?;
        Ok(response.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ImageryClientConfig {
            base_url: "http://imagery.local/".to_string(),
            ..Default::default()
        };
        let client = Client::new();
        let service = HttpImageryService { client, config };
        assert_eq!(service.url("/v1/health"), "http://imagery.local/v1/health");
    }
}
