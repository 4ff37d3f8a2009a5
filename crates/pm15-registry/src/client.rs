//! HTTP client for the Gamma events API.
//!
//! Implements `EventProvider` with two GET endpoints:
//! - `/events?tag_slug=15M&active=true&closed=false&limit=N` for discovery
//! - `/events?slug=...` for a single event with its markets

use crate::error::{RegistryError, RegistryResult};
use crate::provider::EventProvider;
use crate::records::{EventRecord, OneOrMany};
use async_trait::async_trait;
use pm15_telemetry::Metrics;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default page size for event discovery.
pub const DEFAULT_EVENT_LIMIT: u32 = 100;

const USER_AGENT: &str = concat!("pm15-bot/", env!("CARGO_PKG_VERSION"));

/// Client for the Gamma events API.
pub struct GammaClient {
    /// HTTP client.
    client: Client,
    /// API base URL, without trailing slash.
    base_url: String,
    /// Tag slug marking short-window events.
    tag_slug: String,
    /// Discovery page size.
    event_limit: u32,
}

impl GammaClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://gamma-api.polymarket.com")
    /// * `tag_slug` - Tag for 15-minute events (e.g., "15M")
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        tag_slug: impl Into<String>,
        timeout: Duration,
    ) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tag_slug: tag_slug.into(),
            event_limit: DEFAULT_EVENT_LIMIT,
        })
    }

    /// Override the discovery page size.
    #[must_use]
    pub fn with_event_limit(mut self, event_limit: u32) -> Self {
        self.event_limit = event_limit;
        self
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    fn discovery_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tag_slug", self.tag_slug.clone()),
            ("active", "true".to_string()),
            ("closed", "false".to_string()),
            ("limit", self.event_limit.to_string()),
        ]
    }

    /// GET a JSON body, mapping non-2xx responses to `RegistryError::Status`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &[(&str, String)],
    ) -> RegistryResult<T> {
        let started = Instant::now();
        let result = self.send(query).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        Metrics::provider_request(
            operation,
            if result.is_ok() { "ok" } else { "error" },
            latency_ms,
        );
        result
    }

    async fn send<T: DeserializeOwned>(&self, query: &[(&str, String)]) -> RegistryResult<T> {
        let response = self
            .client
            .get(self.events_url())
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::Decode(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl EventProvider for GammaClient {
    async fn list_short_window_events(&self) -> RegistryResult<Vec<EventRecord>> {
        debug!(tag = %self.tag_slug, "Fetching short-window events");

        let body: OneOrMany<EventRecord> = self
            .get_json("list_events", &self.discovery_query())
            .await?;
        let events: Vec<EventRecord> = body.into();

        info!(count = events.len(), "Fetched short-window events");
        Ok(events)
    }

    async fn get_event_by_slug(&self, slug: &str) -> RegistryResult<Vec<EventRecord>> {
        debug!(%slug, "Fetching event by slug");

        let body: OneOrMany<EventRecord> = self
            .get_json("get_event", &[("slug", slug.to_string())])
            .await?;

        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            GammaClient::new("https://gamma-api.polymarket.com/", "15M", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.events_url(), "https://gamma-api.polymarket.com/events");
    }

    #[test]
    fn test_discovery_query() {
        let client = GammaClient::new("http://localhost", "15M", DEFAULT_TIMEOUT)
            .unwrap()
            .with_event_limit(20);
        let query = client.discovery_query();

        assert!(query.contains(&("tag_slug", "15M".to_string())));
        assert!(query.contains(&("active", "true".to_string())));
        assert!(query.contains(&("closed", "false".to_string())));
        assert!(query.contains(&("limit", "20".to_string())));
    }
}
