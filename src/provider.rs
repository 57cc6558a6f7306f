use crate::types::{ProviderConfig, RanklensError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Boundary for issuing one search per (keyword, location) pair.
///
/// The pipeline and tests depend only on this trait; `SerpClient` is the
/// production implementation.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, keyword: &str, location: &str) -> Result<Value>;

    /// Run keywords sequentially, capturing per-keyword failures inline as
    /// `{"error": message}` payloads instead of aborting the batch.
    /// Sequential on purpose: the backend owns a single rate-limit timer.
    async fn batch_search(&self, keywords: &[String], location: &str) -> Vec<(String, Value)> {
        let total = keywords.len();
        info!("Starting batch search for {} queries", total);

        let mut results = Vec::with_capacity(total);
        for (i, keyword) in keywords.iter().enumerate() {
            debug!("Processing query {}/{}: {}", i + 1, total, keyword);
            match self.search(keyword, location).await {
                Ok(payload) => results.push((keyword.clone(), payload)),
                Err(e) => {
                    error!("Failed to search for '{}': {}", keyword, e);
                    results.push((keyword.clone(), serde_json::json!({ "error": e.to_string() })));
                }
            }
        }

        let successful = results
            .iter()
            .filter(|(_, payload)| payload.get("error").is_none())
            .count();
        info!("Batch search completed: {}/{} successful", successful, total);
        results
    }
}

/// Extra query knobs for a single search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub num_results: u32,
    pub start: u32,
    /// Result-surface selector, e.g. `lcl` for the local pack.
    pub tbm: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            num_results: 10,
            start: 0,
            tbm: None,
        }
    }
}

/// SERP-data API client with process-wide rate limiting and retry.
pub struct SerpClient {
    client: Client,
    api_key: String,
    config: ProviderConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl SerpClient {
    pub fn new(api_key: String, config: ProviderConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            config,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// One query against the provider with retry on rate-limit and
    /// server-error classes. Non-retryable failures fail immediately.
    pub async fn search(&self, query: &str, location: &str, options: &SearchOptions) -> Result<Value> {
        let mut params: Vec<(String, String)> = vec![
            ("api_key".to_string(), self.api_key.clone()),
            ("engine".to_string(), "google".to_string()),
            ("q".to_string(), query.to_string()),
            ("location".to_string(), location.to_string()),
            ("google_domain".to_string(), "google.com".to_string()),
            ("gl".to_string(), "us".to_string()),
            ("hl".to_string(), "en".to_string()),
            ("num".to_string(), options.num_results.to_string()),
            ("start".to_string(), options.start.to_string()),
        ];
        if let Some(tbm) = &options.tbm {
            params.push(("tbm".to_string(), tbm.clone()));
        }

        info!("Searching for '{}' in '{}'", query, location);
        let payload = self.request_with_retry(&self.config.base_url, &params).await?;

        // The provider reports its own failures inside an otherwise-OK body.
        if let Some(message) = payload.get("error").and_then(Value::as_str) {
            error!("Provider error for '{}': {}", query, message);
            return Err(RanklensError::Provider(format!("provider error: {}", message)));
        }

        info!("Successfully retrieved search results for '{}'", query);
        Ok(payload)
    }

    /// Local-pack optimized search (more results, local surface).
    pub async fn search_local(&self, query: &str, location: &str) -> Result<Value> {
        self.search(
            query,
            location,
            &SearchOptions {
                num_results: 20,
                tbm: Some("lcl".to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Maps-engine search.
    pub async fn search_maps(&self, query: &str, location: &str) -> Result<Value> {
        let params: Vec<(String, String)> = vec![
            ("api_key".to_string(), self.api_key.clone()),
            ("engine".to_string(), "google_maps".to_string()),
            ("q".to_string(), query.to_string()),
            ("location".to_string(), location.to_string()),
            ("type".to_string(), "search".to_string()),
        ];

        info!("Maps search for '{}' in '{}'", query, location);
        let payload = self.request_with_retry(&self.config.base_url, &params).await?;

        if let Some(message) = payload.get("error").and_then(Value::as_str) {
            error!("Provider maps error for '{}': {}", query, message);
            return Err(RanklensError::Provider(format!("provider error: {}", message)));
        }

        info!("Successfully retrieved maps results for '{}'", query);
        Ok(payload)
    }

    /// Probe the key with a one-result query before issuing a real batch.
    pub async fn validate_api_key(&self) -> bool {
        let params: Vec<(String, String)> = vec![
            ("api_key".to_string(), self.api_key.clone()),
            ("engine".to_string(), "google".to_string()),
            ("q".to_string(), "test".to_string()),
            ("location".to_string(), "United States".to_string()),
            ("num".to_string(), "1".to_string()),
        ];

        match self.request_with_retry(&self.config.base_url, &params).await {
            Ok(payload) => {
                if let Some(message) = payload.get("error").and_then(Value::as_str) {
                    error!("API key validation failed: {}", message);
                    false
                } else {
                    info!("API key validation successful");
                    true
                }
            }
            Err(e) => {
                error!("API key validation error: {}", e);
                false
            }
        }
    }

    /// Account metadata from the provider, errors reported inline.
    pub async fn account_info(&self) -> Value {
        let url = "https://serpapi.com/account";
        let params: Vec<(String, String)> = vec![("api_key".to_string(), self.api_key.clone())];

        match self.request_with_retry(url, &params).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to get account info: {}", e);
                serde_json::json!({ "error": e.to_string() })
            }
        }
    }

    async fn request_with_retry(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
        self.enforce_rate_limit().await;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| RanklensError::Provider(format!("failed to parse JSON response: {}", e)));
                    }

                    if !is_retryable(status) {
                        return Err(RanklensError::Provider(format!(
                            "HTTP {}: {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown")
                        )));
                    }

                    last_error = Some(RanklensError::Provider(format!(
                        "HTTP {}: {}",
                        status,
                        status.canonical_reason().unwrap_or("Unknown")
                    )));
                }
                Err(e) => {
                    last_error = Some(RanklensError::Http(e));
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
        }

        error!("Request failed after {} attempts: {}", self.config.max_retries + 1, url);
        Err(last_error.unwrap_or_else(|| RanklensError::Provider("unknown error".to_string())))
    }

    /// Enforce the minimum inter-request interval, then timestamp before
    /// dispatch. The lock is held across the sleep so the timer stays
    /// coherent even if callers ever overlap.
    async fn enforce_rate_limit(&self) {
        let min_interval = Duration::from_millis(self.config.rate_limit_delay_ms);
        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                let wait = min_interval - elapsed;
                debug!("Rate limiting: sleeping for {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last_request = Some(Instant::now());
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl SearchBackend for SerpClient {
    async fn search(&self, keyword: &str, location: &str) -> Result<Value> {
        SerpClient::search(self, keyword, location, &SearchOptions::default()).await
    }
}
