// Listing API client: transport, wire models, and the retry policy that wraps
// every call the pipeline makes.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::query::{encode_query, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "https://api.airbnb.com/v2";

const SEARCH_ENDPOINT: &str = "search_results";
const CALENDAR_ENDPOINT: &str = "calendar_days";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("api returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
}

// Retry configuration. Defaults are a constant wait with no attempt cap, so
// a broken endpoint stalls the batch instead of failing it partway through.
// Callers with an SLA set max_attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_wait: Duration,
    pub max_wait: Duration,
    pub max_attempts: Option<u32>,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
            max_attempts: None,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    // Constant-interval policy, the shape both throttled endpoints use.
    pub fn fixed(base_wait: Duration) -> Self {
        Self {
            base_wait,
            max_wait: base_wait,
            ..Default::default()
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = (self.base_wait.as_millis() as f64
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32))
        .min(self.max_wait.as_millis() as f64);
        let jitter = rand::random::<f64>() * self.jitter_factor * base;
        Duration::from_millis((base + jitter) as u64)
    }
}

// Run `operation` until it succeeds, sleeping between attempts per the
// policy. With max_attempts = None this loops forever, which is the
// documented tradeoff for an offline batch job.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if let Some(max) = policy.max_attempts {
                    if attempt >= max {
                        return Err(ApiError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                }
                let wait = policy.delay_for(attempt);
                tracing::warn!(attempt, wait_ms = wait.as_millis() as u64, error = %err, "request failed, retrying");
                tokio::time::sleep(wait).await;
            }
        }
    }
}

// Wire models. Field names match the provider's JSON payloads.

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub search_results: Vec<Property>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    pub listing: Listing,
    pub pricing_quote: PricingQuote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub star_rating: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingQuote {
    pub nightly_price: f64,
    pub guest_details: GuestDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuestDetails {
    pub number_of_adults: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarPage {
    pub calendar_days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDay {
    // Days without an availability flag count toward the total only.
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarSummary {
    pub available_days: u32,
    pub total_days: u32,
}

impl CalendarPage {
    pub fn summarize(&self) -> CalendarSummary {
        CalendarSummary {
            available_days: self.calendar_days.iter().filter(|d| d.available).count() as u32,
            total_days: self.calendar_days.len() as u32,
        }
    }
}

// The seam between the fetch pipeline and the network. Tests swap in a mock.
#[async_trait]
pub trait ListingApi: Send + Sync + 'static {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError>;

    async fn calendar_days(&self, listing_id: u64) -> Result<CalendarPage, ApiError>;
}

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl HttpApi {
    pub fn new(base_url: &str, client_id: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
        })
    }

    async fn execute<T>(
        &self,
        endpoint: &str,
        wire_query: &BTreeMap<String, Value>,
    ) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut params: Vec<(String, String)> =
            vec![("client_id".to_string(), self.client_id.clone())];
        for (key, value) in wire_query {
            params.push((key.clone(), param_value(value)));
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ListingApi for HttpApi {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        let wire = encode_query(&query.to_fields());
        self.execute(SEARCH_ENDPOINT, &wire).await
    }

    async fn calendar_days(&self, listing_id: u64) -> Result<CalendarPage, ApiError> {
        let mut fields = BTreeMap::new();
        fields.insert("listingId".to_string(), Value::from(listing_id));
        let wire = encode_query(&fields);
        self.execute(CALENDAR_ENDPOINT, &wire).await
    }
}
