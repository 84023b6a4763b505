// Listing demand metric: harvest listings from a rate-limited search API,
// enrich them with calendar availability, and score relative demand.

pub mod calendar;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod pipeline;
pub mod query;
pub mod score;

#[cfg(test)]
pub(crate) mod mock_api;

// Re-export key types for convenience
pub use client::{ApiError, HttpApi, ListingApi, RetryPolicy, DEFAULT_BASE_URL};
pub use config::{AppConfig, FetchConfig};
pub use fetcher::{FetchError, FetchEvent, SearchFetcher};
pub use pipeline::{write_output, Pipeline, PipelineError};
pub use score::{DegeneratePolicy, ScoredListing};
