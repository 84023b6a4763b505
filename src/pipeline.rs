// Pipeline: search -> calendar enrichment -> scoring -> one JSON write.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::calendar::CalendarFetcher;
use crate::client::ListingApi;
use crate::config::FetchConfig;
use crate::fetcher::{FetchError, FetchEvent, SearchFetcher};
use crate::query::SearchQuery;
use crate::score::{score_listings, DegeneratePolicy, EnrichedListing, ScoredListing};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write output file: {0}")]
    Write(#[from] std::io::Error),
}

pub struct Pipeline {
    api: Arc<dyn ListingApi>,
    config: FetchConfig,
    policy: DegeneratePolicy,
    progress: Option<UnboundedSender<FetchEvent>>,
}

impl Pipeline {
    pub fn new(api: Arc<dyn ListingApi>, config: FetchConfig) -> Self {
        Self {
            api,
            config,
            policy: DegeneratePolicy::default(),
            progress: None,
        }
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, sender: UnboundedSender<FetchEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    // Run the whole batch for one location and return the scored map,
    // keyed by listing id.
    pub async fn run(
        &self,
        location: &str,
        amount: u32,
    ) -> Result<BTreeMap<u64, ScoredListing>, PipelineError> {
        let base = SearchQuery::for_location(location);

        let mut search = SearchFetcher::new(Arc::clone(&self.api), self.config.clone());
        let mut calendars = CalendarFetcher::new(Arc::clone(&self.api), self.config.clone());
        if let Some(sender) = &self.progress {
            search = search.with_progress(sender.clone());
            calendars = calendars.with_progress(sender.clone());
        }

        let properties = search.fetch(&base, amount).await?;
        tracing::info!(count = properties.len(), "search phase complete");

        let ids: Vec<u64> = properties.iter().map(|p| p.listing.id).collect();
        let summaries = calendars.fetch_all(&ids).await?;

        // Summaries are index-stable with the listing order, so a plain zip
        // attaches each calendar to its own listing.
        let enriched: Vec<EnrichedListing> = properties
            .into_iter()
            .zip(summaries)
            .map(|(property, calendar)| EnrichedListing { property, calendar })
            .collect();

        let scored = score_listings(&enriched, self.policy);
        Ok(scored.into_iter().collect())
    }
}

// Single terminal write of the scored map. Failure here is a hard error for
// the process; there is nothing to retry against a full or missing disk.
pub fn write_output(
    path: impl AsRef<Path>,
    scores: &BTreeMap<u64, ScoredListing>,
) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(scores)?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}
