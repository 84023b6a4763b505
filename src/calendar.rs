// Staggered calendar fetch: one request per listing, start times spaced by a
// fixed interval as a crude rate limiter, concurrency capped by a semaphore.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

use crate::client::{execute_with_retry, CalendarSummary, ListingApi};
use crate::config::FetchConfig;
use crate::fetcher::{FetchError, FetchEvent};

pub struct CalendarFetcher {
    api: Arc<dyn ListingApi>,
    config: FetchConfig,
    progress: Option<UnboundedSender<FetchEvent>>,
}

impl CalendarFetcher {
    pub fn new(api: Arc<dyn ListingApi>, config: FetchConfig) -> Self {
        Self {
            api,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, sender: UnboundedSender<FetchEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    // Fetch a calendar summary for every listing id. Listing `i` starts no
    // earlier than `stagger * (i + 1)` after the call; results come back at
    // the same index as their input id regardless of completion order.
    pub async fn fetch_all(&self, listing_ids: &[u64]) -> Result<Vec<CalendarSummary>, FetchError> {
        let total = listing_ids.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_calendars));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(total);
        for (i, &listing_id) in listing_ids.iter().enumerate() {
            let api = Arc::clone(&self.api);
            let semaphore = Arc::clone(&semaphore);
            let completed = Arc::clone(&completed);
            let retry = self.config.calendar_retry.clone();
            let stagger = self.config.calendar_stagger;
            let progress = self.progress.clone();

            handles.push(tokio::spawn(async move {
                tokio::time::sleep(stagger * (i as u32 + 1)).await;
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| FetchError::TaskFailed("semaphore closed".to_string()))?;

                let page = execute_with_retry(&retry, || {
                    let api = Arc::clone(&api);
                    async move { api.calendar_days(listing_id).await }
                })
                .await?;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::info!(listing_id, done, total, "calendar fetched");
                if let Some(sender) = &progress {
                    let _ = sender.send(FetchEvent::CalendarFetched {
                        completed: done,
                        total,
                    });
                }
                Ok::<CalendarSummary, FetchError>(page.summarize())
            }));
        }

        let mut summaries = Vec::with_capacity(total);
        for joined in join_all(handles).await {
            let summary = joined.map_err(|e| FetchError::TaskFailed(e.to_string()))??;
            summaries.push(summary);
        }
        Ok(summaries)
    }
}
