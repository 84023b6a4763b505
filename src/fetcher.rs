// Paginated search: accumulate a target number of unique listings, walking
// offsets within a price band and advancing the band whenever the current
// one stops yielding new results.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::client::{execute_with_retry, ApiError, ListingApi, Property};
use crate::config::FetchConfig;
use crate::query::SearchQuery;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("calendar task failed: {0}")]
    TaskFailed(String),
}

// Progress events for callers that want to observe a run; the fetchers also
// log the same milestones through tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    SearchPage {
        unique_total: usize,
        new_this_page: u32,
        requested: u32,
    },
    BandAdvanced {
        price_min: u32,
        price_max: u32,
    },
    CalendarFetched {
        completed: usize,
        total: usize,
    },
}

// Half-open price-per-adult window. Advances monotonically; a band is never
// revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub min: u32,
    pub max: u32,
}

impl PriceBand {
    pub fn initial(width: u32) -> Self {
        Self { min: 0, max: width }
    }

    pub fn next(self, width: u32) -> Self {
        Self {
            min: self.max + 1,
            max: self.max + width + 1,
        }
    }
}

// Append listings not yet seen, keyed by listing id. Insertion order is
// discovery order; duplicates arriving from later pages or bands are
// dropped, so merging a page twice is a no-op.
pub fn merge_unique(
    accumulated: &mut Vec<Property>,
    seen: &mut HashSet<u64>,
    page: Vec<Property>,
) -> u32 {
    let before = accumulated.len();
    for property in page {
        if seen.insert(property.listing.id) {
            accumulated.push(property);
        }
    }
    (accumulated.len() - before) as u32
}

pub struct SearchFetcher {
    api: Arc<dyn ListingApi>,
    config: FetchConfig,
    progress: Option<UnboundedSender<FetchEvent>>,
}

impl SearchFetcher {
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

    fn emit(&self, event: FetchEvent) {
        if let Some(sender) = &self.progress {
            let _ = sender.send(event);
        }
    }

    // Harvest up to `amount` unique listings matching `base`. Returns fewer
    // only when `max_empty_bands` consecutive bands produce nothing new,
    // the signal that the corpus under this filter is exhausted.
    pub async fn fetch(&self, base: &SearchQuery, amount: u32) -> Result<Vec<Property>, FetchError> {
        let mut band = PriceBand::initial(self.config.band_width);
        let mut offset = 0u32;
        let mut remaining = amount;
        let mut seen = HashSet::new();
        let mut accumulated: Vec<Property> = Vec::with_capacity(amount as usize);
        let mut empty_bands = 0u32;

        while remaining > 0 {
            let limit = self
                .config
                .search_page_size
                .min(remaining)
                .min(self.config.search_offset_ceiling - offset);
            if limit == 0 {
                // Offset ceiling hit exactly; roll the band over without
                // issuing a zero-sized request.
                offset = 0;
                band = band.next(self.config.band_width);
                self.emit(FetchEvent::BandAdvanced {
                    price_min: band.min,
                    price_max: band.max,
                });
                continue;
            }

            let mut query = base.clone();
            query.limit = limit;
            query.offset = offset;
            query.price_min = band.min;
            query.price_max = band.max;

            let page = execute_with_retry(&self.config.search_retry, || {
                let api = Arc::clone(&self.api);
                let query = query.clone();
                async move { api.search(&query).await }
            })
            .await?;

            let received = merge_unique(&mut accumulated, &mut seen, page.search_results);
            tracing::info!(
                unique = accumulated.len(),
                target = amount,
                price_min = band.min,
                price_max = band.max,
                offset,
                "search page merged"
            );
            self.emit(FetchEvent::SearchPage {
                unique_total: accumulated.len(),
                new_this_page: received,
                requested: limit,
            });

            offset += limit;
            if received < limit || limit < self.config.search_page_size {
                // Either this band/offset ran dry or the request was already
                // capped below a full page; move to the next price window.
                if received == 0 {
                    empty_bands += 1;
                } else {
                    empty_bands = 0;
                }
                offset = 0;
                band = band.next(self.config.band_width);
                self.emit(FetchEvent::BandAdvanced {
                    price_min: band.min,
                    price_max: band.max,
                });
            } else {
                empty_bands = 0;
            }

            remaining = remaining.saturating_sub(received);
            if remaining == 0 {
                break;
            }
            if empty_bands >= self.config.max_empty_bands {
                tracing::warn!(
                    unique = accumulated.len(),
                    target = amount,
                    empty_bands,
                    "corpus exhausted before reaching target, stopping band advancement"
                );
                break;
            }
            tokio::time::sleep(self.config.search_throttle).await;
        }

        Ok(accumulated)
    }
}
