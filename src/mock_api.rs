// In-crate mock of the listing API for tests: scripted search pages,
// per-listing calendars, injectable failures, and a recorded request
// timeline for asserting pagination and stagger behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{
    ApiError, CalendarPage, GuestDetails, Listing, ListingApi, PricingQuote, Property, SearchPage,
};
use crate::query::SearchQuery;

// Builds a plausible property record; coordinates are derived from the id so
// assertions can tell listings apart.
pub fn property(
    id: u64,
    nightly_price: f64,
    number_of_adults: u32,
    reviews_count: u32,
    star_rating: f64,
) -> Property {
    Property {
        listing: Listing {
            id,
            lat: 52.0 + id as f64 * 0.001,
            lng: 13.0 - id as f64 * 0.001,
            reviews_count,
            star_rating,
        },
        pricing_quote: PricingQuote {
            nightly_price,
            guest_details: GuestDetails { number_of_adults },
        },
    }
}

#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub limit: u32,
    pub offset: u32,
    pub price_min: u32,
    pub price_max: u32,
    pub at: Instant,
}

#[derive(Debug, Clone)]
pub struct RecordedCalendar {
    pub listing_id: u64,
    pub at: Instant,
}

#[derive(Default)]
pub struct MockApi {
    search_script: Mutex<VecDeque<Vec<Property>>>,
    calendars: Mutex<HashMap<u64, CalendarPage>>,
    calendar_delays: Mutex<HashMap<u64, Duration>>,
    fail_next: AtomicUsize,
    search_log: Mutex<Vec<RecordedSearch>>,
    calendar_log: Mutex<Vec<RecordedCalendar>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    // Queue the raw page the next search request receives. Once the script
    // runs out, further searches return empty pages.
    pub fn push_search_page(&self, page: Vec<Property>) {
        self.search_script.lock().push_back(page);
    }

    pub fn set_calendar(&self, listing_id: u64, page: CalendarPage) {
        self.calendars.lock().insert(listing_id, page);
    }

    pub fn set_calendar_delay(&self, listing_id: u64, delay: Duration) {
        self.calendar_delays.lock().insert(listing_id, delay);
    }

    // The next `count` requests (search or calendar) fail with a 500.
    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn search_requests(&self) -> Vec<RecordedSearch> {
        self.search_log.lock().clone()
    }

    pub fn calendar_requests(&self) -> Vec<RecordedCalendar> {
        self.calendar_log.lock().clone()
    }

    fn should_fail(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ListingApi for MockApi {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, ApiError> {
        self.search_log.lock().push(RecordedSearch {
            limit: query.limit,
            offset: query.offset,
            price_min: query.price_min,
            price_max: query.price_max,
            at: Instant::now(),
        });

        if self.should_fail() {
            return Err(ApiError::Status {
                status: 500,
                body: "injected failure".to_string(),
            });
        }

        let page = self.search_script.lock().pop_front().unwrap_or_default();
        Ok(SearchPage {
            search_results: page,
        })
    }

    async fn calendar_days(&self, listing_id: u64) -> Result<CalendarPage, ApiError> {
        self.calendar_log.lock().push(RecordedCalendar {
            listing_id,
            at: Instant::now(),
        });

        if self.should_fail() {
            return Err(ApiError::Status {
                status: 500,
                body: "injected failure".to_string(),
            });
        }

        let delay = self.calendar_delays.lock().get(&listing_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let page = self.calendars.lock().get(&listing_id).cloned();
        Ok(page.unwrap_or(CalendarPage {
            calendar_days: Vec::new(),
        }))
    }
}
