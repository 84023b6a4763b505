// Run configuration: the job inputs loaded from disk and the fetch tuning
// knobs with the provider's documented limits as defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::client::RetryPolicy;

// Job inputs, mirrored from the config file. Validated upstream; the
// pipeline treats these as trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub client_id: String,
    pub location: String,
    pub properties_count: u32,
    pub output_file: PathBuf,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    // Provider caps: results per page and listings reachable by offset
    // within one price band.
    pub search_page_size: u32,
    pub search_offset_ceiling: u32,
    // Width of each price-per-adult band used to re-partition the corpus
    // once the offset ceiling is reached.
    pub band_width: u32,
    // Consecutive bands with zero new uniques tolerated before giving up on
    // an exhausted corpus.
    pub max_empty_bands: u32,
    pub search_throttle: Duration,
    pub calendar_stagger: Duration,
    pub max_concurrent_calendars: usize,
    pub search_retry: RetryPolicy,
    pub calendar_retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let search_throttle = Duration::from_secs(30);
        let calendar_stagger = Duration::from_millis(300);
        Self {
            search_page_size: 50,
            search_offset_ceiling: 1000,
            band_width: 100,
            max_empty_bands: 10,
            search_throttle,
            calendar_stagger,
            max_concurrent_calendars: 8,
            search_retry: RetryPolicy::fixed(search_throttle),
            calendar_retry: RetryPolicy::fixed(calendar_stagger),
        }
    }
}
