// Demand scoring: fold price, reviews, star rating, and availability into a
// single weight per listing, normalized against the batch maxima.

use serde::{Deserialize, Serialize};

use crate::client::{CalendarSummary, Property};

const RATE_WEIGHT: f64 = 0.4;
const AVAILABILITY_WEIGHT: f64 = 0.3;
const REVIEWS_WEIGHT: f64 = 0.2;
const PRICE_WEIGHT: f64 = 0.1;

// What to do with a listing whose normalization inputs are degenerate
// (`number_of_adults == 0` or an empty calendar) and would otherwise divide
// by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    // Drop the listing from the output with a warning.
    #[default]
    Exclude,
    // Keep the listing; undefined factors contribute zero.
    Clamp,
}

// A listing with its calendar attached, scoring input.
#[derive(Debug, Clone)]
pub struct EnrichedListing {
    pub property: Property,
    pub calendar: CalendarSummary,
}

impl EnrichedListing {
    fn price_per_adult(&self) -> Option<f64> {
        let adults = self.property.pricing_quote.guest_details.number_of_adults;
        if adults == 0 {
            return None;
        }
        Some(self.property.pricing_quote.nightly_price / adults as f64)
    }

    fn availability_factor(&self) -> Option<f64> {
        if self.calendar.total_days == 0 {
            return None;
        }
        Some(1.0 - self.calendar.available_days as f64 / self.calendar.total_days as f64)
    }

    fn is_degenerate(&self) -> bool {
        self.price_per_adult().is_none() || self.availability_factor().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredListing {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

// Normalize against a batch maximum; a zero maximum means the whole batch
// sits at zero, so the factor is zero rather than NaN.
fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

// Compute a weight for every listing in the batch. Returns (id, score)
// pairs in input order; degenerate listings are excluded or clamped per the
// policy.
pub fn score_listings(
    batch: &[EnrichedListing],
    policy: DegeneratePolicy,
) -> Vec<(u64, ScoredListing)> {
    let max_price = batch
        .iter()
        .filter_map(EnrichedListing::price_per_adult)
        .fold(0.0_f64, f64::max);
    let max_reviews = batch
        .iter()
        .map(|l| l.property.listing.reviews_count)
        .max()
        .unwrap_or(0) as f64;

    let mut scored = Vec::with_capacity(batch.len());
    for enriched in batch {
        if enriched.is_degenerate() && policy == DegeneratePolicy::Exclude {
            tracing::warn!(
                listing_id = enriched.property.listing.id,
                adults = enriched.property.pricing_quote.guest_details.number_of_adults,
                total_days = enriched.calendar.total_days,
                "excluding listing with degenerate scoring input"
            );
            continue;
        }

        let listing = &enriched.property.listing;
        let price_norm = enriched
            .price_per_adult()
            .map(|p| normalize(p, max_price))
            .unwrap_or(0.0);
        let availability = enriched.availability_factor().unwrap_or(0.0);
        let reviews_norm = normalize(listing.reviews_count as f64, max_reviews);
        let rate_norm = listing.star_rating / 5.0;

        let weight = RATE_WEIGHT * rate_norm
            + AVAILABILITY_WEIGHT * availability
            + REVIEWS_WEIGHT * reviews_norm
            + PRICE_WEIGHT * price_norm;

        scored.push((
            listing.id,
            ScoredListing {
                lat: listing.lat,
                lng: listing.lng,
                weight,
            },
        ));
    }
    scored
}
