// Query encoding: internal camelCase field names to the provider's wire form

use std::collections::BTreeMap;

use serde_json::Value;

// Keys the API expects with a bare underscore prefix instead of snake_case.
const UNDERSCORE_PREFIX: [&str; 2] = ["limit", "offset"];

// Search query as the rest of the crate sees it. `filters` carries arbitrary
// caller-supplied fields (internal camelCase names); the fixed fields are the
// ones the pagination state machine rewrites every step.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub filters: BTreeMap<String, Value>,
    pub limit: u32,
    pub offset: u32,
    pub price_min: u32,
    pub price_max: u32,
}

impl SearchQuery {
    pub fn for_location(location: &str) -> Self {
        let mut filters = BTreeMap::new();
        filters.insert("location".to_string(), Value::from(location));
        Self {
            filters,
            ..Default::default()
        }
    }

    // Internal field map, still in camelCase. encode_query does the renaming.
    pub fn to_fields(&self) -> BTreeMap<String, Value> {
        let mut fields = self.filters.clone();
        fields.insert("limit".to_string(), Value::from(self.limit));
        fields.insert("offset".to_string(), Value::from(self.offset));
        fields.insert("priceMin".to_string(), Value::from(self.price_min));
        fields.insert("priceMax".to_string(), Value::from(self.price_max));
        fields
    }
}

// Rename every key to snake_case, except the underscore-prefixed exceptions,
// which the API wants verbatim behind a single leading underscore. Values are
// passed through untouched.
pub fn encode_query(fields: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (wire_key(key), value.clone()))
        .collect()
}

fn wire_key(key: &str) -> String {
    if UNDERSCORE_PREFIX.contains(&key) {
        format!("_{key}")
    } else {
        snake_case(key)
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_pagination_keys_with_underscore_prefix() {
        let mut fields = BTreeMap::new();
        fields.insert("limit".to_string(), json!(10));
        fields.insert("offset".to_string(), json!(5));
        fields.insert("priceMin".to_string(), json!(20));

        let wire = encode_query(&fields);

        let mut expected = BTreeMap::new();
        expected.insert("_limit".to_string(), json!(10));
        expected.insert("_offset".to_string(), json!(5));
        expected.insert("price_min".to_string(), json!(20));
        assert_eq!(wire, expected);
    }

    #[test]
    fn snake_cases_arbitrary_filter_fields() {
        assert_eq!(snake_case("listingId"), "listing_id");
        assert_eq!(snake_case("checkIn"), "check_in");
        assert_eq!(snake_case("location"), "location");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn search_query_field_map_carries_filters_and_band() {
        let mut query = SearchQuery::for_location("Berlin");
        query.limit = 50;
        query.offset = 100;
        query.price_min = 101;
        query.price_max = 201;
        query
            .filters
            .insert("roomType".to_string(), json!("entire_home"));

        let wire = encode_query(&query.to_fields());
        assert_eq!(wire.get("location"), Some(&json!("Berlin")));
        assert_eq!(wire.get("room_type"), Some(&json!("entire_home")));
        assert_eq!(wire.get("_limit"), Some(&json!(50)));
        assert_eq!(wire.get("_offset"), Some(&json!(100)));
        assert_eq!(wire.get("price_min"), Some(&json!(101)));
        assert_eq!(wire.get("price_max"), Some(&json!(201)));
    }
}
