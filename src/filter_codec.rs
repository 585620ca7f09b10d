// Conversion between SearchFilter and the URL query string.
// The query string is the only persisted form of search state, so encoding is
// total and deterministic and decoding never fails.

use url::form_urlencoded;

use crate::models::{PartialFilter, SearchFilter, SortKey, SortOrder, TypeFilter};

/// Keys that make up a filter's identity, in emission order.
pub const RECOGNIZED_KEYS: [&str; 7] = [
    "searchTerm",
    "type",
    "parking",
    "furnished",
    "offer",
    "sort",
    "order",
];

// Transient paging keys; never part of the filter identity
pub const START_INDEX_KEY: &str = "startIndex";
pub const LIMIT_KEY: &str = "limit";

fn pairs(filter: &SearchFilter) -> [(&'static str, String); 7] {
    [
        ("searchTerm", filter.search_term.clone()),
        ("type", filter.listing_type.as_str().to_string()),
        ("parking", filter.parking.to_string()),
        ("furnished", filter.furnished.to_string()),
        ("offer", filter.offer.to_string()),
        ("sort", filter.sort.as_str().to_string()),
        ("order", filter.order.as_str().to_string()),
    ]
}

/// Serializes every field of `filter`, booleans as `true`/`false`.
pub fn encode(filter: &SearchFilter) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs(filter) {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

/// Reads the keys listed in `recognized` from `query`. Absent keys stay `None`;
/// for repeated keys the first occurrence wins. Malformed enum values are
/// dropped so they fall back to the defaults on merge, and any boolean other
/// than the literal `true` reads as `false`.
pub fn decode(query: &str, recognized: &[&str]) -> PartialFilter {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut partial = PartialFilter::default();
    let mut seen: Vec<String> = Vec::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if !recognized.contains(&&*key) || seen.iter().any(|k| *k == key) {
            continue;
        }
        seen.push(key.to_string());

        match &*key {
            "searchTerm" => partial.search_term = Some(value.into_owned()),
            "type" => partial.listing_type = TypeFilter::parse(&value),
            "parking" => partial.parking = Some(value == "true"),
            "furnished" => partial.furnished = Some(value == "true"),
            "offer" => partial.offer = Some(value == "true"),
            "sort" => partial.sort = SortKey::parse(&value),
            "order" => partial.order = SortOrder::parse(&value),
            other => tracing::debug!(key = other, "Recognized key has no filter field, ignoring"),
        }
    }
    partial
}

/// Decodes the recognized keys of `query` and merges them over the defaults.
pub fn decode_filter(query: &str) -> SearchFilter {
    SearchFilter::from_partial(decode(query, &RECOGNIZED_KEYS))
}

/// Query for one page request: the encoded filter plus the paging keys.
pub fn fetch_query(filter: &SearchFilter, start_index: Option<usize>, limit: usize) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs(filter) {
        serializer.append_pair(key, &value);
    }
    if let Some(start) = start_index {
        serializer.append_pair(START_INDEX_KEY, &start.to_string());
    }
    serializer.append_pair(LIMIT_KEY, &limit.to_string());
    serializer.finish()
}
