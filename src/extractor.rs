use crate::types::{
    GpsCoordinates, KnowledgeGraph, LocalServiceAd, MapsListing, NormalizedRecord, OrganicResult,
    PaidAd, SearchMetadata,
};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// How many map-pack entries are kept per keyword.
pub const MAX_MAPS_RESULTS: usize = 3;
/// How many organic entries are kept per keyword.
pub const MAX_ORGANIC_RESULTS: usize = 5;

/// Converts one raw provider response into a `NormalizedRecord`.
///
/// `normalize` is a total function: provider schema drift (absent fields,
/// wrong-typed containers, ragged entries) degrades to empty sections, and a
/// payload that is not even an object degrades to the empty record with
/// `error` set. It never panics and never returns an error.
pub struct ResultExtractor;

impl ResultExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &Value, keyword: &str, keyword_group: &str) -> NormalizedRecord {
        if !raw.is_object() {
            warn!(
                "Response for '{}' is not an object ({}), returning empty record",
                keyword,
                json_type_name(raw)
            );
            return NormalizedRecord::empty(keyword, keyword_group);
        }

        let record = NormalizedRecord {
            keyword: keyword.to_string(),
            keyword_group: keyword_group.to_string(),
            search_metadata: extract_search_metadata(raw),
            maps_listings: extract_maps_listings(raw),
            local_services_ads: extract_local_services_ads(raw),
            organic_results: extract_organic_results(raw),
            ads: extract_ads(raw),
            knowledge_graph: extract_knowledge_graph(raw),
            error: false,
            error_message: None,
        };

        debug!(
            "Normalized '{}': {} maps, {} service ads, {} organic, {} paid",
            keyword,
            record.maps_listings.len(),
            record.local_services_ads.len(),
            record.organic_results.len(),
            record.ads.len()
        );
        record
    }
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Narrow a top-level section to a list. A present-but-wrong-typed field is
/// treated as absent, which is how provider schema drift stays contained.
fn section<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    match raw.get(key) {
        None => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(
                "'{}' is not a list, it's {}. Substituting empty.",
                key,
                json_type_name(other)
            );
            &[]
        }
    }
}

fn extract_search_metadata(raw: &Value) -> SearchMetadata {
    let metadata = raw.get("search_metadata").unwrap_or(&Value::Null);
    SearchMetadata {
        query: str_field(metadata, "query"),
        location: str_field(metadata, "location"),
        total_results: u64_field(metadata, "total_results"),
        time_taken: f64_field(metadata, "total_time_taken"),
        search_url: str_field(metadata, "google_url"),
    }
}

fn extract_maps_listings(raw: &Value) -> Vec<MapsListing> {
    section(raw, "local_results")
        .iter()
        .take(MAX_MAPS_RESULTS)
        .map(|entry| MapsListing {
            position: u32_field(entry, "position"),
            title: str_field(entry, "title"),
            rating: f64_field(entry, "rating"),
            reviews: u64_field(entry, "reviews"),
            business_type: str_field(entry, "type"),
            address: str_field(entry, "address"),
            phone: str_field(entry, "phone"),
            website: str_field(entry, "website"),
            hours: str_field(entry, "hours"),
            gps_coordinates: extract_coordinates(entry.get("gps_coordinates")),
            place_id: str_field(entry, "place_id"),
        })
        .collect()
}

fn extract_local_services_ads(raw: &Value) -> Vec<LocalServiceAd> {
    section(raw, "local_services")
        .iter()
        .map(|entry| LocalServiceAd {
            position: u32_field(entry, "position"),
            title: str_field(entry, "title"),
            phone: str_field(entry, "phone"),
            rating: f64_field(entry, "rating"),
            reviews: u64_field(entry, "reviews"),
            years_in_business: str_field(entry, "years_in_business"),
            license_info: str_field(entry, "license_info"),
            service_areas: string_list(entry.get("service_areas")),
        })
        .collect()
}

fn extract_organic_results(raw: &Value) -> Vec<OrganicResult> {
    section(raw, "organic_results")
        .iter()
        .take(MAX_ORGANIC_RESULTS)
        .map(|entry| {
            let link = str_field(entry, "link");
            OrganicResult {
                position: u32_field(entry, "position"),
                title: str_field(entry, "title"),
                domain: extract_domain(&link),
                link,
                snippet: str_field(entry, "snippet"),
                displayed_link: str_field(entry, "displayed_link"),
                sitelinks: value_list(entry.get("sitelinks")),
                rich_snippet: entry.get("rich_snippet").cloned().unwrap_or(Value::Null),
            }
        })
        .collect()
}

fn extract_ads(raw: &Value) -> Vec<PaidAd> {
    section(raw, "ads")
        .iter()
        .map(|entry| {
            let link = str_field(entry, "link");
            PaidAd {
                position: u32_field(entry, "position"),
                title: str_field(entry, "title"),
                domain: extract_domain(&link),
                link,
                displayed_link: str_field(entry, "displayed_link"),
                snippet: str_field(entry, "snippet"),
                extensions: string_list(entry.get("extensions")),
                tracking_link: str_field(entry, "tracking_link"),
            }
        })
        .collect()
}

fn extract_knowledge_graph(raw: &Value) -> Option<KnowledgeGraph> {
    let graph = raw.get("knowledge_graph")?;
    let object = graph.as_object()?;
    if object.is_empty() {
        return None;
    }
    Some(KnowledgeGraph {
        title: str_field(graph, "title"),
        entity_type: str_field(graph, "type"),
        description: str_field(graph, "description"),
        website: str_field(graph, "website"),
        phone: str_field(graph, "phone"),
        address: str_field(graph, "address"),
        rating: f64_field(graph, "rating"),
        reviews: u64_field(graph, "reviews"),
    })
}

fn extract_coordinates(value: Option<&Value>) -> Option<GpsCoordinates> {
    let coords = value?.as_object()?;
    Some(GpsCoordinates {
        latitude: coords.get("latitude").and_then(Value::as_f64).unwrap_or(0.0),
        longitude: coords.get("longitude").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

/// Derive the domain from a link: network location with any leading `www.`
/// stripped. Malformed or empty links yield an empty string, never an error.
pub fn extract_domain(link: &str) -> String {
    if link.is_empty() {
        return String::new();
    }
    match Url::parse(link) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("");
            host.strip_prefix("www.").unwrap_or(host).to_string()
        }
        Err(_) => String::new(),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn f64_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn u64_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn u32_field(value: &Value, key: &str) -> u32 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0) as u32
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn value_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
