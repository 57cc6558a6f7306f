use ranklens::{extract_domain, ResultExtractor};
use serde_json::{json, Value};

fn sample_response() -> Value {
    json!({
        "search_metadata": {
            "query": "sprinkler repair Spokane",
            "location": "Spokane, WA",
            "total_results": 128000,
            "total_time_taken": 1.42,
            "google_url": "https://www.google.com/search?q=sprinkler+repair"
        },
        "local_results": [
            {"position": 1, "title": "Evergreen Sprinklers", "rating": 4.8, "reviews": 120,
             "type": "Lawn sprinkler system contractor", "address": "123 Main St",
             "phone": "(509) 555-0101", "website": "https://evergreensprinklers.com",
             "gps_coordinates": {"latitude": 47.65, "longitude": -117.42},
             "place_id": "abc123"},
            {"position": 2, "title": "Rain Right Irrigation", "rating": 4.5, "reviews": 86},
            {"position": 3, "title": "Aqua Lawn Care", "rating": 4.9, "reviews": 210},
            {"position": 4, "title": "Fourth Business", "rating": 4.0, "reviews": 12},
            {"position": 5, "title": "Fifth Business", "rating": 3.9, "reviews": 8}
        ],
        "local_services": [
            {"position": 1, "title": "Pro Sprinkler Guys", "phone": "(509) 555-0202",
             "rating": 4.7, "reviews": 55, "years_in_business": "12 years",
             "service_areas": ["Spokane", "Spokane Valley"]}
        ],
        "organic_results": (1..=8).map(|i| json!({
            "position": i,
            "title": format!("Result {}", i),
            "link": format!("https://www.site{}.com/page", i),
            "snippet": "A snippet",
            "displayed_link": format!("site{}.com", i)
        })).collect::<Vec<_>>(),
        "ads": [
            {"position": 1, "title": "Sponsored Sprinklers", "link": "https://www.adsite.com/lp",
             "displayed_link": "adsite.com", "extensions": ["Free Quote", "Licensed"]}
        ],
        "knowledge_graph": {
            "title": "Evergreen Sprinklers", "type": "Contractor",
            "description": "Local sprinkler company", "rating": 4.8, "reviews": 120
        }
    })
}

#[test]
fn truncates_maps_to_three_and_organic_to_five() {
    let extractor = ResultExtractor::new();
    let record = extractor.normalize(&sample_response(), "sprinkler repair Spokane", "core");

    assert!(!record.error);
    assert_eq!(record.maps_listings.len(), 3);
    assert_eq!(record.local_services_ads.len(), 1);
    assert_eq!(record.organic_results.len(), 5);
    assert_eq!(record.ads.len(), 1);

    // Provider-given rank order is preserved, no re-sorting.
    assert_eq!(record.maps_listings[0].title, "Evergreen Sprinklers");
    assert_eq!(record.maps_listings[2].title, "Aqua Lawn Care");
    assert_eq!(record.organic_results[4].position, 5);
}

#[test]
fn populates_metadata_and_nested_fields() {
    let extractor = ResultExtractor::new();
    let record = extractor.normalize(&sample_response(), "sprinkler repair Spokane", "core");

    assert_eq!(record.keyword, "sprinkler repair Spokane");
    assert_eq!(record.keyword_group, "core");
    assert_eq!(record.search_metadata.query, "sprinkler repair Spokane");
    assert_eq!(record.search_metadata.total_results, 128000);

    let first = &record.maps_listings[0];
    assert_eq!(first.phone, "(509) 555-0101");
    let coords = first.gps_coordinates.as_ref().expect("coordinates present");
    assert!((coords.latitude - 47.65).abs() < 1e-9);

    let ad = &record.local_services_ads[0];
    assert_eq!(ad.years_in_business, "12 years");
    assert_eq!(ad.service_areas, vec!["Spokane", "Spokane Valley"]);

    let graph = record.knowledge_graph.expect("knowledge graph present");
    assert_eq!(graph.title, "Evergreen Sprinklers");
    assert_eq!(graph.entity_type, "Contractor");
}

#[test]
fn derives_domains_from_organic_and_ad_links() {
    let extractor = ResultExtractor::new();
    let record = extractor.normalize(&sample_response(), "sprinkler repair Spokane", "core");

    assert_eq!(record.organic_results[0].domain, "site1.com");
    assert_eq!(record.ads[0].domain, "adsite.com");
}

#[test]
fn wrong_typed_section_becomes_empty_without_error() {
    let extractor = ResultExtractor::new();
    let raw = json!({
        "local_results": "not a list",
        "organic_results": {"unexpected": "object"},
        "local_services": 42
    });

    let record = extractor.normalize(&raw, "plumber near me", "core");

    assert!(!record.error);
    assert!(record.maps_listings.is_empty());
    assert!(record.organic_results.is_empty());
    assert!(record.local_services_ads.is_empty());
    assert!(record.ads.is_empty());
    assert!(record.knowledge_graph.is_none());
}

#[test]
fn non_object_payload_degrades_to_error_record() {
    let extractor = ResultExtractor::new();

    for raw in [json!("just a string"), json!([1, 2, 3]), json!(null)] {
        let record = extractor.normalize(&raw, "hvac repair", "core");
        assert!(record.error);
        assert_eq!(record.keyword, "hvac repair");
        assert!(record.maps_listings.is_empty());
        assert!(record.local_services_ads.is_empty());
        assert!(record.organic_results.is_empty());
        assert!(record.ads.is_empty());
        assert!(record.knowledge_graph.is_none());
    }
}

#[test]
fn ragged_entries_fill_defaults() {
    let extractor = ResultExtractor::new();
    let raw = json!({
        "local_results": [
            {"title": 42, "rating": "not a number"},
            {}
        ],
        "organic_results": [
            {"link": 7, "position": "one"}
        ]
    });

    let record = extractor.normalize(&raw, "roofing company", "core");

    assert!(!record.error);
    assert_eq!(record.maps_listings.len(), 2);
    assert_eq!(record.maps_listings[0].title, "");
    assert_eq!(record.maps_listings[0].rating, 0.0);
    assert_eq!(record.organic_results[0].position, 0);
    assert_eq!(record.organic_results[0].domain, "");
}

#[test]
fn empty_knowledge_graph_is_absent() {
    let extractor = ResultExtractor::new();
    let record = extractor.normalize(&json!({"knowledge_graph": {}}), "x", "core");
    assert!(record.knowledge_graph.is_none());
}

#[test]
fn normalize_is_idempotent() {
    let extractor = ResultExtractor::new();
    let raw = sample_response();

    let first = extractor.normalize(&raw, "sprinkler repair Spokane", "core");
    let second = extractor.normalize(&raw, "sprinkler repair Spokane", "core");

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn domain_derivation_rules() {
    assert_eq!(extract_domain("https://www.example.com/x"), "example.com");
    assert_eq!(extract_domain("https://example.com/x"), "example.com");
    assert_eq!(extract_domain(""), "");
    assert_eq!(extract_domain("not a url"), "");
}
