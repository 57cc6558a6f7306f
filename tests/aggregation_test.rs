use ranklens::{Aggregator, NormalizedRecord, ResultExtractor};
use serde_json::json;

fn record_with_counts(
    keyword: &str,
    group: &str,
    maps: usize,
    services: usize,
    organic: usize,
) -> NormalizedRecord {
    let extractor = ResultExtractor::new();
    let raw = json!({
        "local_results": (0..maps).map(|i| json!({"position": i + 1, "title": format!("Biz {}", i)})).collect::<Vec<_>>(),
        "local_services": (0..services).map(|i| json!({"position": i + 1, "title": format!("Ad {}", i)})).collect::<Vec<_>>(),
        "organic_results": (0..organic).map(|i| json!({"position": i + 1, "link": format!("https://www.domain{}.com/", i)})).collect::<Vec<_>>(),
    });
    extractor.normalize(&raw, keyword, group)
}

#[test]
fn partitions_by_group_with_error_isolation() {
    // Scenario: two "core" keywords with one failing, one "upsell" keyword.
    let mut failed = NormalizedRecord::empty("sprinkler winterization", "core");
    failed.error_message = Some("provider error: timed out".to_string());

    let records = vec![
        record_with_counts("sprinkler repair", "core", 3, 1, 5),
        failed,
        record_with_counts("lawn aeration", "upsell", 2, 0, 4),
    ];

    let aggregated = Aggregator::new().fold(records);

    assert_eq!(aggregated.summary.total_keywords, 3);
    assert_eq!(aggregated.summary.successful_searches, 2);
    assert_eq!(aggregated.summary.failed_searches, 1);

    let core = aggregated.group("core").expect("core group present");
    assert_eq!(core.keyword_count, 2);
    assert_eq!(core.successful_searches, 1);

    let upsell = aggregated.group("upsell").expect("upsell group present");
    assert_eq!(upsell.keyword_count, 1);
    assert_eq!(upsell.successful_searches, 1);
}

#[test]
fn listing_totals_include_error_records() {
    // Error records contribute zero to listing totals but are not excluded
    // from the sums; only successful_searches filters on the error flag.
    let records = vec![
        record_with_counts("kw one", "core", 3, 2, 5),
        NormalizedRecord::empty("kw two", "core"),
        record_with_counts("kw three", "core", 1, 0, 2),
    ];

    let aggregated = Aggregator::new().fold(records);
    let core = aggregated.group("core").unwrap();

    assert_eq!(core.total_maps_listings, 4);
    assert_eq!(core.total_local_services, 2);
    assert_eq!(core.total_organic_results, 7);

    let recomputed: usize = core.results.iter().map(|r| r.maps_listings.len()).sum();
    assert_eq!(core.total_maps_listings, recomputed);
}

#[test]
fn summary_counts_are_complementary() {
    let records = vec![
        record_with_counts("a", "core", 1, 0, 1),
        NormalizedRecord::empty("b", "core"),
        NormalizedRecord::empty("c", "upsell"),
        record_with_counts("d", "emergency", 0, 0, 3),
    ];

    let aggregated = Aggregator::new().fold(records);
    let summary = &aggregated.summary;

    assert_eq!(
        summary.successful_searches + summary.failed_searches,
        summary.total_keywords
    );
}

#[test]
fn groups_keep_first_seen_order() {
    let records = vec![
        record_with_counts("a", "core", 0, 0, 0),
        record_with_counts("b", "upsell", 0, 0, 0),
        record_with_counts("c", "core", 0, 0, 0),
        record_with_counts("d", "emergency", 0, 0, 0),
    ];

    let aggregated = Aggregator::new().fold(records);
    let order: Vec<&str> = aggregated
        .by_keyword_group
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();

    assert_eq!(order, vec!["core", "upsell", "emergency"]);
}

#[test]
fn member_records_keep_keyword_order() {
    let records = vec![
        record_with_counts("first", "core", 0, 0, 0),
        record_with_counts("second", "core", 0, 0, 0),
        record_with_counts("third", "core", 0, 0, 0),
    ];

    let aggregated = Aggregator::new().fold(records);
    let core = aggregated.group("core").unwrap();
    let keywords: Vec<&str> = core.results.iter().map(|r| r.keyword.as_str()).collect();

    assert_eq!(keywords, vec!["first", "second", "third"]);
}
