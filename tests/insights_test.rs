use ranklens::insights::{infer_primary_service, infer_prose_city};
use ranklens::{Aggregator, InsightSynthesizer, NormalizedRecord, ReportAssembler, ResultExtractor};
use serde_json::{json, Value};

fn record_from(raw: Value, keyword: &str, group: &str) -> NormalizedRecord {
    ResultExtractor::new().normalize(&raw, keyword, group)
}

fn organic_entries(domain: &str, count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "position": i,
                "title": format!("{} page {}", domain, i),
                "link": format!("https://www.{}/page{}", domain, i)
            })
        })
        .collect()
}

#[test]
fn repeated_domain_ranks_first_with_total_appearances() {
    // Six organic results across two keywords, all pointing at acme.com.
    let records = vec![
        record_from(
            json!({"organic_results": organic_entries("acme.com", 3)}),
            "sprinkler repair",
            "core",
        ),
        record_from(
            json!({"organic_results": organic_entries("acme.com", 3)}),
            "sprinkler installation",
            "core",
        ),
    ];
    let aggregated = Aggregator::new().fold(records);

    let insights = InsightSynthesizer::new().derive(&aggregated);
    let top = &insights.competitive_analysis.top_organic_competitors[0];
    assert_eq!(top.domain, "acme.com");
    assert_eq!(top.appearances, 6);
    assert_eq!(top.keywords.len(), 6);

    let summary = ReportAssembler::new().summary_report(&aggregated, "Test Biz", "Spokane, WA");
    assert_eq!(summary.top_competing_domains[0], ("acme.com".to_string(), 6));
    assert_eq!(summary.total_competitors, 1);
}

#[test]
fn primary_service_inference() {
    assert_eq!(
        infer_primary_service(&["sprinkler system repair"]),
        "sprinkler system"
    );
    assert_eq!(infer_primary_service(&["emergency HVAC service"]), "HVAC");
    assert_eq!(
        infer_primary_service(&["best pest control near me"]),
        "pest control"
    );
    assert_eq!(
        infer_primary_service(&["wedding photography"]),
        "professional services"
    );
    // First keyword with a lexicon hit wins.
    assert_eq!(
        infer_primary_service(&["accounting help", "plumbing quote", "roofing quote"]),
        "plumbing"
    );
}

#[test]
fn maps_rating_is_last_write_wins() {
    let records = vec![
        record_from(
            json!({"local_results": [
                {"position": 1, "title": "Evergreen Sprinklers", "rating": 4.2, "reviews": 50}
            ]}),
            "kw one",
            "core",
        ),
        record_from(
            json!({"local_results": [
                {"position": 1, "title": "Evergreen Sprinklers", "rating": 4.9, "reviews": 200}
            ]}),
            "kw two",
            "core",
        ),
    ];
    let aggregated = Aggregator::new().fold(records);
    let insights = InsightSynthesizer::new().derive(&aggregated);

    let top = &insights.competitive_analysis.top_maps_competitors[0];
    assert_eq!(top.name, "Evergreen Sprinklers");
    assert_eq!(top.appearances, 2);
    // Most recent occurrence overwrites, not a max or average.
    assert_eq!(top.rating, 4.9);
    assert_eq!(top.reviews, 200);
}

#[test]
fn unrated_listing_does_not_overwrite_rating() {
    let records = vec![
        record_from(
            json!({"local_results": [{"position": 1, "title": "Rain Right", "rating": 4.5, "reviews": 80}]}),
            "kw one",
            "core",
        ),
        record_from(
            json!({"local_results": [{"position": 2, "title": "Rain Right"}]}),
            "kw two",
            "core",
        ),
    ];
    let aggregated = Aggregator::new().fold(records);
    let insights = InsightSynthesizer::new().derive(&aggregated);

    let top = &insights.competitive_analysis.top_maps_competitors[0];
    assert_eq!(top.appearances, 2);
    assert_eq!(top.rating, 4.5);
    assert_eq!(top.reviews, 80);
}

#[test]
fn organic_average_position_is_arithmetic_mean() {
    let records = vec![record_from(
        json!({"organic_results": [
            {"position": 1, "link": "https://acme.com/a"},
            {"position": 3, "link": "https://acme.com/b"},
            {"position": 5, "link": "https://acme.com/c"}
        ]}),
        "kw",
        "core",
    )];
    let aggregated = Aggregator::new().fold(records);
    let insights = InsightSynthesizer::new().derive(&aggregated);

    let top = &insights.competitive_analysis.top_organic_competitors[0];
    assert!((top.avg_position - 3.0).abs() < 1e-9);
}

#[test]
fn error_records_are_excluded_from_landscape() {
    let records = vec![
        record_from(
            json!({"local_results": [{"position": 1, "title": "Visible Biz", "rating": 4.0, "reviews": 10}]}),
            "good kw",
            "core",
        ),
        NormalizedRecord::empty("bad kw", "core"),
    ];
    let aggregated = Aggregator::new().fold(records);
    let insights = InsightSynthesizer::new().derive(&aggregated);

    assert_eq!(insights.competitive_analysis.total_maps_competitors, 1);
}

#[test]
fn market_saturation_thresholds() {
    // 19 distinct maps competitors stay MODERATE; 20 flips to HIGH.
    for (count, expected_saturation, expected_score) in
        [(19usize, "MODERATE", 43u32), (20, "HIGH", 40), (35, "HIGH", 0)]
    {
        let listings: Vec<Value> = (0..count)
            .map(|i| json!({"position": 1, "title": format!("Biz {}", i), "rating": 4.0, "reviews": 1}))
            .collect();
        // Spread across records: the maps pack is capped at 3 per keyword.
        let records: Vec<NormalizedRecord> = listings
            .chunks(3)
            .enumerate()
            .map(|(i, chunk)| {
                record_from(
                    json!({"local_results": chunk}),
                    &format!("kw {}", i),
                    "core",
                )
            })
            .collect();
        let aggregated = Aggregator::new().fold(records);
        let insights = InsightSynthesizer::new().derive(&aggregated);

        let analysis = &insights.competitive_analysis.market_analysis;
        assert_eq!(analysis.market_saturation, expected_saturation);
        assert_eq!(analysis.opportunity_score, expected_score);
    }
}

#[test]
fn gmb_benchmarks_average_independent_subsets() {
    // One listing reports only a rating, another only reviews; each average
    // runs over its own subset.
    let records = vec![record_from(
        json!({"local_results": [
            {"position": 1, "title": "A", "rating": 4.0},
            {"position": 2, "title": "B", "reviews": 100},
            {"position": 3, "title": "C", "rating": 5.0, "reviews": 200}
        ]}),
        "kw",
        "core",
    )];
    let aggregated = Aggregator::new().fold(records);
    let insights = InsightSynthesizer::new().derive(&aggregated);

    let benchmarks = &insights.gmb_recommendations.competitive_benchmarks;
    assert_eq!(benchmarks.average_rating, 4.5);
    assert_eq!(benchmarks.average_reviews, 150);
    assert_eq!(benchmarks.top_rated_competitor, 5.0);
}

#[test]
fn prose_city_comes_from_keyword_text_not_config() {
    let spokane = vec![record_from(json!({}), "sprinkler repair Spokane", "core")];
    assert_eq!(infer_prose_city(&spokane), "Spokane");

    let nowhere = vec![record_from(json!({}), "sprinkler repair", "core")];
    assert_eq!(infer_prose_city(&nowhere), "your city");
}

#[test]
fn templated_copy_carries_inferred_service_and_city() {
    let records = vec![record_from(
        json!({"local_results": [{"position": 1, "title": "A", "rating": 4.0, "reviews": 100}]}),
        "sprinkler repair Spokane",
        "core",
    )];
    let aggregated = Aggregator::new().fold(records);
    let insights = InsightSynthesizer::new().derive(&aggregated);

    let seo = &insights.seo_recommendations;
    assert_eq!(seo.immediate_fixes.len(), 5);
    assert!(seo.immediate_fixes[0].description.contains("Spokane"));
    assert!(seo.immediate_fixes[0].description.contains("sprinkler system"));
    assert!(seo.title_tag_suggestions[0].contains("Sprinkler System"));
    assert_eq!(seo.technical_seo.len(), 4);

    let gmb = &insights.gmb_recommendations;
    assert!(gmb.posting_strategy[2].example.contains("Spokane"));
    // Review target is 1.2x the competitor average.
    assert!(gmb.review_strategy[3].contains("120"));

    let business = &insights.business_insights;
    assert_eq!(business.next_steps.len(), 3);
    assert!(business
        .layman_explanation
        .why_not_showing_up[0]
        .contains("sprinkler system Spokane"));
}

#[test]
fn derive_is_deterministic() {
    let records = vec![
        record_from(
            json!({
                "local_results": [{"position": 1, "title": "A", "rating": 4.1, "reviews": 10}],
                "organic_results": organic_entries("acme.com", 2)
            }),
            "sprinkler repair Spokane",
            "core",
        ),
        record_from(
            json!({"organic_results": organic_entries("other.com", 1)}),
            "lawn care",
            "upsell",
        ),
    ];
    let aggregated = Aggregator::new().fold(records);

    let first = InsightSynthesizer::new().derive(&aggregated);
    let second = InsightSynthesizer::new().derive(&aggregated);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}
