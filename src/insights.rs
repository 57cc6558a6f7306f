use crate::types::{
    ActionItem, AggregatedData, BusinessInsights, CompetitiveAnalysis, ContentPlan, GmbBenchmarks,
    GmbRecommendations, HeaderStructure, InsightBundle, LaymanExplanation, MapsCompetitor,
    MarketAnalysis, MarketOverview, NextStep, NormalizedRecord, OrganicCompetitor, PostingIdea,
    SeoRecommendations, TechnicalItem,
};
use tracing::{debug, info};

/// Service terms matched case-insensitively against keyword text; first
/// match wins, scanning keywords in order.
const SERVICE_LEXICON: &[(&str, &str)] = &[
    ("sprinkler", "sprinkler system"),
    ("irrigation", "irrigation"),
    ("plumbing", "plumbing"),
    ("hvac", "HVAC"),
    ("landscaping", "landscaping"),
    ("roofing", "roofing"),
    ("electrical", "electrical"),
    ("pest control", "pest control"),
    ("cleaning", "cleaning"),
];

const DEFAULT_SERVICE: &str = "professional services";

/// Cities the prose heuristic knows about.
const KNOWN_CITIES: &[&str] = &["Spokane", "Seattle", "Portland"];

/// The SEO templates only recognize the two cities the report was originally
/// tuned for; the prose heuristic above knows one more.
const SEO_TEMPLATE_CITIES: &[&str] = &["Spokane", "Seattle"];

/// Derives competitive-landscape summaries and templated recommendation
/// lists from aggregated search data.
///
/// This is a pure transform: no randomness and no clock reads, so identical
/// input yields an identical bundle.
///
/// Display cities in templated prose come from pattern-matching keyword text
/// against a small fixed city list, not from the structured location in the
/// caller's configuration. The two can disagree; the keyword-based heuristic
/// is the long-observed behavior of this report and is kept as-is.
pub struct InsightSynthesizer;

impl InsightSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(&self, aggregated: &AggregatedData) -> InsightBundle {
        let all_records = &aggregated.all_records;
        info!("Deriving insights from {} records", all_records.len());

        InsightBundle {
            competitive_analysis: Self::analyze_competitive_landscape(all_records),
            seo_recommendations: Self::generate_seo_recommendations(all_records),
            gmb_recommendations: Self::generate_gmb_recommendations(all_records),
            business_insights: Self::generate_business_insights(all_records),
        }
    }

    fn analyze_competitive_landscape(all_records: &[NormalizedRecord]) -> CompetitiveAnalysis {
        // Insertion-ordered so the stable sort below keeps first-seen order
        // among equal appearance counts.
        let mut maps_competitors: Vec<MapsCompetitor> = Vec::new();
        let mut organic_competitors: Vec<OrganicCompetitor> = Vec::new();

        for record in all_records {
            if record.error {
                continue;
            }

            for listing in &record.maps_listings {
                if listing.title.is_empty() {
                    continue;
                }
                let index = match maps_competitors.iter().position(|c| c.name == listing.title) {
                    Some(index) => index,
                    None => {
                        maps_competitors.push(MapsCompetitor {
                            name: listing.title.clone(),
                            phone: listing.phone.clone(),
                            ..Default::default()
                        });
                        maps_competitors.len() - 1
                    }
                };
                let competitor = &mut maps_competitors[index];
                competitor.appearances += 1;
                competitor.keywords.push(record.keyword.clone());
                // Last-write-wins: the most recent rated listing overwrites.
                if listing.rating != 0.0 {
                    competitor.rating = listing.rating;
                    competitor.reviews = listing.reviews;
                }
            }

            for organic in &record.organic_results {
                if organic.domain.is_empty() {
                    continue;
                }
                let index = match organic_competitors
                    .iter()
                    .position(|c| c.domain == organic.domain)
                {
                    Some(index) => index,
                    None => {
                        organic_competitors.push(OrganicCompetitor {
                            domain: organic.domain.clone(),
                            ..Default::default()
                        });
                        organic_competitors.len() - 1
                    }
                };
                let competitor = &mut organic_competitors[index];
                competitor.appearances += 1;
                competitor.keywords.push(record.keyword.clone());
                competitor.positions.push(organic.position);
            }
        }

        for competitor in &mut organic_competitors {
            if !competitor.positions.is_empty() {
                competitor.avg_position = competitor.positions.iter().map(|&p| p as f64).sum::<f64>()
                    / competitor.positions.len() as f64;
            }
        }

        let total_maps_competitors = maps_competitors.len();
        let total_organic_competitors = organic_competitors.len();
        let market_analysis = market_analysis(total_maps_competitors);

        let mut top_maps = maps_competitors;
        top_maps.sort_by(|a, b| b.appearances.cmp(&a.appearances));
        top_maps.truncate(5);

        let mut top_organic = organic_competitors;
        top_organic.sort_by(|a, b| b.appearances.cmp(&a.appearances));
        top_organic.truncate(5);

        debug!(
            "Competitive landscape: {} maps competitors, {} organic competitors",
            total_maps_competitors, total_organic_competitors
        );

        CompetitiveAnalysis {
            total_maps_competitors,
            total_organic_competitors,
            top_maps_competitors: top_maps,
            top_organic_competitors: top_organic,
            market_analysis,
        }
    }

    fn generate_seo_recommendations(all_records: &[NormalizedRecord]) -> SeoRecommendations {
        let keywords: Vec<&str> = all_records.iter().map(|r| r.keyword.as_str()).collect();
        let service = infer_primary_service(&keywords);
        let city = infer_seo_city(all_records);

        SeoRecommendations {
            immediate_fixes: immediate_seo_fixes(city.unwrap_or("your city"), service),
            title_tag_suggestions: title_tag_suggestions(city.unwrap_or("Your City"), service),
            meta_description_suggestions: meta_suggestions(city.unwrap_or("your area"), service),
            content_optimization: content_plan(city.unwrap_or("your city"), service),
            technical_seo: technical_recommendations(),
        }
    }

    fn generate_gmb_recommendations(all_records: &[NormalizedRecord]) -> GmbRecommendations {
        let mut ratings: Vec<f64> = Vec::new();
        let mut review_counts: Vec<u64> = Vec::new();

        for record in all_records {
            for listing in &record.maps_listings {
                if listing.rating != 0.0 {
                    ratings.push(listing.rating);
                }
                if listing.reviews != 0 {
                    review_counts.push(listing.reviews);
                }
            }
        }

        // Each average runs over its own non-empty subset, so the two can be
        // computed over different numbers of listings.
        let avg_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };
        let avg_reviews = if review_counts.is_empty() {
            0.0
        } else {
            review_counts.iter().sum::<u64>() as f64 / review_counts.len() as f64
        };
        let top_rated = ratings.iter().cloned().fold(0.0, f64::max);

        let keywords: Vec<&str> = all_records.iter().map(|r| r.keyword.as_str()).collect();
        let service = infer_primary_service(&keywords);
        let city = infer_prose_city(all_records);
        let review_target = (avg_reviews * 1.2) as u64;

        GmbRecommendations {
            competitive_benchmarks: GmbBenchmarks {
                average_rating: (avg_rating * 10.0).round() / 10.0,
                average_reviews: avg_reviews as u64,
                top_rated_competitor: top_rated,
            },
            posting_strategy: vec![
                PostingIdea {
                    frequency: "Weekly".to_string(),
                    post_type: "Offer Posts".to_string(),
                    example: format!(
                        "Get a FREE {} inspection with any service call this month - a $150+ value!",
                        service
                    ),
                    cta: "Call now to schedule".to_string(),
                },
                PostingIdea {
                    frequency: "Bi-weekly".to_string(),
                    post_type: "Service Highlights".to_string(),
                    example: format!(
                        "Professional {} installation with 100% satisfaction guarantee",
                        service
                    ),
                    cta: "Book your consultation".to_string(),
                },
                PostingIdea {
                    frequency: "Monthly".to_string(),
                    post_type: "Educational Content".to_string(),
                    example: format!("5 Signs You Need {} Repair in {}", service, city),
                    cta: "Learn more on our website".to_string(),
                },
            ],
            photo_strategy: vec![
                "Upload job-site photos weekly".to_string(),
                format!("Geo-tag photos with {} neighborhoods", city),
                "Show before/after project results".to_string(),
                "Include team photos and equipment".to_string(),
            ],
            review_strategy: vec![
                "Respond to all reviews within 24 hours".to_string(),
                "Ask satisfied customers for reviews via email/text".to_string(),
                "Address negative reviews professionally".to_string(),
                format!("Target {} total reviews to exceed competition", review_target),
            ],
        }
    }

    fn generate_business_insights(all_records: &[NormalizedRecord]) -> BusinessInsights {
        let keywords: Vec<&str> = all_records.iter().map(|r| r.keyword.as_str()).collect();
        let service = infer_primary_service(&keywords);
        let city = infer_prose_city(all_records);

        let maps_competitors = distinct_count(
            all_records
                .iter()
                .flat_map(|r| r.maps_listings.iter())
                .map(|l| l.title.as_str())
                .filter(|title| !title.is_empty()),
        );
        let organic_competitors = distinct_count(
            all_records
                .iter()
                .flat_map(|r| r.organic_results.iter())
                .map(|o| o.domain.as_str())
                .filter(|domain| !domain.is_empty()),
        );

        BusinessInsights {
            market_overview: MarketOverview {
                competition_level: assess_competition_level(maps_competitors, organic_competitors),
                market_opportunity: assess_market_opportunity(all_records),
                key_findings: key_findings(all_records, city, service),
            },
            layman_explanation: LaymanExplanation {
                why_not_showing_up: vec![
                    format!(
                        "Your website isn't using the words people actually search for (like \"{} {}\")",
                        service, city
                    ),
                    "You're not active on your Google Business profile with regular posts and updates"
                        .to_string(),
                    format!("Google can't tell you're the best {} option in {}", service, city),
                    "Your competitors are more visible because they're doing basic SEO you're missing"
                        .to_string(),
                ],
                whats_getting_fixed: vec![
                    format!(
                        "Your website will start using the exact words people search for in {}",
                        city
                    ),
                    "You'll have compelling offers posted to your Google Business profile".to_string(),
                    format!("You'll show up when people in {} search for {} help", city, service),
                    "Your business will look more professional and trustworthy online".to_string(),
                ],
            },
            next_steps: vec![
                NextStep {
                    priority: 1,
                    action: "Fix Your Website Basics".to_string(),
                    description:
                        "Update title tags, meta descriptions, and add location-specific keywords"
                            .to_string(),
                    timeline: "1-2 weeks".to_string(),
                    impact: "HIGH".to_string(),
                },
                NextStep {
                    priority: 2,
                    action: "Activate Google My Business".to_string(),
                    description: "Start posting weekly offers and uploading job photos".to_string(),
                    timeline: "Ongoing weekly".to_string(),
                    impact: "HIGH".to_string(),
                },
                NextStep {
                    priority: 3,
                    action: "Build Review Strategy".to_string(),
                    description: "Systematically collect customer reviews to match competition"
                        .to_string(),
                    timeline: "2-3 months".to_string(),
                    impact: "MEDIUM".to_string(),
                },
            ],
        }
    }
}

impl Default for InsightSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer the primary service term from keyword text. First match wins,
/// scanning keywords in order and the lexicon in order within each keyword.
pub fn infer_primary_service(keywords: &[&str]) -> &'static str {
    for keyword in keywords {
        let lower = keyword.to_lowercase();
        for (pattern, service) in SERVICE_LEXICON {
            if lower.contains(pattern) {
                return service;
            }
        }
    }
    DEFAULT_SERVICE
}

fn infer_seo_city(all_records: &[NormalizedRecord]) -> Option<&'static str> {
    for record in all_records {
        for city in SEO_TEMPLATE_CITIES {
            if record.keyword.contains(city) {
                return Some(city);
            }
        }
    }
    None
}

/// Pick a display city for templated prose by matching keyword text against
/// the fixed city list. Unmatched keywords fall back to a placeholder.
pub fn infer_prose_city(all_records: &[NormalizedRecord]) -> &'static str {
    for record in all_records {
        for city in KNOWN_CITIES {
            if record.keyword.contains(city) {
                return city;
            }
        }
    }
    "your city"
}

fn market_analysis(maps_competitor_count: usize) -> MarketAnalysis {
    MarketAnalysis {
        market_saturation: if maps_competitor_count < 20 {
            "MODERATE".to_string()
        } else {
            "HIGH".to_string()
        },
        opportunity_score: (100_i64 - maps_competitor_count as i64 * 3).clamp(0, 100) as u32,
        recommended_strategy: if maps_competitor_count < 15 {
            "Focus on local SEO and Google My Business optimization".to_string()
        } else {
            "Differentiate through specialized services and superior customer experience".to_string()
        },
    }
}

fn immediate_seo_fixes(city: &str, service: &str) -> Vec<ActionItem> {
    vec![
        ActionItem {
            priority: "HIGH".to_string(),
            task: "Add Meta Description to Homepage".to_string(),
            description: format!(
                "Write a compelling 150-160 character summary including \"{}\", \"{}\", and key services.",
                city, service
            ),
            example: format!(
                "\"{}'s trusted {} pros for installation, repairs, and maintenance. Serving residential & commercial clients with guaranteed results.\"",
                city, service
            ),
            timeframe: "1-2 hours".to_string(),
        },
        ActionItem {
            priority: "HIGH".to_string(),
            task: "Update Title Tag".to_string(),
            description: "Change homepage title to include location and primary service.".to_string(),
            example: format!("Your Business Name | {} & Repair Services {}", service, city),
            timeframe: "30 minutes".to_string(),
        },
        ActionItem {
            priority: "MEDIUM".to_string(),
            task: "Add Missing Keywords to Main Page Copy".to_string(),
            description: "Inject geo-targeted keywords naturally into body content.".to_string(),
            example: format!(
                "Include phrases like \"{} {}\", \"local {} contractor\", \"{} {} installation\"",
                service, city, service, city, service
            ),
            timeframe: "2-3 hours".to_string(),
        },
        ActionItem {
            priority: "MEDIUM".to_string(),
            task: "Optimize Image Alt Tags".to_string(),
            description: "Add keyword-rich alt tags to every image on homepage and service pages."
                .to_string(),
            example: format!(
                "Alt text: \"{} installation project in {}\" instead of \"IMG_001.jpg\"",
                service, city
            ),
            timeframe: "1-2 hours".to_string(),
        },
        ActionItem {
            priority: "HIGH".to_string(),
            task: "Update Header Tag Structure (H1-H3)".to_string(),
            description: "Make H1 more specific and add service-focused H2/H3 tags.".to_string(),
            example: format!(
                "H1: \"{} Experts in {}\" | H2: \"Professional Installation Services\" | H3: \"Emergency Repair & Maintenance\"",
                service, city
            ),
            timeframe: "1 hour".to_string(),
        },
    ]
}

fn title_tag_suggestions(city: &str, service: &str) -> Vec<String> {
    let service = title_case(service);
    vec![
        format!("Your Business Name | {} Installation & Repair {}", service, city),
        format!("{} Contractors {} | Professional Installation & Service", service, city),
        format!("Best {} Company {} | Licensed & Insured Professionals", service, city),
        format!("{} {} Experts | Installation, Repair & Maintenance", city, service),
    ]
}

fn meta_suggestions(city: &str, service: &str) -> Vec<String> {
    vec![
        format!(
            "Professional {} installation, repair, and maintenance in {}. Licensed contractors with guaranteed work and competitive pricing. Call today!",
            service, city
        ),
        format!(
            "{}'s trusted {} experts. Quality installation, fast repairs, and reliable service for residential & commercial clients. Free estimates available.",
            city, service
        ),
        format!(
            "Expert {} services in {}. From new installations to emergency repairs, we deliver quality results with satisfaction guaranteed.",
            service, city
        ),
    ]
}

fn content_plan(city: &str, service: &str) -> ContentPlan {
    let titled = title_case(service);
    ContentPlan {
        header_structure: HeaderStructure {
            h1: format!("{} Experts in {}", titled, city),
            h2_suggestions: vec![
                format!("Professional {} Installation", titled),
                format!("{} Repair & Maintenance", titled),
                format!("Emergency {} Services", titled),
                format!("Serving {} & Surrounding Areas", city),
            ],
        },
        geo_targeted_keywords: vec![
            format!("{} {}", service, city),
            format!("{} installation {}", service, city),
            format!("{} repair {}", service, city),
            format!("local {} contractor", service),
            format!("{} {} company", city, service),
        ],
        content_sections: vec![
            format!("Why Choose Our {} Services in {}", titled, city),
            format!("{} Installation Process", titled),
            "Maintenance & Repair Services".to_string(),
            format!("Service Areas in {}", city),
        ],
    }
}

fn technical_recommendations() -> Vec<TechnicalItem> {
    vec![
        TechnicalItem {
            category: "Page Speed".to_string(),
            recommendation: "Optimize images and enable compression".to_string(),
            impact: "HIGH".to_string(),
            effort: "MEDIUM".to_string(),
        },
        TechnicalItem {
            category: "Mobile Optimization".to_string(),
            recommendation: "Ensure responsive design and mobile-friendly navigation".to_string(),
            impact: "HIGH".to_string(),
            effort: "LOW".to_string(),
        },
        TechnicalItem {
            category: "Schema Markup".to_string(),
            recommendation: "Add LocalBusiness and Service schema markup".to_string(),
            impact: "MEDIUM".to_string(),
            effort: "HIGH".to_string(),
        },
        TechnicalItem {
            category: "Internal Linking".to_string(),
            recommendation: "Create service-specific landing pages with internal links".to_string(),
            impact: "MEDIUM".to_string(),
            effort: "MEDIUM".to_string(),
        },
    ]
}

fn assess_competition_level(maps_count: usize, organic_count: usize) -> String {
    let total = maps_count + organic_count;
    if total > 50 {
        "HIGH - Very competitive market with many established players".to_string()
    } else if total > 25 {
        "MEDIUM - Moderate competition with room for growth".to_string()
    } else {
        "LOW - Limited competition, good opportunity for market entry".to_string()
    }
}

fn assess_market_opportunity(all_records: &[NormalizedRecord]) -> String {
    let successful = all_records.iter().filter(|r| !r.error).count();
    if successful > 10 {
        "STRONG - High search volume indicates strong market demand".to_string()
    } else if successful > 5 {
        "MODERATE - Decent search activity with growth potential".to_string()
    } else {
        "LIMITED - Lower search volume, may need broader keyword strategy".to_string()
    }
}

fn key_findings(all_records: &[NormalizedRecord], city: &str, service: &str) -> Vec<String> {
    let mut findings = Vec::new();

    let total = all_records.len();
    let successful = all_records.iter().filter(|r| !r.error).count();
    if successful < total {
        findings.push(format!(
            "{} keywords had no results - opportunity for first-mover advantage",
            total - successful
        ));
    }

    let rated: Vec<f64> = all_records
        .iter()
        .flat_map(|r| r.maps_listings.iter())
        .filter(|l| l.rating != 0.0)
        .map(|l| l.rating)
        .collect();
    if !rated.is_empty() {
        let avg = rated.iter().sum::<f64>() / rated.len() as f64;
        findings.push(format!(
            "Competitors average {:.1} stars - quality service is expected in this market",
            avg
        ));
    }

    let organic_count: usize = all_records.iter().map(|r| r.organic_results.len()).sum();
    if organic_count > 0 {
        findings.push(format!(
            "{} organic competitors found - SEO investment is necessary",
            organic_count
        ));
    }

    findings.push(format!("Local search is active for {} services in {}", service, city));
    findings
}

fn distinct_count<'a>(items: impl Iterator<Item = &'a str>) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen.len()
}

/// Capitalize the first letter of each whitespace-separated word and
/// lowercase the rest, matching how the report has always styled headings.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
