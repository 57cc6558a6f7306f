use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata echoed back by the provider for one search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub query: String,
    pub location: String,
    pub total_results: u64,
    pub time_taken: f64,
    pub search_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One local-business result from the map pack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapsListing {
    pub position: u32,
    pub title: String,
    pub rating: f64,
    pub reviews: u64,
    pub business_type: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub hours: String,
    pub gps_coordinates: Option<GpsCoordinates>,
    pub place_id: String,
}

/// A paid, verified-provider local services ad.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalServiceAd {
    pub position: u32,
    pub title: String,
    pub phone: String,
    pub rating: f64,
    pub reviews: u64,
    pub years_in_business: String,
    pub license_info: String,
    pub service_areas: Vec<String>,
}

/// An unpaid ranked web result. `domain` is derived from `link`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganicResult {
    pub position: u32,
    pub title: String,
    pub link: String,
    pub domain: String,
    pub snippet: String,
    pub displayed_link: String,
    pub sitelinks: Vec<serde_json::Value>,
    pub rich_snippet: serde_json::Value,
}

/// A standard paid search ad. `domain` is derived from `link`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaidAd {
    pub position: u32,
    pub title: String,
    pub link: String,
    pub domain: String,
    pub displayed_link: String,
    pub snippet: String,
    pub extensions: Vec<String>,
    pub tracking_link: String,
}

/// Structured single-entity panel returned for well-known businesses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub title: String,
    pub entity_type: String,
    pub description: String,
    pub website: String,
    pub phone: String,
    pub address: String,
    pub rating: f64,
    pub reviews: u64,
}

/// The per-keyword canonical record produced by the extractor.
///
/// Extraction is total: on any structural failure the record degrades to this
/// shape with every list empty and `error` set, so downstream stages never
/// see a panic from one bad keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub keyword: String,
    pub keyword_group: String,
    pub search_metadata: SearchMetadata,
    pub maps_listings: Vec<MapsListing>,
    pub local_services_ads: Vec<LocalServiceAd>,
    pub organic_results: Vec<OrganicResult>,
    pub ads: Vec<PaidAd>,
    pub knowledge_graph: Option<KnowledgeGraph>,
    pub error: bool,
    pub error_message: Option<String>,
}

impl NormalizedRecord {
    /// Empty-but-valid record for a keyword whose search or extraction failed.
    pub fn empty(keyword: &str, keyword_group: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            keyword_group: keyword_group.to_string(),
            search_metadata: SearchMetadata::default(),
            maps_listings: Vec::new(),
            local_services_ads: Vec::new(),
            organic_results: Vec::new(),
            ads: Vec::new(),
            knowledge_graph: None,
            error: true,
            error_message: None,
        }
    }
}

/// Whole-run keyword counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_keywords: usize,
    pub successful_searches: usize,
    pub failed_searches: usize,
}

/// Per-group statistics plus the member records, in keyword order.
///
/// Listing totals are summed over every member record including error ones
/// (their lists are empty, contributing zero); only `successful_searches`
/// filters on the error flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupStats {
    pub keyword_count: usize,
    pub successful_searches: usize,
    pub total_maps_listings: usize,
    pub total_local_services: usize,
    pub total_organic_results: usize,
    pub results: Vec<NormalizedRecord>,
}

/// Output of the aggregation fold. Immutable after construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatedData {
    pub summary: RunSummary,
    /// Group name -> stats, in first-seen group order.
    pub by_keyword_group: Vec<(String, GroupStats)>,
    pub all_records: Vec<NormalizedRecord>,
}

impl AggregatedData {
    pub fn group(&self, name: &str) -> Option<&GroupStats> {
        self.by_keyword_group
            .iter()
            .find(|(group, _)| group == name)
            .map(|(_, stats)| stats)
    }
}

/// A maps-pack competitor accumulated across keywords.
///
/// `rating`/`reviews` carry the most recently seen listing's values
/// (last-write-wins, not a max or an average).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapsCompetitor {
    pub name: String,
    pub appearances: u64,
    pub rating: f64,
    pub reviews: u64,
    pub phone: String,
    pub keywords: Vec<String>,
}

/// An organic-search competitor keyed by domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganicCompetitor {
    pub domain: String,
    pub appearances: u64,
    pub keywords: Vec<String>,
    pub positions: Vec<u32>,
    pub avg_position: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_saturation: String,
    pub opportunity_score: u32,
    pub recommended_strategy: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    pub total_maps_competitors: usize,
    pub total_organic_competitors: usize,
    pub top_maps_competitors: Vec<MapsCompetitor>,
    pub top_organic_competitors: Vec<OrganicCompetitor>,
    pub market_analysis: MarketAnalysis,
}

/// One immediate SEO fix with templated example copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: String,
    pub task: String,
    pub description: String,
    pub example: String,
    pub timeframe: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalItem {
    pub category: String,
    pub recommendation: String,
    pub impact: String,
    pub effort: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderStructure {
    pub h1: String,
    pub h2_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPlan {
    pub header_structure: HeaderStructure,
    pub geo_targeted_keywords: Vec<String>,
    pub content_sections: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoRecommendations {
    pub immediate_fixes: Vec<ActionItem>,
    pub title_tag_suggestions: Vec<String>,
    pub meta_description_suggestions: Vec<String>,
    pub content_optimization: ContentPlan,
    pub technical_seo: Vec<TechnicalItem>,
}

/// Competitor profile averages; each average is computed independently over
/// the listings that actually report that field, so the two subsets may
/// differ in size.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmbBenchmarks {
    pub average_rating: f64,
    pub average_reviews: u64,
    pub top_rated_competitor: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingIdea {
    pub frequency: String,
    pub post_type: String,
    pub example: String,
    pub cta: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GmbRecommendations {
    pub competitive_benchmarks: GmbBenchmarks,
    pub posting_strategy: Vec<PostingIdea>,
    pub photo_strategy: Vec<String>,
    pub review_strategy: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketOverview {
    pub competition_level: String,
    pub market_opportunity: String,
    pub key_findings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaymanExplanation {
    pub why_not_showing_up: Vec<String>,
    pub whats_getting_fixed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextStep {
    pub priority: u32,
    pub action: String,
    pub description: String,
    pub timeline: String,
    pub impact: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessInsights {
    pub market_overview: MarketOverview,
    pub layman_explanation: LaymanExplanation,
    pub next_steps: Vec<NextStep>,
}

/// Derived competitive output. Pure function of `AggregatedData`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightBundle {
    pub competitive_analysis: CompetitiveAnalysis,
    pub seo_recommendations: SeoRecommendations,
    pub gmb_recommendations: GmbRecommendations,
    pub business_insights: BusinessInsights,
}

/// The flat structure handed to a report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportModel {
    pub run_id: Uuid,
    pub business_name: String,
    pub location: String,
    pub report_date: String,
    pub total_keywords: usize,
    pub summary: RunSummary,
    pub total_maps_listings: usize,
    pub total_local_services: usize,
    pub total_organic_results: usize,
    pub results_by_group: Vec<(String, GroupStats)>,
    pub insights: InsightBundle,
}

/// Per-group rollup for the lightweight summary view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRollup {
    pub keyword_count: usize,
    pub maps_listings: usize,
    pub local_services: usize,
    pub organic_results: usize,
}

/// Lightweight machine-consumption view, distinct from the full render model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub business_name: String,
    pub location: String,
    pub analysis_date: DateTime<Utc>,
    pub total_keywords: usize,
    pub successful_searches: usize,
    pub total_competitors: usize,
    pub top_competing_domains: Vec<(String, u64)>,
    pub keyword_groups: Vec<(String, GroupRollup)>,
}

/// Provider client tuning knobs.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub rate_limit_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com/search".to_string(),
            user_agent: "ranklens/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 1,
            rate_limit_delay_ms: 1500,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RanklensError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RanklensError>;
