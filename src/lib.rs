pub mod aggregator;
pub mod config;
pub mod extractor;
pub mod insights;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod types;

pub use aggregator::Aggregator;
pub use config::{api_key_from_env, AnalysisConfig, KeywordGroup, Location, ReportSettings};
pub use extractor::{extract_domain, ResultExtractor};
pub use insights::InsightSynthesizer;
pub use pipeline::{AnalysisOutcome, AnalysisRun};
pub use provider::{SearchBackend, SearchOptions, SerpClient};
pub use report::{write_report, BasicHtmlRenderer, ReportAssembler, ReportRenderer};
pub use types::*;
