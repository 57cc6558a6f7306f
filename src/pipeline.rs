use crate::aggregator::Aggregator;
use crate::config::AnalysisConfig;
use crate::extractor::ResultExtractor;
use crate::insights::InsightSynthesizer;
use crate::provider::SearchBackend;
use crate::report::{write_report, ReportAssembler, ReportRenderer};
use crate::types::{AggregatedData, NormalizedRecord, ReportModel, Result, SummaryReport};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{error, info};

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report_path: PathBuf,
    pub model: ReportModel,
    pub summary: SummaryReport,
}

/// Coordinates one analysis run: sequential searches, normalization,
/// aggregation, insight synthesis, report assembly and rendering.
///
/// Keywords are processed strictly sequentially in group order then keyword
/// order, because the backend enforces one shared rate-limit timer. A failed
/// keyword becomes an error-flagged record and never aborts the batch.
pub struct AnalysisRun {
    config: AnalysisConfig,
    backend: Box<dyn SearchBackend>,
    renderer: Box<dyn ReportRenderer>,
    output_dir: PathBuf,
    extractor: ResultExtractor,
    aggregator: Aggregator,
    synthesizer: InsightSynthesizer,
    assembler: ReportAssembler,
}

impl AnalysisRun {
    pub fn new(
        config: AnalysisConfig,
        backend: Box<dyn SearchBackend>,
        renderer: Box<dyn ReportRenderer>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            backend,
            renderer,
            output_dir,
            extractor: ResultExtractor::new(),
            aggregator: Aggregator::new(),
            synthesizer: InsightSynthesizer::new(),
            assembler: ReportAssembler::new(),
        }
    }

    /// Search and normalize every configured keyword. One record per
    /// keyword, always, provider failures included.
    pub async fn collect_records(&self) -> Vec<NormalizedRecord> {
        let location = self.config.location_string();
        let mut records = Vec::new();

        for group in &self.config.keywords {
            info!(
                "Processing {} keywords ({} keywords)",
                group.name,
                group.keywords.len()
            );

            for keyword in &group.keywords {
                match self.backend.search(keyword, &location).await {
                    Ok(raw) => {
                        records.push(self.extractor.normalize(&raw, keyword, &group.name));
                        info!("Successfully processed: {}", keyword);
                    }
                    Err(e) => {
                        error!("Search failed for '{}': {}", keyword, e);
                        let mut record = NormalizedRecord::empty(keyword, &group.name);
                        record.error_message = Some(e.to_string());
                        records.push(record);
                    }
                }
            }
        }

        records
    }

    /// Compute the full report model without rendering. Useful when a render
    /// failure needs diagnosing: everything up to the renderer boundary is
    /// available here.
    pub async fn analyze(&self) -> (AggregatedData, ReportModel) {
        info!(
            "Analyzing {} in {}",
            self.config.business_name,
            self.config.location_string()
        );

        let records = self.collect_records().await;

        info!("Aggregating results for reporting");
        let aggregated = self.aggregator.fold(records);
        let insights = self.synthesizer.derive(&aggregated);
        let model = self.assembler.assemble(
            &aggregated,
            insights,
            &self.config.business_name,
            &self.config.location_string(),
            Utc::now(),
        );
        (aggregated, model)
    }

    /// The complete workflow: analyze, render, write, log summary stats.
    pub async fn run(&self) -> Result<AnalysisOutcome> {
        let (aggregated, model) = self.analyze().await;

        info!("Rendering report");
        let rendered = self.renderer.render(&model)?;
        let report_path = write_report(&self.output_dir, &self.config.output_prefix, &rendered)?;

        let summary = self.assembler.summary_report(
            &aggregated,
            &self.config.business_name,
            &self.config.location_string(),
        );
        log_summary_stats(&summary);

        info!(
            "Analysis completed successfully. Report saved to: {}",
            report_path.display()
        );

        Ok(AnalysisOutcome {
            report_path,
            model,
            summary,
        })
    }
}

fn log_summary_stats(summary: &SummaryReport) {
    info!("=== ANALYSIS SUMMARY ===");
    info!("Business: {}", summary.business_name);
    info!("Location: {}", summary.location);
    info!("Total Keywords: {}", summary.total_keywords);
    info!("Successful Searches: {}", summary.successful_searches);
    info!("Total Competitors Found: {}", summary.total_competitors);

    if !summary.top_competing_domains.is_empty() {
        info!("Top Competing Domains:");
        for (domain, count) in summary.top_competing_domains.iter().take(5) {
            info!("  - {}: {} appearances", domain, count);
        }
    }

    for (group_name, rollup) in &summary.keyword_groups {
        info!("{} Group:", group_name);
        info!("  - Keywords: {}", rollup.keyword_count);
        info!("  - Maps Listings: {}", rollup.maps_listings);
        info!("  - Local Services: {}", rollup.local_services);
        info!("  - Organic Results: {}", rollup.organic_results);
    }
}
