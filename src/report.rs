use crate::types::{
    AggregatedData, GroupRollup, InsightBundle, RanklensError, ReportModel, Result, SummaryReport,
};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Merges aggregated data and insights into the flat structure handed to a
/// report renderer, plus a lightweight summary view for logging and machine
/// consumption.
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        aggregated: &AggregatedData,
        insights: InsightBundle,
        business_name: &str,
        location: &str,
        timestamp: DateTime<Utc>,
    ) -> ReportModel {
        let total_maps_listings = aggregated
            .by_keyword_group
            .iter()
            .map(|(_, stats)| stats.total_maps_listings)
            .sum();
        let total_local_services = aggregated
            .by_keyword_group
            .iter()
            .map(|(_, stats)| stats.total_local_services)
            .sum();
        let total_organic_results = aggregated
            .by_keyword_group
            .iter()
            .map(|(_, stats)| stats.total_organic_results)
            .sum();

        ReportModel {
            run_id: Uuid::new_v4(),
            business_name: business_name.to_string(),
            location: location.to_string(),
            report_date: timestamp.format("%B %d, %Y at %I:%M %p").to_string(),
            total_keywords: aggregated.summary.total_keywords,
            summary: aggregated.summary.clone(),
            total_maps_listings,
            total_local_services,
            total_organic_results,
            results_by_group: aggregated.by_keyword_group.clone(),
            insights,
        }
    }

    /// Key metrics only: business identity, counts, top competing domains by
    /// organic appearance frequency, per-group rollups.
    pub fn summary_report(
        &self,
        aggregated: &AggregatedData,
        business_name: &str,
        location: &str,
    ) -> SummaryReport {
        let mut domain_counts: Vec<(String, u64)> = Vec::new();

        for (_, stats) in &aggregated.by_keyword_group {
            for record in &stats.results {
                if record.error {
                    continue;
                }
                for organic in &record.organic_results {
                    if organic.domain.is_empty() {
                        continue;
                    }
                    match domain_counts.iter().position(|(d, _)| *d == organic.domain) {
                        Some(index) => domain_counts[index].1 += 1,
                        None => domain_counts.push((organic.domain.clone(), 1)),
                    }
                }
            }
        }

        let total_competitors = domain_counts.len();
        domain_counts.sort_by(|a, b| b.1.cmp(&a.1));
        domain_counts.truncate(10);

        SummaryReport {
            business_name: business_name.to_string(),
            location: location.to_string(),
            analysis_date: Utc::now(),
            total_keywords: aggregated.summary.total_keywords,
            successful_searches: aggregated.summary.successful_searches,
            total_competitors,
            top_competing_domains: domain_counts,
            keyword_groups: aggregated
                .by_keyword_group
                .iter()
                .map(|(name, stats)| {
                    (
                        name.clone(),
                        GroupRollup {
                            keyword_count: stats.keyword_count,
                            maps_listings: stats.total_maps_listings,
                            local_services: stats.total_local_services,
                            organic_results: stats.total_organic_results,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary for turning a finished `ReportModel` into rendered output.
///
/// A render failure is fatal to the run; the computed model stays with the
/// caller for diagnostics or a retry.
pub trait ReportRenderer {
    fn render(&self, model: &ReportModel) -> Result<String>;
}

/// Minimal self-contained HTML rendering, used when no richer template
/// pipeline is wired in. Error records are skipped in the body; their counts
/// still show in the header totals.
pub struct BasicHtmlRenderer;

impl ReportRenderer for BasicHtmlRenderer {
    fn render(&self, model: &ReportModel) -> Result<String> {
        let mut html = String::new();
        write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n\
             <title>Local Ranking Report - {}</title>\n\
             <style>\n\
             body {{ font-family: Arial, sans-serif; margin: 40px; }}\n\
             .header {{ background: #f0f0f0; padding: 20px; margin-bottom: 30px; }}\n\
             .group {{ margin-bottom: 30px; border: 1px solid #ddd; padding: 20px; }}\n\
             .keyword {{ margin-bottom: 20px; }}\n\
             .result {{ margin: 10px 0; padding: 10px; background: #f9f9f9; }}\n\
             </style>\n</head>\n<body>\n\
             <div class=\"header\">\n\
             <h1>Local Ranking Report</h1>\n\
             <h2>{} - {}</h2>\n\
             <p>Generated on {}</p>\n\
             <p>Total Keywords: {}</p>\n\
             </div>\n",
            model.business_name,
            model.business_name,
            model.location,
            model.report_date,
            model.total_keywords
        )
        .map_err(|e| RanklensError::Render(e.to_string()))?;

        for (group_name, stats) in &model.results_by_group {
            let _ = write!(html, "<div class=\"group\">\n<h3>{} Keywords</h3>\n", group_name);

            for record in &stats.results {
                if record.error {
                    continue;
                }
                let _ = write!(html, "<div class=\"keyword\">\n<h4>\"{}\"</h4>\n", record.keyword);

                if !record.maps_listings.is_empty() {
                    html.push_str("<h5>Google Maps Listings:</h5>\n");
                    for listing in &record.maps_listings {
                        let _ = write!(
                            html,
                            "<div class=\"result\">\n<strong>{}</strong><br>\n\
                             Rating: {} ({} reviews)<br>\n\
                             Phone: {}<br>\nAddress: {}\n</div>\n",
                            listing.title,
                            listing.rating,
                            listing.reviews,
                            listing.phone,
                            listing.address
                        );
                    }
                }

                if !record.organic_results.is_empty() {
                    html.push_str("<h5>Organic Results:</h5>\n");
                    for organic in &record.organic_results {
                        let _ = write!(
                            html,
                            "<div class=\"result\">\n<strong>{}</strong><br>\n\
                             Domain: {}<br>\nPosition: {}\n</div>\n",
                            organic.title, organic.domain, organic.position
                        );
                    }
                }

                html.push_str("</div>\n");
            }

            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        Ok(html)
    }
}

/// Write rendered output under `output_dir` with a timestamped filename,
/// suffixing a counter when a same-second file already exists.
pub fn write_report(output_dir: &Path, prefix: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let mut filename = format!("{}_{}.html", prefix, timestamp);
    let mut counter = 1;
    while output_dir.join(&filename).exists() {
        filename = format!("{}_{}_{:02}.html", prefix, timestamp, counter);
        counter += 1;
    }

    let path = output_dir.join(filename);
    std::fs::write(&path, content)?;
    info!("Report written to {}", path.display());
    Ok(path)
}
