use crate::types::{AggregatedData, GroupStats, NormalizedRecord, RunSummary};
use tracing::info;

/// Folds per-keyword records into whole-run and per-group statistics.
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic fold: summary counts over the whole input, then a
    /// grouping pass preserving first-seen group order.
    ///
    /// Listing-count sums include error records (their lists are empty, so
    /// they contribute zero); only `successful_searches` filters on the
    /// error flag.
    pub fn fold(&self, records: Vec<NormalizedRecord>) -> AggregatedData {
        let summary = RunSummary {
            total_keywords: records.len(),
            successful_searches: records.iter().filter(|r| !r.error).count(),
            failed_searches: records.iter().filter(|r| r.error).count(),
        };

        let mut by_keyword_group: Vec<(String, GroupStats)> = Vec::new();
        for record in &records {
            let index = match by_keyword_group
                .iter()
                .position(|(name, _)| *name == record.keyword_group)
            {
                Some(index) => index,
                None => {
                    by_keyword_group.push((record.keyword_group.clone(), GroupStats::default()));
                    by_keyword_group.len() - 1
                }
            };
            let stats = &mut by_keyword_group[index].1;

            stats.keyword_count += 1;
            if !record.error {
                stats.successful_searches += 1;
            }
            stats.total_maps_listings += record.maps_listings.len();
            stats.total_local_services += record.local_services_ads.len();
            stats.total_organic_results += record.organic_results.len();
            stats.results.push(record.clone());
        }

        info!(
            "Aggregated {} search results into {} groups",
            records.len(),
            by_keyword_group.len()
        );

        AggregatedData {
            summary,
            by_keyword_group,
            all_records: records,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
