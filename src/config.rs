use crate::types::{RanklensError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::info;

/// City + state/region, used verbatim in provider queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

/// Report tuning knobs, all optional in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub include_maps_listings: bool,
    pub include_local_services: bool,
    pub include_organic_results: bool,
    pub max_maps_results: usize,
    pub max_organic_results: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            include_maps_listings: true,
            include_local_services: true,
            include_organic_results: true,
            max_maps_results: 3,
            max_organic_results: 5,
        }
    }
}

/// A named bucket of related search phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Caller-supplied analysis configuration.
///
/// The config file carries keywords as an object of group name -> phrase
/// list; group order in the file is the order groups are processed and
/// reported in.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub business_name: String,
    pub location: Location,
    #[serde(deserialize_with = "deserialize_keyword_groups")]
    pub keywords: Vec<KeywordGroup>,
    pub output_prefix: String,
    #[serde(default)]
    pub report_settings: ReportSettings,
}

fn deserialize_keyword_groups<'de, D>(deserializer: D) -> std::result::Result<Vec<KeywordGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    // serde_json's preserve_order feature keeps the file's group order here.
    let map = serde_json::Map::deserialize(deserializer)?;
    let mut groups = Vec::with_capacity(map.len());
    for (name, value) in map {
        let keywords: Vec<String> =
            serde_json::from_value(value).map_err(serde::de::Error::custom)?;
        groups.push(KeywordGroup { name, keywords });
    }
    Ok(groups)
}

impl AnalysisConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RanklensError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            RanklensError::Config(format!("invalid JSON in {}: {}", path.display(), e))
        })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Structural validation; a failure here aborts before any provider call.
    pub fn validate(&self) -> Result<()> {
        if self.business_name.trim().is_empty() {
            return Err(RanklensError::Config(
                "'business_name' must be a non-empty string".to_string(),
            ));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(RanklensError::Config(
                "'output_prefix' must be a non-empty string".to_string(),
            ));
        }
        for (field, value) in [("city", &self.location.city), ("state", &self.location.state)] {
            if value.trim().is_empty() {
                return Err(RanklensError::Config(format!(
                    "location field '{}' must be a non-empty string",
                    field
                )));
            }
        }
        if self.keywords.is_empty() {
            return Err(RanklensError::Config(
                "at least one keyword group must be defined".to_string(),
            ));
        }
        for group in &self.keywords {
            if group.keywords.is_empty() {
                return Err(RanklensError::Config(format!(
                    "keyword group '{}' cannot be empty",
                    group.name
                )));
            }
            for keyword in &group.keywords {
                if keyword.trim().is_empty() {
                    return Err(RanklensError::Config(format!(
                        "all keywords in '{}' must be non-empty strings",
                        group.name
                    )));
                }
            }
        }
        info!("Configuration validation passed");
        Ok(())
    }

    /// Location formatted for provider queries, e.g. "Spokane, WA".
    pub fn location_string(&self) -> String {
        format!("{}, {}", self.location.city, self.location.state)
    }

    pub fn flat_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .flat_map(|group| group.keywords.iter().cloned())
            .collect()
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.keywords.iter().map(|g| g.name.as_str()).collect()
    }
}

/// Read the provider API key from the environment. A missing key is a fatal
/// precondition, checked before any query is issued.
pub fn api_key_from_env() -> Result<String> {
    std::env::var("SERPAPI_KEY").map_err(|_| {
        RanklensError::Config(
            "SERPAPI_KEY not found in environment variables. \
             Please set it before running an analysis."
                .to_string(),
        )
    })
}
