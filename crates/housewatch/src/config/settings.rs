use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::workflows::watch::{
    Criteria, EmailSettings, EnrichmentSettings, QueryPartition, SearchFilters,
};

/// Contents of the watch settings YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSettings {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub criteria: Criteria,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub email: Option<EmailSettings>,
}

impl WatchSettings {
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&raw).map_err(|err| match err {
            SettingsError::Parse { source, .. } => SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), "watch settings loaded");
        Ok(settings)
    }

    /// Parses YAML after substituting `${VAR}` references from the environment.
    pub fn from_yaml(raw: &str) -> Result<Self, SettingsError> {
        let expanded = substitute_env(raw);
        serde_yaml::from_str(&expanded).map_err(|source| SettingsError::Parse {
            path: PathBuf::new(),
            source,
        })
    }
}

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env reference pattern compiles")
});

/// Replaces `${VAR}` with the variable's value. Unset variables stay verbatim.
fn substitute_env(raw: &str) -> String {
    ENV_REFERENCE
        .replace_all(raw, |caps: &Captures<'_>| {
            let name = &caps[1];
            match env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    warn!(variable = name, "settings reference unset environment variable");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RegionId {
    Number(u64),
    Text(String),
}

impl RegionId {
    fn into_string(self) -> String {
        match self {
            RegionId::Number(value) => value.to_string(),
            RegionId::Text(value) => value.trim().to_string(),
        }
    }
}

/// Where to search and with which source-side filters.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub partitions: Vec<QueryPartition>,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(default)]
    pub region_type: Option<u8>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_lat_delta")]
    pub lat_delta: f64,
    #[serde(default = "default_long_delta")]
    pub long_delta: f64,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            partitions: Vec::new(),
            region_id: None,
            region_type: None,
            latitude: None,
            longitude: None,
            lat_delta: default_lat_delta(),
            long_delta: default_long_delta(),
            market: None,
            filters: SearchFilters::default(),
            timeout_secs: default_search_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_lat_delta() -> f64 {
    0.15
}

fn default_long_delta() -> f64 {
    0.18
}

fn default_search_timeout_secs() -> u64 {
    15
}

impl SearchSettings {
    /// Explicit partitions when given; otherwise the single legacy target, taking the
    /// first present of region, coordinates and market. Empty when nothing is configured.
    pub fn resolve_partitions(&self) -> Vec<QueryPartition> {
        if !self.partitions.is_empty() {
            return self.partitions.clone();
        }

        if let Some(region_id) = self.region_id.clone().map(RegionId::into_string) {
            if !region_id.is_empty() {
                return vec![QueryPartition::Region {
                    region_id,
                    region_type: self.region_type.unwrap_or(6),
                }];
            }
        }

        if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
            return vec![QueryPartition::BoundingBox {
                min_lat: lat - self.lat_delta,
                max_lat: lat + self.lat_delta,
                min_lng: lng - self.long_delta,
                max_lng: lng + self.long_delta,
            }];
        }

        match self.market.as_deref().map(str::trim) {
            Some(market) if !market.is_empty() => vec![QueryPartition::Market {
                market: market.to_string(),
            }],
            _ => Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Detail lookup tuning as written in the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_enrichment_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            concurrency: default_concurrency(),
            min_interval_ms: default_min_interval_ms(),
            timeout_secs: default_enrichment_timeout_secs(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_enrichment_timeout_secs() -> u64 {
    10
}

impl EnrichmentConfig {
    pub fn to_settings(&self) -> EnrichmentSettings {
        EnrichmentSettings {
            enabled: self.enabled,
            concurrency: self.concurrency.max(1),
            min_interval: Duration::from_millis(self.min_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
    #[default]
    Redfin,
    Fixture { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
