//! Redfin GIS search endpoint and listing detail pages.

mod detail;
mod search;

pub use detail::parse_detail_page;
pub use search::{parse_search_response, property_type_label};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DetailSource, ListingSource, QueryPartition, SourceError};
use crate::workflows::watch::domain::{DetailRecord, RawRecord};

pub const BASE_URL: &str = "https://www.redfin.com/stingray/api/gis";
pub const SITE_URL: &str = "https://www.redfin.com";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Search-time filters sent to the source. These narrow what is fetched; the criteria
/// matcher still decides what counts as a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub min_beds: Option<u32>,
    #[serde(default)]
    pub min_baths: Option<u32>,
    #[serde(default = "default_num_homes")]
    pub num_homes: u32,
    #[serde(default = "default_status")]
    pub status: u8,
    #[serde(default = "default_uipt")]
    pub uipt: String,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            min_price: None,
            max_price: None,
            min_beds: None,
            min_baths: None,
            num_homes: default_num_homes(),
            status: default_status(),
            uipt: default_uipt(),
        }
    }
}

fn default_num_homes() -> u32 {
    350
}

fn default_status() -> u8 {
    1
}

fn default_uipt() -> String {
    "1".to_string()
}

/// Query string for one partition under the given filters.
pub fn search_params(partition: &QueryPartition, filters: &SearchFilters) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("al", "1".to_string()),
        ("v", "8".to_string()),
        ("num_homes", filters.num_homes.to_string()),
        ("status", filters.status.to_string()),
        ("uipt", filters.uipt.clone()),
    ];

    match partition {
        QueryPartition::Region {
            region_id,
            region_type,
        } => {
            params.push(("region_id", region_id.clone()));
            params.push(("region_type", region_type.to_string()));
        }
        QueryPartition::BoundingBox {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        } => {
            params.push(("minLat", min_lat.to_string()));
            params.push(("maxLat", max_lat.to_string()));
            params.push(("minLng", min_lng.to_string()));
            params.push(("maxLng", max_lng.to_string()));
        }
        QueryPartition::Market { market } => params.push(("market", market.clone())),
    }

    if let Some(value) = filters.min_price {
        params.push(("min_price", value.to_string()));
    }
    if let Some(value) = filters.max_price {
        params.push(("max_price", value.to_string()));
    }
    if let Some(value) = filters.min_beds {
        params.push(("min_num_beds", value.to_string()));
    }
    if let Some(value) = filters.min_baths {
        params.push(("min_num_baths", value.to_string()));
    }

    params
}

/// HTTP client for both the search endpoint and detail pages.
#[derive(Debug, Clone)]
pub struct RedfinClient {
    client: Client,
    filters: SearchFilters,
    base_url: String,
}

impl RedfinClient {
    pub fn new(
        filters: SearchFilters,
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/html"));

        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            filters,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Points searches at another endpoint, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_text(&self, url: &str, query: &[(&'static str, String)]) -> Result<String, SourceError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ListingSource for RedfinClient {
    async fn search(&self, partition: &QueryPartition) -> Result<Vec<RawRecord>, SourceError> {
        let params = search_params(partition, &self.filters);
        debug!(partition = %partition, "requesting search results");
        let body = self.get_text(&self.base_url, &params).await?;
        parse_search_response(&body)
    }
}

#[async_trait]
impl DetailSource for RedfinClient {
    async fn fetch_detail(&self, url: &str) -> Result<DetailRecord, SourceError> {
        let body = self.get_text(url, &[]).await?;
        Ok(parse_detail_page(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn region_partition_sets_region_params_and_filters() {
        let filters = SearchFilters {
            min_price: Some(200_000),
            min_beds: Some(3),
            ..SearchFilters::default()
        };
        let params = search_params(
            &QueryPartition::Region {
                region_id: "29501".to_string(),
                region_type: 6,
            },
            &filters,
        );

        assert_eq!(lookup(&params, "region_id"), Some("29501"));
        assert_eq!(lookup(&params, "region_type"), Some("6"));
        assert_eq!(lookup(&params, "num_homes"), Some("350"));
        assert_eq!(lookup(&params, "min_price"), Some("200000"));
        assert_eq!(lookup(&params, "min_num_beds"), Some("3"));
        assert_eq!(lookup(&params, "max_price"), None);
        assert_eq!(lookup(&params, "market"), None);
    }

    #[test]
    fn bounding_box_partition_sets_corner_params() {
        let params = search_params(
            &QueryPartition::BoundingBox {
                min_lat: 41.5,
                max_lat: 42.0,
                min_lng: -88.5,
                max_lng: -88.0,
            },
            &SearchFilters::default(),
        );
        assert_eq!(lookup(&params, "minLat"), Some("41.5"));
        assert_eq!(lookup(&params, "maxLng"), Some("-88"));
        assert_eq!(lookup(&params, "region_id"), None);
    }
}
