//! Fetch and detail collaborators: where raw listing records come from.

pub mod fixture;
pub mod redfin;

pub use fixture::FixtureSource;
pub use redfin::RedfinClient;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{DetailRecord, RawRecord};

/// One slice of the search space, fetched independently of the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryPartition {
    Region {
        region_id: String,
        #[serde(default = "default_region_type")]
        region_type: u8,
    },
    BoundingBox {
        min_lat: f64,
        max_lat: f64,
        min_lng: f64,
        max_lng: f64,
    },
    Market {
        market: String,
    },
}

fn default_region_type() -> u8 {
    6
}

impl fmt::Display for QueryPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPartition::Region {
                region_id,
                region_type,
            } => write!(f, "region:{region_id}/{region_type}"),
            QueryPartition::BoundingBox {
                min_lat,
                max_lat,
                min_lng,
                max_lng,
            } => write!(f, "bbox:{min_lat},{min_lng}..{max_lat},{max_lng}"),
            QueryPartition::Market { market } => write!(f, "market:{market}"),
        }
    }
}

/// Search collaborator. An error is scoped to the one partition that produced it.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn search(&self, partition: &QueryPartition) -> Result<Vec<RawRecord>, SourceError>;
}

/// Per-listing detail collaborator, keyed by detail URL.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, url: &str) -> Result<DetailRecord, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unexpected payload: {0}")]
    Payload(String),
    #[error("could not read fixture {path}: {source}")]
    Fixture {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("source unavailable: {0}")]
    Unavailable(String),
}
