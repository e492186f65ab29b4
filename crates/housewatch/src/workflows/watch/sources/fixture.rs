use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DetailSource, ListingSource, QueryPartition, SourceError};
use crate::workflows::watch::domain::{DetailRecord, RawRecord, SchoolTier, SchoolsByTier};

/// Offline source serving the same records for every partition. Detail lookups answer
/// from the record whose URL matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSource {
    #[serde(default)]
    pub listings: Vec<RawRecord>,
}

impl FixtureSource {
    pub fn new(listings: Vec<RawRecord>) -> Self {
        Self { listings }
    }

    /// Loads `{"listings": [...]}` from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SourceError::Fixture {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map_err(|err| SourceError::Payload(format!("{}: {err}", path.display())))
    }

    /// Three Naperville sample listings: one that meets the default criteria, one in the
    /// wrong elementary attendance area and a townhouse with HOA dues.
    pub fn demo() -> Self {
        let schools = |elementary: &str| {
            let mut schools = SchoolsByTier::default();
            schools.push(SchoolTier::Elementary, elementary);
            schools.push(SchoolTier::Middle, "Kennedy Junior High School");
            schools.push(SchoolTier::High, "Naperville North High School");
            schools
        };

        let listing = |id: &str, address: &str, price: i64, year: i32, kind: &str, hoa: f64| RawRecord {
            source_id: Some(id.to_string()),
            price: Some(price),
            address: Some(address.to_string()),
            city: Some("Naperville".to_string()),
            state: Some("IL".to_string()),
            zip: Some("60540".to_string()),
            property_type: Some(kind.to_string()),
            url: Some(format!("https://www.redfin.com/{}", id.replace('_', "-"))),
            year_built: Some(year),
            hoa_fee: Some(hoa),
            ..RawRecord::default()
        };

        let mut first = listing("mock_001", "123 Main Str", 750_000, 1995, "Single-Family", 0.0);
        first.beds = Some(4);
        first.baths = Some(2.5);
        first.sqft = Some(2200);
        first.schools = schools("Highlands Elementary School");

        let mut second = listing("mock_002", "456 Oak Ave", 720_000, 1985, "Single-Family", 0.0);
        second.schools = schools("Different Elementary School");

        let mut third = listing("mock_003", "789 Pine Rd", 650_000, 1999, "Townhouse", 150.0);
        third.schools = schools("Different Elementary School");

        Self::new(vec![first, second, third])
    }
}

#[async_trait]
impl ListingSource for FixtureSource {
    async fn search(&self, partition: &QueryPartition) -> Result<Vec<RawRecord>, SourceError> {
        debug!(partition = %partition, count = self.listings.len(), "serving fixture listings");
        Ok(self.listings.clone())
    }
}

#[async_trait]
impl DetailSource for FixtureSource {
    async fn fetch_detail(&self, url: &str) -> Result<DetailRecord, SourceError> {
        let record = self
            .listings
            .iter()
            .find(|record| record.url.as_deref() == Some(url))
            .ok_or_else(|| SourceError::Unavailable(format!("no fixture listing at {url}")))?;

        Ok(DetailRecord {
            schools: record.schools.clone(),
            hoa_fee: record.hoa_fee,
            year_built: record.year_built,
            state: record.state.clone(),
        })
    }
}
