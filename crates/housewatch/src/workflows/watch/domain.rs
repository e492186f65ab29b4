use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, source-assigned identity of a listing and the dedup key of the seen-set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// School level used to bucket required and observed school names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolTier {
    Elementary,
    Middle,
    High,
}

impl SchoolTier {
    pub const ALL: [SchoolTier; 3] = [SchoolTier::Elementary, SchoolTier::Middle, SchoolTier::High];

    pub fn label(&self) -> &'static str {
        match self {
            SchoolTier::Elementary => "elementary",
            SchoolTier::Middle => "middle",
            SchoolTier::High => "high",
        }
    }
}

impl SchoolTier {
    /// Tier implied by a school's own name, e.g. "Kennedy Junior High" is a middle school.
    /// Names carrying no level word are unclassifiable.
    pub fn classify(name: &str) -> Option<SchoolTier> {
        let words: Vec<String> = name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect();
        let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(&w.as_str()));

        if has(&["elementary", "primary"]) {
            Some(SchoolTier::Elementary)
        } else if has(&["middle", "junior", "intermediate", "jr"]) {
            Some(SchoolTier::Middle)
        } else if has(&["high", "secondary", "hs"]) {
            Some(SchoolTier::High)
        } else {
            None
        }
    }
}

impl fmt::Display for SchoolTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered school names per tier. A tier with no names is an empty list, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolsByTier {
    #[serde(default)]
    pub elementary: Vec<String>,
    #[serde(default)]
    pub middle: Vec<String>,
    #[serde(default)]
    pub high: Vec<String>,
}

impl SchoolsByTier {
    pub fn get(&self, tier: SchoolTier) -> &[String] {
        match tier {
            SchoolTier::Elementary => &self.elementary,
            SchoolTier::Middle => &self.middle,
            SchoolTier::High => &self.high,
        }
    }

    pub fn push(&mut self, tier: SchoolTier, name: impl Into<String>) {
        let names = match tier {
            SchoolTier::Elementary => &mut self.elementary,
            SchoolTier::Middle => &mut self.middle,
            SchoolTier::High => &mut self.high,
        };
        names.push(name.into());
    }

    pub fn is_empty(&self) -> bool {
        SchoolTier::ALL.iter().all(|tier| self.get(*tier).is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchoolTier, &[String])> + '_ {
        SchoolTier::ALL.into_iter().map(|tier| (tier, self.get(tier)))
    }

    /// Flattened names in tier order, for display.
    pub fn all_names(&self) -> Vec<&str> {
        self.iter()
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .collect()
    }
}

/// One listing observation as handed over by a search source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub hoa_fee: Option<f64>,
    #[serde(default)]
    pub beds: Option<u32>,
    #[serde(default)]
    pub baths: Option<f32>,
    #[serde(default)]
    pub sqft: Option<u32>,
    #[serde(default)]
    pub lot_size: Option<f64>,
    #[serde(default)]
    pub schools: SchoolsByTier,
}

impl RawRecord {
    /// Trimmed, non-blank source identifier.
    pub fn identifier(&self) -> Option<&str> {
        self.source_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Per-listing detail page data. Every field is optional; an empty record means
/// "nothing learned", which is also what a failed lookup degrades to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub schools: SchoolsByTier,
    #[serde(default)]
    pub hoa_fee: Option<f64>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingParseError {
    #[error("record has no source identifier")]
    MissingId,
    #[error("listing {id} has no price")]
    MissingPrice { id: String },
    #[error("listing {id} has negative price {price}")]
    NegativePrice { id: String, price: i64 },
    #[error("listing {id} has negative HOA fee {fee}")]
    NegativeHoaFee { id: String, fee: f64 },
}

/// Canonical in-memory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    id: ListingId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub price: u64,
    pub year_built: Option<i32>,
    pub property_type: String,
    pub hoa_fee: f64,
    pub beds: Option<u32>,
    pub baths: Option<f32>,
    pub sqft: Option<u32>,
    pub lot_size: Option<f64>,
    pub schools: SchoolsByTier,
    pub url: String,
}

impl Listing {
    /// Bare listing with every optional attribute unknown.
    pub fn new(id: ListingId, price: u64) -> Self {
        Self {
            id,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            price,
            year_built: None,
            property_type: String::new(),
            hoa_fee: 0.0,
            beds: None,
            baths: None,
            sqft: None,
            lot_size: None,
            schools: SchoolsByTier::default(),
            url: String::new(),
        }
    }

    pub fn from_raw(raw: RawRecord) -> Result<Self, ListingParseError> {
        let id = raw.identifier().ok_or(ListingParseError::MissingId)?.to_string();

        let price = match raw.price {
            None => return Err(ListingParseError::MissingPrice { id }),
            Some(price) if price < 0 => {
                return Err(ListingParseError::NegativePrice { id, price });
            }
            Some(price) => price as u64,
        };

        let hoa_fee = raw.hoa_fee.unwrap_or(0.0);
        if hoa_fee < 0.0 {
            return Err(ListingParseError::NegativeHoaFee { id, fee: hoa_fee });
        }

        let text = |value: Option<String>| value.map(|v| v.trim().to_string()).unwrap_or_default();

        Ok(Self {
            id: ListingId(id),
            address: text(raw.address),
            city: text(raw.city),
            state: text(raw.state),
            zip: text(raw.zip),
            price,
            year_built: raw.year_built,
            property_type: text(raw.property_type),
            hoa_fee,
            beds: raw.beds,
            baths: raw.baths,
            sqft: raw.sqft,
            lot_size: raw.lot_size,
            schools: raw.schools,
            url: text(raw.url),
        })
    }

    pub fn id(&self) -> &ListingId {
        &self.id
    }

    /// "123 Main St, Naperville, IL 60540"
    pub fn full_address(&self) -> String {
        format!("{}, {}, {} {}", self.address, self.city, self.state, self.zip)
    }

    /// "$750,000"
    pub fn formatted_price(&self) -> String {
        let digits = self.price.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("${grouped}")
    }

    /// Applies detail-page data; detail values win where present.
    pub fn apply_detail(&mut self, detail: DetailRecord) {
        self.schools = detail.schools;
        if let Some(fee) = detail.hoa_fee.filter(|fee| *fee >= 0.0) {
            self.hoa_fee = fee;
        }
        if detail.year_built.is_some() {
            self.year_built = detail.year_built;
        }
        if let Some(state) = detail.state.filter(|s| !s.trim().is_empty()) {
            self.state = state.trim().to_string();
        }
    }
}
