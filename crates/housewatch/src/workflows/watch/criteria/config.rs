use serde::{Deserialize, Serialize};

use super::super::domain::SchoolsByTier;

/// Immutable per-run matching policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub property: PropertyRules,
    /// Required school names per tier; an empty tier places no constraint.
    #[serde(default)]
    pub schools: SchoolsByTier,
}

/// Property-attribute thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRules {
    #[serde(default = "default_property_type")]
    pub property_type: String,
    #[serde(default = "default_min_year_built")]
    pub min_year_built: i32,
    #[serde(default, alias = "hoa_fee")]
    pub max_hoa_fee: f64,
    /// Exclusive ceiling: a listing priced exactly here is rejected.
    #[serde(default = "default_max_price")]
    pub max_price: u64,
    #[serde(default)]
    pub min_price: Option<u64>,
    /// Two-letter state code the listing must be located in, when set.
    #[serde(default)]
    pub state: Option<String>,
}

impl Default for PropertyRules {
    fn default() -> Self {
        Self {
            property_type: default_property_type(),
            min_year_built: default_min_year_built(),
            max_hoa_fee: 0.0,
            max_price: default_max_price(),
            min_price: None,
            state: None,
        }
    }
}

fn default_property_type() -> String {
    "Single-Family".to_string()
}

fn default_min_year_built() -> i32 {
    1980
}

fn default_max_price() -> u64 {
    800_000
}
