use serde::{Deserialize, Serialize};

use super::super::domain::SchoolTier;

/// Binary decision for one listing; rejections carry the first rule that failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched,
    Rejected(RejectionReason),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched)
    }

    pub fn summary(&self) -> String {
        match self {
            MatchOutcome::Matched => "matched all criteria".to_string(),
            MatchOutcome::Rejected(reason) => reason.summary(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    PropertyType { required: String, actual: String },
    BuiltBefore { min_year: i32, actual: i32 },
    HoaFeeAbove { max_fee: f64, actual: f64 },
    PriceAtOrAboveCeiling { max_price: u64, actual: u64 },
    PriceBelowFloor { min_price: u64, actual: u64 },
    OutOfState { required: String, actual: String },
    SchoolTierUnmet(SchoolTier),
}

impl RejectionReason {
    pub fn summary(&self) -> String {
        match self {
            RejectionReason::PropertyType { required, actual } => {
                format!("property type '{actual}' is not '{required}'")
            }
            RejectionReason::BuiltBefore { min_year, actual } => {
                format!("built in {actual}, before {min_year}")
            }
            RejectionReason::HoaFeeAbove { max_fee, actual } => {
                format!("HOA fee {actual:.2} exceeds {max_fee:.2}")
            }
            RejectionReason::PriceAtOrAboveCeiling { max_price, actual } => {
                format!("price {actual} is not below {max_price}")
            }
            RejectionReason::PriceBelowFloor { min_price, actual } => {
                format!("price {actual} is below {min_price}")
            }
            RejectionReason::OutOfState { required, actual } => {
                format!("located in '{actual}', not '{required}'")
            }
            RejectionReason::SchoolTierUnmet(tier) => {
                format!("no required {tier} school observed")
            }
        }
    }
}
