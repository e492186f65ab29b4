mod config;
mod policy;
mod rules;
mod schools;

pub use config::{Criteria, PropertyRules};
pub use policy::{MatchOutcome, RejectionReason};
pub use schools::tokens_match;

use super::domain::Listing;

/// Stateless evaluator applying one run's criteria to listings. Never mutates its inputs.
#[derive(Debug, Clone)]
pub struct CriteriaMatcher {
    criteria: Criteria,
}

impl CriteriaMatcher {
    pub fn new(criteria: Criteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Property check AND school check (all three tiers).
    pub fn evaluate(&self, listing: &Listing) -> MatchOutcome {
        if let Some(reason) = rules::check_property(listing, &self.criteria.property) {
            return MatchOutcome::Rejected(reason);
        }

        match schools::first_unmet_tier(&self.criteria.schools, &listing.schools) {
            Some(tier) => MatchOutcome::Rejected(RejectionReason::SchoolTierUnmet(tier)),
            None => MatchOutcome::Matched,
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.evaluate(listing).is_match()
    }
}
