use super::super::domain::Listing;
use super::config::PropertyRules;
use super::policy::RejectionReason;

/// Deterministic attribute checks; returns the first failing rule.
pub(crate) fn check_property(listing: &Listing, rules: &PropertyRules) -> Option<RejectionReason> {
    if !listing
        .property_type
        .trim()
        .eq_ignore_ascii_case(rules.property_type.trim())
    {
        return Some(RejectionReason::PropertyType {
            required: rules.property_type.clone(),
            actual: listing.property_type.clone(),
        });
    }

    if let Some(year) = listing.year_built {
        if year < rules.min_year_built {
            return Some(RejectionReason::BuiltBefore {
                min_year: rules.min_year_built,
                actual: year,
            });
        }
    }

    if listing.hoa_fee > rules.max_hoa_fee {
        return Some(RejectionReason::HoaFeeAbove {
            max_fee: rules.max_hoa_fee,
            actual: listing.hoa_fee,
        });
    }

    if listing.price >= rules.max_price {
        return Some(RejectionReason::PriceAtOrAboveCeiling {
            max_price: rules.max_price,
            actual: listing.price,
        });
    }

    if let Some(min_price) = rules.min_price {
        if listing.price < min_price {
            return Some(RejectionReason::PriceBelowFloor {
                min_price,
                actual: listing.price,
            });
        }
    }

    if let Some(state) = rules.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !listing.state.trim().eq_ignore_ascii_case(state) {
            return Some(RejectionReason::OutOfState {
                required: state.to_string(),
                actual: listing.state.clone(),
            });
        }
    }

    None
}
