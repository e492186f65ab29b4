use super::common::*;
use crate::workflows::watch::criteria::{CriteriaMatcher, MatchOutcome, RejectionReason};
use crate::workflows::watch::domain::SchoolTier;

#[test]
fn passing_listing_matches_all_rules() {
    let matcher = CriteriaMatcher::new(criteria());
    assert_eq!(matcher.evaluate(&passing_listing("a")), MatchOutcome::Matched);
}

#[test]
fn every_tier_must_pass_independently() {
    let matcher = CriteriaMatcher::new(criteria());

    let mut failing_high = passing_listing("a");
    failing_high.schools = schools(
        &["Highlands Elementary"],
        &["Kennedy Junior High"],
        &["Naperville Central High School"],
    );
    assert_eq!(
        matcher.evaluate(&failing_high),
        MatchOutcome::Rejected(RejectionReason::SchoolTierUnmet(SchoolTier::High))
    );

    let mut fixed = failing_high.clone();
    fixed.schools.high = vec!["Naperville North HS".to_string()];
    assert!(matcher.matches(&fixed));

    for tier in [SchoolTier::Elementary, SchoolTier::Middle] {
        let mut listing = passing_listing("b");
        match tier {
            SchoolTier::Elementary => listing.schools.elementary = vec!["Mill Street Elementary".to_string()],
            _ => listing.schools.middle = vec!["Jefferson Junior High".to_string()],
        }
        assert_eq!(
            matcher.evaluate(&listing),
            MatchOutcome::Rejected(RejectionReason::SchoolTierUnmet(tier))
        );
    }
}

#[test]
fn observed_school_in_another_tier_does_not_count() {
    let matcher = CriteriaMatcher::new(criteria());
    let mut listing = passing_listing("a");
    listing.schools.high.clear();
    listing.schools.middle.push(NAPERVILLE_NORTH.to_string());
    assert!(!matcher.matches(&listing));
}

#[test]
fn unconstrained_tiers_are_satisfied_without_observations() {
    let mut only_high = criteria();
    only_high.schools = schools(&[], &[], &[NAPERVILLE_NORTH]);
    let matcher = CriteriaMatcher::new(only_high);

    let mut listing = passing_listing("a");
    listing.schools = schools(&[], &[], &["North High (Naperville)"]);
    assert!(matcher.matches(&listing));

    listing.schools = schools(&[], &[], &[]);
    assert!(!matcher.matches(&listing));
}

#[test]
fn any_required_name_in_a_tier_is_enough() {
    let mut either_high = criteria();
    either_high.schools.high = vec![
        "Neuqua Valley High School".to_string(),
        NAPERVILLE_NORTH.to_string(),
    ];
    let matcher = CriteriaMatcher::new(either_high);
    assert!(matcher.matches(&passing_listing("a")));
}

#[test]
fn price_ceiling_is_exclusive() {
    let matcher = CriteriaMatcher::new(criteria());
    let max_price = matcher.criteria().property.max_price;

    let mut at_ceiling = passing_listing("a");
    at_ceiling.price = max_price;
    assert_eq!(
        matcher.evaluate(&at_ceiling),
        MatchOutcome::Rejected(RejectionReason::PriceAtOrAboveCeiling {
            max_price,
            actual: max_price,
        })
    );

    let mut below = passing_listing("a");
    below.price = max_price - 1;
    assert!(matcher.matches(&below));
}

#[test]
fn price_floor_applies_only_when_configured() {
    let mut listing = passing_listing("a");
    listing.price = 150_000;
    assert!(CriteriaMatcher::new(criteria()).matches(&listing));

    let mut with_floor = criteria();
    with_floor.property.min_price = Some(200_000);
    let matcher = CriteriaMatcher::new(with_floor);
    assert!(matches!(
        matcher.evaluate(&listing),
        MatchOutcome::Rejected(RejectionReason::PriceBelowFloor { .. })
    ));

    listing.price = 200_000;
    assert!(matcher.matches(&listing));
}

#[test]
fn property_type_compares_case_insensitively() {
    let matcher = CriteriaMatcher::new(criteria());
    let mut listing = passing_listing("a");
    listing.property_type = "single-family".to_string();
    assert!(matcher.matches(&listing));

    listing.property_type = "Townhouse".to_string();
    assert!(matches!(
        matcher.evaluate(&listing),
        MatchOutcome::Rejected(RejectionReason::PropertyType { .. })
    ));
}

#[test]
fn unknown_year_built_never_fails() {
    let matcher = CriteriaMatcher::new(criteria());
    let mut listing = passing_listing("a");
    listing.year_built = None;
    assert!(matcher.matches(&listing));

    listing.year_built = Some(1979);
    assert_eq!(
        matcher.evaluate(&listing),
        MatchOutcome::Rejected(RejectionReason::BuiltBefore {
            min_year: 1980,
            actual: 1979,
        })
    );

    listing.year_built = Some(1980);
    assert!(matcher.matches(&listing));
}

#[test]
fn hoa_fee_must_not_exceed_maximum() {
    let matcher = CriteriaMatcher::new(criteria());
    let mut listing = passing_listing("a");
    listing.hoa_fee = 0.01;
    assert!(matches!(
        matcher.evaluate(&listing),
        MatchOutcome::Rejected(RejectionReason::HoaFeeAbove { .. })
    ));

    let mut lenient = criteria();
    lenient.property.max_hoa_fee = 150.0;
    listing.hoa_fee = 150.0;
    assert!(CriteriaMatcher::new(lenient).matches(&listing));
}

#[test]
fn configured_state_rejects_other_states() {
    let mut in_illinois = criteria();
    in_illinois.property.state = Some("IL".to_string());
    let matcher = CriteriaMatcher::new(in_illinois);

    let mut listing = passing_listing("a");
    assert!(matcher.matches(&listing));

    listing.state = "WI".to_string();
    assert!(matches!(
        matcher.evaluate(&listing),
        MatchOutcome::Rejected(RejectionReason::OutOfState { .. })
    ));
}

#[test]
fn evaluation_leaves_listing_untouched() {
    let matcher = CriteriaMatcher::new(criteria());
    let listing = passing_listing("a");
    let before = listing.clone();
    let _ = matcher.evaluate(&listing);
    assert_eq!(listing, before);
}
