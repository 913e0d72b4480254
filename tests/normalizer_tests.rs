//! Integration tests for text normalization and glycemic-index matching.

use mealmatch::glycemic_index::{lookup_entry, match_gi};
use mealmatch::text_normalizer::normalize;

#[test]
fn test_normalize_is_idempotent() {
    let samples = [
        "CHLEB BIAŁY",
        "Danone jogurt owocowy",
        "makaron pełnoziarnisty razowy",
        "żółty ser (Gouda)...",
        "  ryż,   biały  ",
        "",
    ];
    for raw in samples {
        let once = normalize(raw);
        let twice = normalize(&once);
        assert_eq!(once, twice, "normalize not idempotent for '{raw}'");
    }
}

#[test]
fn test_normalize_case_and_diacritic_insensitive() {
    assert_eq!(normalize("CHLEB BIAŁY"), normalize("chleb bialy"));
    assert_eq!(normalize("CHLEB BIAŁY"), "chleb bialy");
}

#[test]
fn test_gi_null_for_low_carb_regardless_of_name() {
    for name in ["chleb biały", "ryż biały", "makaron", "cokolwiek"] {
        for carbs in [0.0, 2.5, 5.0] {
            assert_eq!(match_gi(name, carbs), None, "GI asserted for '{name}' at {carbs}g");
        }
    }
}

#[test]
fn test_gi_longest_match_tie_break() {
    let specific = match_gi("Makaron pełnoziarnisty razowy", 65.0).unwrap();
    let generic = match_gi("makaron", 70.0).unwrap();
    assert_ne!(specific, generic);
    assert_eq!(specific, 42.0);
    assert_eq!(generic, 49.0);
}

#[test]
fn test_gi_brand_stopword_invariant() {
    for carbs in [6.0, 13.0, 55.0] {
        assert_eq!(
            match_gi("Danone jogurt owocowy", carbs),
            match_gi("jogurt owocowy", carbs)
        );
    }
}

#[test]
fn test_gi_never_guesses() {
    assert_eq!(match_gi("xyzfoodunknown", 80.0), None);
    assert_eq!(match_gi("", 80.0), None);
}

#[test]
fn test_gi_entries_carry_sources() {
    let entry = lookup_entry("płatki owsiane").unwrap();
    assert_eq!(entry.gi, 55);
    assert!(!entry.source.is_empty());
    assert!(!entry.food_en.is_empty());
}
