//! # Glycemic-Index Matcher Module
//!
//! Deterministic keyword lookup assigning a glycemic-index value to a food
//! name. The mapping is closed-world and biased toward false negatives:
//! when no curated keyword matches, the answer is `None`, never a guess.
//!
//! ## Matching policy
//!
//! - Foods with at most [`LOW_CARB_THRESHOLD`] g of carbohydrate per 100 g
//!   never receive a GI value (their glycemic load is not meaningful)
//! - Keywords are matched as substrings of the normalized food name
//! - The longest matching keyword wins; equal lengths resolve to the
//!   lexicographically smallest keyword so the result is reproducible

use std::collections::HashMap;
use std::sync::LazyLock;

use log::{debug, trace};

use crate::text_normalizer::normalize;

/// Carbohydrate floor (g per 100 g) below which GI is never asserted.
pub const LOW_CARB_THRESHOLD: f32 = 5.0;

/// A single curated glycemic-index reference entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiEntry {
    /// Mean glycemic index (glucose = 100 scale).
    pub gi: i32,
    /// Reported standard deviation of the mean.
    pub sd: i32,
    /// English food description from the source table.
    pub food_en: &'static str,
    /// Identifier of the reference table the value comes from.
    pub source: &'static str,
}

const INTERNATIONAL_TABLES: &str = "international-gi-tables-2021";
const CURATED_LOCAL: &str = "curated-local-foods";

/// Primary reference table. Keys are normalized Polish name fragments.
static PRIMARY_TABLE: &[(&str, GiEntry)] = &[
    ("chleb bialy", GiEntry { gi: 75, sd: 2, food_en: "white wheat bread", source: INTERNATIONAL_TABLES }),
    ("chleb pszenny", GiEntry { gi: 74, sd: 2, food_en: "wheat bread", source: INTERNATIONAL_TABLES }),
    ("chleb pelnoziarnisty", GiEntry { gi: 62, sd: 3, food_en: "whole-wheat bread", source: INTERNATIONAL_TABLES }),
    ("chleb zytni razowy", GiEntry { gi: 58, sd: 3, food_en: "wholemeal rye bread", source: INTERNATIONAL_TABLES }),
    ("bulka", GiEntry { gi: 73, sd: 3, food_en: "white wheat roll", source: INTERNATIONAL_TABLES }),
    ("ryz bialy", GiEntry { gi: 73, sd: 4, food_en: "white rice, boiled", source: INTERNATIONAL_TABLES }),
    ("ryz brazowy", GiEntry { gi: 68, sd: 4, food_en: "brown rice, boiled", source: INTERNATIONAL_TABLES }),
    ("makaron", GiEntry { gi: 49, sd: 2, food_en: "wheat pasta, boiled", source: INTERNATIONAL_TABLES }),
    ("makaron pelnoziarnisty razowy", GiEntry { gi: 42, sd: 4, food_en: "whole-grain pasta, boiled", source: INTERNATIONAL_TABLES }),
    ("platki owsiane", GiEntry { gi: 55, sd: 2, food_en: "porridge oats", source: INTERNATIONAL_TABLES }),
    ("owsianka", GiEntry { gi: 55, sd: 2, food_en: "oat porridge", source: INTERNATIONAL_TABLES }),
    ("platki kukurydziane", GiEntry { gi: 81, sd: 3, food_en: "cornflakes", source: INTERNATIONAL_TABLES }),
    ("kasza gryczana", GiEntry { gi: 54, sd: 4, food_en: "buckwheat groats, boiled", source: INTERNATIONAL_TABLES }),
    ("kasza jaglana", GiEntry { gi: 71, sd: 10, food_en: "millet porridge", source: INTERNATIONAL_TABLES }),
    ("ziemniaki", GiEntry { gi: 78, sd: 4, food_en: "potato, boiled", source: INTERNATIONAL_TABLES }),
    ("frytki", GiEntry { gi: 63, sd: 5, food_en: "french fries", source: INTERNATIONAL_TABLES }),
    ("jablko", GiEntry { gi: 36, sd: 2, food_en: "apple, raw", source: INTERNATIONAL_TABLES }),
    ("banan", GiEntry { gi: 51, sd: 3, food_en: "banana, raw", source: INTERNATIONAL_TABLES }),
    ("pomarancza", GiEntry { gi: 43, sd: 3, food_en: "orange, raw", source: INTERNATIONAL_TABLES }),
    ("winogrona", GiEntry { gi: 59, sd: 3, food_en: "grapes", source: INTERNATIONAL_TABLES }),
    ("arbuz", GiEntry { gi: 76, sd: 4, food_en: "watermelon", source: INTERNATIONAL_TABLES }),
    ("marchew", GiEntry { gi: 39, sd: 4, food_en: "carrots, boiled", source: INTERNATIONAL_TABLES }),
    ("burak", GiEntry { gi: 64, sd: 4, food_en: "beetroot", source: INTERNATIONAL_TABLES }),
    ("kukurydza", GiEntry { gi: 52, sd: 5, food_en: "sweet corn", source: INTERNATIONAL_TABLES }),
    ("soczewica", GiEntry { gi: 32, sd: 5, food_en: "lentils, boiled", source: INTERNATIONAL_TABLES }),
    ("fasola", GiEntry { gi: 24, sd: 4, food_en: "kidney beans, boiled", source: INTERNATIONAL_TABLES }),
    ("mleko", GiEntry { gi: 39, sd: 3, food_en: "milk, full fat", source: INTERNATIONAL_TABLES }),
    ("jogurt", GiEntry { gi: 41, sd: 2, food_en: "yogurt, fruit", source: INTERNATIONAL_TABLES }),
    ("jogurt naturalny", GiEntry { gi: 35, sd: 1, food_en: "yogurt, plain", source: INTERNATIONAL_TABLES }),
    ("miod", GiEntry { gi: 61, sd: 3, food_en: "honey", source: INTERNATIONAL_TABLES }),
    ("cukier", GiEntry { gi: 65, sd: 4, food_en: "sucrose", source: INTERNATIONAL_TABLES }),
    ("czekolada", GiEntry { gi: 40, sd: 3, food_en: "chocolate", source: INTERNATIONAL_TABLES }),
    ("sok pomaranczowy", GiEntry { gi: 50, sd: 2, food_en: "orange juice", source: INTERNATIONAL_TABLES }),
];

/// Secondary curated table for regional foods absent from the primary one.
/// Never overrides a primary keyword.
static SECONDARY_TABLE: &[(&str, GiEntry)] = &[
    ("kasza peczak", GiEntry { gi: 45, sd: 4, food_en: "pearl barley, boiled", source: CURATED_LOCAL }),
    ("ryz basmati", GiEntry { gi: 57, sd: 4, food_en: "basmati rice, boiled", source: CURATED_LOCAL }),
    ("batat", GiEntry { gi: 63, sd: 6, food_en: "sweet potato, boiled", source: CURATED_LOCAL }),
    ("pierogi", GiEntry { gi: 55, sd: 6, food_en: "filled dumplings, boiled", source: CURATED_LOCAL }),
    ("nalesniki", GiEntry { gi: 66, sd: 5, food_en: "pancakes", source: CURATED_LOCAL }),
    ("pizza", GiEntry { gi: 60, sd: 6, food_en: "pizza, wheat base", source: CURATED_LOCAL }),
    ("chleb zytni", GiEntry { gi: 64, sd: 4, food_en: "light rye bread", source: CURATED_LOCAL }),
    ("gruszka", GiEntry { gi: 38, sd: 2, food_en: "pear, raw", source: CURATED_LOCAL }),
    ("truskawki", GiEntry { gi: 40, sd: 7, food_en: "strawberries", source: CURATED_LOCAL }),
    ("kefir", GiEntry { gi: 32, sd: 4, food_en: "kefir", source: CURATED_LOCAL }),
];

/// Merged keyword index. Primary entries win on keyword collisions.
static GI_INDEX: LazyLock<HashMap<&'static str, &'static GiEntry>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, &'static GiEntry> = HashMap::new();
    for (keyword, entry) in SECONDARY_TABLE {
        map.insert(*keyword, entry);
    }
    for (keyword, entry) in PRIMARY_TABLE {
        map.insert(*keyword, entry);
    }
    map
});

/// Find the curated entry matching a food name, independent of carbs.
///
/// Applies the longest-match rule over all keywords that occur as a
/// substring of the normalized name. Returns `None` when nothing matches.
pub fn lookup_entry(food_name: &str) -> Option<&'static GiEntry> {
    let normalized = normalize(food_name);
    if normalized.is_empty() {
        return None;
    }

    let best = GI_INDEX
        .iter()
        .map(|(keyword, entry)| (*keyword, *entry))
        .filter(|(keyword, _)| normalized.contains(keyword))
        // Longest keyword first; equal lengths resolve to the
        // lexicographically smallest keyword.
        .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)));

    match best {
        Some((keyword, entry)) => {
            trace!("GI keyword '{}' matched name '{}'", keyword, normalized);
            Some(entry)
        }
        None => None,
    }
}

/// Match a glycemic-index value for a food, given its carbohydrate content.
///
/// Returns `None` unconditionally when `carbs_per_100g <= 5.0`, and
/// otherwise the mean GI of the best-matching curated keyword, if any.
///
/// # Examples
///
/// ```rust
/// use mealmatch::glycemic_index::match_gi;
///
/// assert_eq!(match_gi("ryż biały", 78.0), Some(73.0));
/// assert_eq!(match_gi("ryż biały", 4.0), None);
/// assert_eq!(match_gi("pierś z kurczaka", 0.0), None);
/// ```
pub fn match_gi(food_name: &str, carbs_per_100g: f32) -> Option<f32> {
    if carbs_per_100g <= LOW_CARB_THRESHOLD {
        return None;
    }

    let entry = lookup_entry(food_name)?;
    debug!(
        "GI {} ({}) assigned to '{}'",
        entry.gi, entry.source, food_name
    );
    Some(entry.gi as f32)
}
