//! # Unit Resolution Module
//!
//! Maps raw unit tokens from extracted mentions onto canonical units and
//! converts mention quantities into grams for nutrition scaling.
//!
//! ## Features
//!
//! - Polish and English unit aliases, listed explicitly (plural forms
//!   included, no stemming guesswork)
//! - Mass and volume units convert directly; volume assumes density 1,
//!   which is the convention for the fluids this catalogue carries
//! - Serving units ("kromka", "szklanka", "slice") carry generic gram
//!   equivalents that per-product unit definitions override
//! - Mentions without a usable quantity fall back to the product's default
//!   portion, then to the configured default

use std::collections::HashMap;
use std::sync::LazyLock;

use log::trace;

use crate::meal_model::CatalogueProduct;
use crate::recognition_config::ResolutionConfig;
use crate::text_normalizer::normalize;

/// Unit label used when a portion had to be assumed.
pub const DEFAULT_UNIT_LABEL: &str = "porcja";

/// What kind of conversion a canonical unit supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Converts to grams exactly
    Mass,
    /// Converts to grams under the density-1 approximation
    Volume,
    /// Needs a per-product definition or a generic typical mass
    Serving,
}

/// A canonical unit with its conversion data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSpec {
    /// Canonical, diacritic-free unit name (matches product unit keys)
    pub canonical: &'static str,
    pub kind: UnitKind,
    /// Grams per one unit; `None` for purely product-defined servings
    pub grams_per_unit: Option<f32>,
}

macro_rules! unit_aliases {
    ($map:ident, $spec:expr, [$($alias:literal),+ $(,)?]) => {
        $( $map.insert($alias, $spec); )+
    };
}

static UNIT_SPECS: &[UnitSpec] = &[
    UnitSpec { canonical: "gram", kind: UnitKind::Mass, grams_per_unit: Some(1.0) },
    UnitSpec { canonical: "dekagram", kind: UnitKind::Mass, grams_per_unit: Some(10.0) },
    UnitSpec { canonical: "kilogram", kind: UnitKind::Mass, grams_per_unit: Some(1000.0) },
    UnitSpec { canonical: "miligram", kind: UnitKind::Mass, grams_per_unit: Some(0.001) },
    UnitSpec { canonical: "mililitr", kind: UnitKind::Volume, grams_per_unit: Some(1.0) },
    UnitSpec { canonical: "litr", kind: UnitKind::Volume, grams_per_unit: Some(1000.0) },
    UnitSpec { canonical: "lyzka", kind: UnitKind::Serving, grams_per_unit: Some(15.0) },
    UnitSpec { canonical: "lyzeczka", kind: UnitKind::Serving, grams_per_unit: Some(5.0) },
    UnitSpec { canonical: "szklanka", kind: UnitKind::Serving, grams_per_unit: Some(250.0) },
    UnitSpec { canonical: "kromka", kind: UnitKind::Serving, grams_per_unit: Some(35.0) },
    UnitSpec { canonical: "plasterek", kind: UnitKind::Serving, grams_per_unit: Some(20.0) },
    UnitSpec { canonical: "garsc", kind: UnitKind::Serving, grams_per_unit: Some(30.0) },
    UnitSpec { canonical: "sztuka", kind: UnitKind::Serving, grams_per_unit: None },
    UnitSpec { canonical: "opakowanie", kind: UnitKind::Serving, grams_per_unit: None },
    UnitSpec { canonical: "porcja", kind: UnitKind::Serving, grams_per_unit: None },
];

fn spec(canonical: &str) -> &'static UnitSpec {
    UNIT_SPECS
        .iter()
        .find(|spec| spec.canonical == canonical)
        .expect("canonical unit must exist in UNIT_SPECS")
}

/// Alias table keyed by normalized unit token.
static UNIT_ALIASES: LazyLock<HashMap<&'static str, &'static UnitSpec>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, &'static UnitSpec> = HashMap::new();

    unit_aliases!(map, spec("gram"), ["g", "gr", "gram", "gramy", "gramow", "grams", "gramme", "grammes"]);
    unit_aliases!(map, spec("dekagram"), ["dag", "deko", "dekagram", "dekagramy", "dekagramow"]);
    unit_aliases!(map, spec("kilogram"), ["kg", "kilo", "kilogram", "kilogramy", "kilogramow", "kilograms"]);
    unit_aliases!(map, spec("miligram"), ["mg", "miligram", "miligramy", "milligrams"]);
    unit_aliases!(map, spec("mililitr"), ["ml", "mililitr", "mililitry", "mililitrow", "milliliter", "milliliters", "millilitre", "millilitres"]);
    unit_aliases!(map, spec("litr"), ["l", "litr", "litry", "litrow", "liter", "liters", "litre", "litres"]);
    unit_aliases!(map, spec("lyzka"), ["lyzka", "lyzki", "lyzek", "tablespoon", "tablespoons", "tbsp"]);
    unit_aliases!(map, spec("lyzeczka"), ["lyzeczka", "lyzeczki", "lyzeczek", "teaspoon", "teaspoons", "tsp"]);
    unit_aliases!(map, spec("szklanka"), ["szklanka", "szklanki", "szklanek", "kubek", "kubki", "cup", "cups", "glass", "glasses"]);
    unit_aliases!(map, spec("kromka"), ["kromka", "kromki", "kromek"]);
    unit_aliases!(map, spec("plasterek"), ["plaster", "plasterek", "plasterki", "plasterkow", "slice", "slices"]);
    unit_aliases!(map, spec("garsc"), ["garsc", "garsci", "handful", "handfuls"]);
    unit_aliases!(map, spec("sztuka"), ["sztuka", "sztuki", "sztuk", "szt", "piece", "pieces", "pcs"]);
    unit_aliases!(map, spec("opakowanie"), ["opakowanie", "opakowania", "paczka", "paczki", "pack", "packs", "packet", "packets"]);
    unit_aliases!(map, spec("porcja"), ["porcja", "porcje", "porcji", "portion", "portions", "serving", "servings"]);

    map
});

/// Resolve a raw unit token to its canonical spec, if recognized.
///
/// # Examples
///
/// ```rust
/// use mealmatch::unit_resolution::resolve_unit;
///
/// assert_eq!(resolve_unit("gramów").unwrap().canonical, "gram");
/// assert_eq!(resolve_unit("Kromki").unwrap().canonical, "kromka");
/// assert!(resolve_unit("blob").is_none());
/// ```
pub fn resolve_unit(raw: &str) -> Option<&'static UnitSpec> {
    let normalized = normalize(raw);
    UNIT_ALIASES.get(normalized.as_str()).copied()
}

/// Whether a raw token names a known unit.
pub fn is_unit_token(raw: &str) -> bool {
    resolve_unit(raw).is_some()
}

/// A mention quantity resolved into grams for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuantity {
    /// Portion mass in grams, strictly positive
    pub grams: f32,
    /// Canonical unit the quantity was interpreted in
    pub unit_matched: String,
    /// Numeric value in `unit_matched` units
    pub unit_value: f32,
    /// Whether both quantity and unit came from the mention rather than
    /// from defaults
    pub explicit: bool,
}

/// Convert a mention's `(quantity, unit)` to grams for a given product.
///
/// Resolution order for the gram equivalent of a serving unit: the
/// product's own unit definition, then the generic table, then the
/// product default portion, then the configured default portion.
/// Returns `None` when the resulting mass would not be strictly positive.
pub fn resolve_grams(
    quantity: Option<f32>,
    unit: Option<&str>,
    product: &CatalogueProduct,
    config: &ResolutionConfig,
) -> Option<ResolvedQuantity> {
    let default_portion = product
        .default_portion_grams
        .unwrap_or(config.default_portion_grams);

    let resolved = match unit.and_then(resolve_unit) {
        Some(spec) => {
            let unit_value = quantity.unwrap_or(1.0);
            match spec.kind {
                UnitKind::Mass | UnitKind::Volume => ResolvedQuantity {
                    grams: unit_value * spec.grams_per_unit.unwrap_or(1.0),
                    unit_matched: spec.canonical.to_string(),
                    unit_value,
                    explicit: quantity.is_some(),
                },
                UnitKind::Serving => {
                    let per_unit = product
                        .unit_grams(spec.canonical)
                        .or(spec.grams_per_unit)
                        .unwrap_or(default_portion);
                    ResolvedQuantity {
                        grams: unit_value * per_unit,
                        unit_matched: spec.canonical.to_string(),
                        unit_value,
                        explicit: quantity.is_some(),
                    }
                }
            }
        }
        None => match quantity {
            // A bare count ("2 jabłka") is pieces if the product defines
            // them, otherwise portions.
            Some(count) => match product.unit_grams("sztuka") {
                Some(per_piece) => ResolvedQuantity {
                    grams: count * per_piece,
                    unit_matched: "sztuka".to_string(),
                    unit_value: count,
                    explicit: true,
                },
                None => ResolvedQuantity {
                    grams: count * default_portion,
                    unit_matched: DEFAULT_UNIT_LABEL.to_string(),
                    unit_value: count,
                    explicit: false,
                },
            },
            None => ResolvedQuantity {
                grams: default_portion,
                unit_matched: DEFAULT_UNIT_LABEL.to_string(),
                unit_value: 1.0,
                explicit: false,
            },
        },
    };

    if resolved.grams <= 0.0 || !resolved.grams.is_finite() {
        trace!(
            "Rejecting non-positive portion {}g for product {}",
            resolved.grams,
            product.id
        );
        return None;
    }

    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_model::UnitDefinition;

    fn product_with_units(units: Vec<UnitDefinition>, default_portion: Option<f32>) -> CatalogueProduct {
        CatalogueProduct {
            id: "test".to_string(),
            name_pl: "test".to_string(),
            name_en: "test".to_string(),
            kcal_per_100g: 100.0,
            protein_per_100g: 1.0,
            fat_per_100g: 1.0,
            carbs_per_100g: 10.0,
            category: None,
            popularity: 0,
            units,
            default_portion_grams: default_portion,
        }
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(resolve_unit("g").unwrap().canonical, "gram");
        assert_eq!(resolve_unit("gramów").unwrap().canonical, "gram");
        assert_eq!(resolve_unit("ŁYŻKI").unwrap().canonical, "lyzka");
        assert_eq!(resolve_unit("slices").unwrap().canonical, "plasterek");
        assert!(resolve_unit("parsec").is_none());
    }

    #[test]
    fn test_mass_units_convert_directly() {
        let product = product_with_units(vec![], None);
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(Some(200.0), Some("gram"), &product, &config).unwrap();
        assert_eq!(resolved.grams, 200.0);
        assert_eq!(resolved.unit_matched, "gram");
        assert!(resolved.explicit);

        let resolved = resolve_grams(Some(0.5), Some("kg"), &product, &config).unwrap();
        assert_eq!(resolved.grams, 500.0);
    }

    #[test]
    fn test_product_unit_definition_overrides_generic() {
        let product = product_with_units(vec![UnitDefinition::new("kromka", 45.0)], None);
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(Some(2.0), Some("kromki"), &product, &config).unwrap();
        assert_eq!(resolved.grams, 90.0);
        assert_eq!(resolved.unit_matched, "kromka");
    }

    #[test]
    fn test_generic_serving_fallback() {
        let product = product_with_units(vec![], None);
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(Some(2.0), Some("kromki"), &product, &config).unwrap();
        assert_eq!(resolved.grams, 70.0);
    }

    #[test]
    fn test_bare_count_uses_pieces_when_defined() {
        let product = product_with_units(vec![UnitDefinition::new("sztuka", 180.0)], None);
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(Some(2.0), None, &product, &config).unwrap();
        assert_eq!(resolved.grams, 360.0);
        assert_eq!(resolved.unit_matched, "sztuka");
        assert!(resolved.explicit);
    }

    #[test]
    fn test_no_quantity_defaults_to_portion() {
        let product = product_with_units(vec![], Some(150.0));
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(None, None, &product, &config).unwrap();
        assert_eq!(resolved.grams, 150.0);
        assert_eq!(resolved.unit_matched, "porcja");
        assert!(!resolved.explicit);
    }

    #[test]
    fn test_config_default_when_product_has_none() {
        let product = product_with_units(vec![], None);
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(None, None, &product, &config).unwrap();
        assert_eq!(resolved.grams, config.default_portion_grams);
    }

    #[test]
    fn test_non_positive_mass_rejected() {
        let product = product_with_units(vec![], None);
        let config = ResolutionConfig::default();

        assert!(resolve_grams(Some(0.0), Some("gram"), &product, &config).is_none());
        assert!(resolve_grams(Some(-5.0), Some("gram"), &product, &config).is_none());
    }

    #[test]
    fn test_unit_without_quantity_counts_as_one() {
        let product = product_with_units(vec![], None);
        let config = ResolutionConfig::default();

        let resolved = resolve_grams(None, Some("szklanka"), &product, &config).unwrap();
        assert_eq!(resolved.grams, 250.0);
        assert_eq!(resolved.unit_value, 1.0);
        assert!(!resolved.explicit);
    }
}
