//! # Text Normalizer Module
//!
//! Canonicalizes raw food-name strings so that keyword verification and
//! glycemic-index lookup operate on a stable representation.
//!
//! ## Features
//!
//! - Polish diacritic folding via an explicit substitution table
//!   (canonical decomposition does not strip "ł", so a table it is)
//! - Lowercasing and brand-name stopword removal ("Danone", "Milka", ...)
//! - Punctuation runs collapsed to single spaces
//! - Idempotent: `normalize(normalize(x)) == normalize(x)`

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// Runs of anything that is not an ASCII letter or digit become one space.
    static ref NON_ALPHANUMERIC: Regex =
        Regex::new(r"[^a-z0-9]+").expect("non-alphanumeric pattern should be valid");

    /// Brand names removed as whole tokens. Stored pre-normalized.
    static ref BRAND_STOPWORDS: HashSet<&'static str> = [
        "danone", "milka", "activia", "danio", "actimel", "bakoma", "zott",
        "muller", "jogobella", "monte", "wedel", "wawel", "hochland",
        "almette", "mlekovita", "laciate", "piatnica", "winiary", "lubella",
        "sokolow", "tarczynski",
    ]
    .into_iter()
    .collect();
}

/// Fold a single character to its ASCII-lowercase base form.
///
/// Covers the Polish alphabet plus the accented Latin characters that show
/// up in imported product names. Characters without a mapping are passed
/// through lowercased.
fn fold_diacritic(c: char) -> char {
    match c {
        'ą' | 'Ą' | 'á' | 'Á' | 'à' | 'À' | 'â' | 'Â' | 'ä' | 'Ä' => 'a',
        'ć' | 'Ć' | 'ç' | 'Ç' => 'c',
        'ę' | 'Ę' | 'é' | 'É' | 'è' | 'È' | 'ê' | 'Ê' | 'ë' | 'Ë' => 'e',
        'ł' | 'Ł' => 'l',
        'ń' | 'Ń' | 'ñ' | 'Ñ' => 'n',
        'ó' | 'Ó' | 'ò' | 'Ò' | 'ô' | 'Ô' | 'ö' | 'Ö' => 'o',
        'ś' | 'Ś' => 's',
        'ź' | 'Ź' | 'ż' | 'Ż' => 'z',
        'í' | 'Í' | 'î' | 'Î' | 'ï' | 'Ï' => 'i',
        'ú' | 'Ú' | 'ù' | 'Ù' | 'û' | 'Û' | 'ü' | 'Ü' => 'u',
        other => other.to_ascii_lowercase(),
    }
}

/// Normalize a raw food-name string into its canonical form.
///
/// Applies, in order: diacritic folding, lowercasing, punctuation squashing,
/// brand-stopword removal, whitespace collapse. Deterministic and pure;
/// empty input yields empty output.
///
/// # Examples
///
/// ```rust
/// use mealmatch::text_normalizer::normalize;
///
/// assert_eq!(normalize("CHLEB BIAŁY"), "chleb bialy");
/// assert_eq!(normalize("Danone jogurt owocowy"), "jogurt owocowy");
/// assert_eq!(normalize("ryż   (biały)"), "ryz bialy");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let folded: String = raw.chars().map(fold_diacritic).collect();
    let squashed = NON_ALPHANUMERIC.replace_all(&folded, " ");

    squashed
        .split_whitespace()
        .filter(|token| !BRAND_STOPWORDS.contains(token))
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Split a raw string into normalized tokens.
///
/// Convenience for callers that compare token sets rather than whole strings.
pub fn normalized_tokens(raw: &str) -> Vec<String> {
    normalize(raw)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diacritic_folding() {
        assert_eq!(normalize("żółć"), "zolc");
        assert_eq!(normalize("ŁOSOŚ wędzony"), "losos wedzony");
        assert_eq!(normalize("jabłko"), "jablko");
    }

    #[test]
    fn test_case_insensitivity() {
        assert_eq!(normalize("CHLEB BIAŁY"), normalize("chleb bialy"));
        assert_eq!(normalize("CHLEB BIAŁY"), "chleb bialy");
    }

    #[test]
    fn test_brand_stopword_removal() {
        assert_eq!(normalize("Danone jogurt owocowy"), "jogurt owocowy");
        assert_eq!(normalize("czekolada Milka"), "czekolada");
        // Brand token embedded in another word is kept.
        assert_eq!(normalize("milkame"), "milkame");
    }

    #[test]
    fn test_punctuation_squashing() {
        assert_eq!(normalize("ryż, biały (parboiled)"), "ryz bialy parboiled");
        assert_eq!(normalize("masło--extra!!!"), "maslo extra");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(normalize("  chleb   pszenny  "), "chleb pszenny");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "CHLEB BIAŁY",
            "Danone jogurt owocowy",
            "żółty ser... (Gouda)",
            "makaron pełnoziarnisty razowy",
            "",
        ];
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for '{raw}'");
        }
    }

    #[test]
    fn test_normalized_tokens() {
        assert_eq!(
            normalized_tokens("Danone jogurt owocowy"),
            vec!["jogurt".to_string(), "owocowy".to_string()]
        );
        assert!(normalized_tokens("").is_empty());
    }
}
