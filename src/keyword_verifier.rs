//! # Keyword Consistency Verifier
//!
//! Embedding search on short noisy queries has a known failure mode:
//! candidates that are semantically close but name a different food
//! entirely ("jogurt" retrieving "kefir"). This module guards the match
//! step by requiring lexical overlap between query and candidate name.
//!
//! Also exposes `process_text` as a lightweight chunker usable without the
//! generative-model extractor.

use log::trace;

use crate::chunk_extractor::chunk_text;
use crate::meal_model::IngredientChunk;
use crate::text_normalizer;

/// Minimum token length for the shared-token / substring rule. Shorter
/// tokens must match exactly.
const MIN_OVERLAP_TOKEN_LEN: usize = 3;

/// Normalize a text fragment. Delegates to the shared normalizer.
pub fn normalize_text(text: &str) -> String {
    text_normalizer::normalize(text)
}

/// Lightweight rule-based chunking of raw text into ingredient mentions.
pub fn process_text(text: &str) -> Vec<IngredientChunk> {
    chunk_text(text)
}

/// Shared-token rule used by both the verifier and the lexical half of
/// hybrid scoring.
pub(crate) fn tokens_overlap(a: &str, b: &str) -> bool {
    if a.len() >= MIN_OVERLAP_TOKEN_LEN && b.len() >= MIN_OVERLAP_TOKEN_LEN {
        a == b || a.contains(b) || b.contains(a)
    } else {
        a == b
    }
}

/// Check that a search candidate shares lexical material with the query.
///
/// Both strings are normalized and tokenized on whitespace; the candidate
/// passes when any query token of length ≥ 3 equals, contains, or is
/// contained in a candidate token (shorter tokens need exact equality).
///
/// # Examples
///
/// ```rust
/// use mealmatch::keyword_verifier::verify_keyword_consistency;
///
/// assert!(verify_keyword_consistency("ryżu białego", "Ryż biały"));
/// assert!(!verify_keyword_consistency("jogurt naturalny", "kefir 2%"));
/// ```
pub fn verify_keyword_consistency(query: &str, candidate_name: &str) -> bool {
    let query_tokens = text_normalizer::normalized_tokens(query);
    let candidate_tokens = text_normalizer::normalized_tokens(candidate_name);

    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return false;
    }

    let consistent = query_tokens.iter().any(|q| {
        candidate_tokens
            .iter()
            .any(|c| tokens_overlap(q.as_str(), c.as_str()))
    });

    if !consistent {
        trace!(
            "Rejected candidate '{}' for query '{}': no shared tokens",
            candidate_name,
            query
        );
    }
    consistent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_token_passes() {
        assert!(verify_keyword_consistency("ryż biały", "ryż biały"));
        assert!(verify_keyword_consistency("chleb pszenny", "chleb żytni"));
    }

    #[test]
    fn test_inflected_form_passes_by_substring() {
        // Genitive surface forms share their stem with the catalogue name.
        assert!(verify_keyword_consistency("ryżu białego", "ryż biały"));
        assert!(verify_keyword_consistency("sera żółtego", "ser żółty gouda"));
    }

    #[test]
    fn test_semantically_close_but_lexically_unrelated_fails() {
        assert!(!verify_keyword_consistency("jogurt naturalny", "kefir 2%"));
        assert!(!verify_keyword_consistency("masło", "margaryna"));
    }

    #[test]
    fn test_short_tokens_require_exact_match() {
        // "ser" (3 chars) may use the substring rule; two-char tokens
        // must be equal.
        assert!(verify_keyword_consistency("ser", "serek wiejski"));
        assert!(!verify_keyword_consistency("ab", "abrakadabra"));
    }

    #[test]
    fn test_diacritics_and_brands_ignored() {
        assert!(verify_keyword_consistency("JOGURT", "Danone jogurt owocowy"));
        assert!(verify_keyword_consistency("żółty ser", "zolty ser"));
    }

    #[test]
    fn test_empty_inputs_fail() {
        assert!(!verify_keyword_consistency("", "ryż"));
        assert!(!verify_keyword_consistency("ryż", ""));
        assert!(!verify_keyword_consistency("!!!", "ryż"));
    }

    #[test]
    fn test_process_text_delegates_to_chunker() {
        let chunks = process_text("200 gramów ryżu i banan");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].unit.as_deref(), Some("gram"));
        assert_eq!(chunks[1].name, "banan");
    }

    #[test]
    fn test_normalize_text_delegates() {
        assert_eq!(normalize_text("CHLEB BIAŁY"), "chleb bialy");
    }
}
