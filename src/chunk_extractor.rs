//! # Rule-Based Chunk Extractor
//!
//! Segments free-form meal descriptions ("zjadłem 200 gramów ryżu białego
//! i dwie kromki chleba") into ordered ingredient mentions using regex and
//! token heuristics. Fast and dependency-free; recall on unusual phrasing
//! is weaker than the generative fallback's.
//!
//! ## Features
//!
//! - Segment splitting on conjunctions and punctuation (Polish and English)
//! - Quantity detection: digits, decimal comma, attached units ("200g"),
//!   number words ("dwie", "pół", "two", "half")
//! - Unit detection through the shared unit lexicon
//! - Filler-word stripping ("zjadłem", "na", "I ate", ...)
//! - Meal-type guess from textual cues

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, info, trace};
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::extractor::IngredientExtractor;
use crate::meal_model::{IngredientChunk, MealExtraction, MealType};
use crate::recognition_errors::RecognitionError;
use crate::text_normalizer::normalize;
use crate::unit_resolution::resolve_unit;

lazy_static! {
    /// Splits a transcript into ingredient segments.
    static ref SEGMENT_SEPARATOR: Regex =
        Regex::new(r"(?i)[,;\n]+|\s+(?:i|oraz|and|plus)\s+")
            .expect("segment separator pattern should be valid");

    /// A bare numeric token, decimal point or comma.
    static ref NUMBER_TOKEN: Regex =
        Regex::new(r"^\d+(?:[.,]\d+)?$").expect("number token pattern should be valid");

    /// A number glued to a trailing unit, e.g. "200g", "1.5l".
    static ref ATTACHED_UNIT: Regex =
        Regex::new(r"^(\d+(?:[.,]\d+)?)([a-z]+)$").expect("attached unit pattern should be valid");

    /// Verbs, fillers and connectives that never belong to a food name.
    /// Stored normalized.
    static ref FILLER_WORDS: HashSet<&'static str> = [
        "zjadlem", "zjadlam", "jadlem", "jadlam", "zjem", "wypilem",
        "wypilam", "pilem", "pilam", "mialem", "mialam", "bylo", "byly",
        "na", "do", "z", "ze", "dzis", "dzisiaj", "wczoraj", "rano",
        "wieczorem", "potem", "jeszcze", "tez", "takze", "okolo", "jakies",
        "chyba", "moze",
        "i", "a", "an", "the", "ate", "had", "drank", "some", "about",
        "for", "of", "my", "me", "then", "today", "yesterday",
    ]
    .into_iter()
    .collect();

    /// Meal-type cues, normalized token -> guess.
    static ref MEAL_CUES: HashMap<&'static str, MealType> = {
        let mut map = HashMap::new();
        for cue in ["sniadanie", "sniadaniu", "breakfast"] {
            map.insert(cue, MealType::Breakfast);
        }
        for cue in ["obiad", "obiedzie", "lunch"] {
            map.insert(cue, MealType::Lunch);
        }
        for cue in ["kolacja", "kolacje", "kolacji", "dinner", "supper"] {
            map.insert(cue, MealType::Dinner);
        }
        for cue in ["przekaska", "przekaske", "przekasce", "snack"] {
            map.insert(cue, MealType::Snack);
        }
        map
    };

    /// Spelled-out quantities, normalized word -> value.
    static ref NUMBER_WORDS: HashMap<&'static str, f32> = {
        let mut map = HashMap::new();
        for (word, value) in [
            ("jeden", 1.0), ("jedna", 1.0), ("jedno", 1.0),
            ("dwa", 2.0), ("dwie", 2.0),
            ("trzy", 3.0), ("cztery", 4.0), ("piec", 5.0), ("szesc", 6.0),
            ("siedem", 7.0), ("osiem", 8.0), ("dziewiec", 9.0), ("dziesiec", 10.0),
            ("pol", 0.5), ("poltora", 1.5), ("cwierc", 0.25),
            ("one", 1.0), ("two", 2.0), ("three", 3.0), ("four", 4.0),
            ("five", 5.0), ("six", 6.0), ("seven", 7.0), ("eight", 8.0),
            ("nine", 9.0), ("ten", 10.0), ("half", 0.5),
        ] {
            map.insert(word, value);
        }
        map
    };
}

/// Guess the meal type from cues anywhere in the text.
pub fn guess_meal_type(text: &str) -> MealType {
    for token in normalize(text).split_whitespace() {
        if let Some(meal_type) = MEAL_CUES.get(token) {
            return *meal_type;
        }
    }
    MealType::Unknown
}

fn parse_numeric(token: &str) -> Option<f32> {
    token.replace(',', ".").parse::<f32>().ok()
}

/// Parse one segment into a chunk, if it carries a food name.
fn parse_segment(segment: &str) -> Option<IngredientChunk> {
    let raw_span = segment.trim();
    if raw_span.is_empty() {
        return None;
    }

    let mut quantity: Option<f32> = None;
    let mut unit: Option<String> = None;
    let mut name_tokens: Vec<String> = Vec::new();
    let mut just_after_quantity = false;

    for raw_token in raw_span.split_whitespace() {
        let norm = normalize(raw_token);
        if norm.is_empty() || FILLER_WORDS.contains(norm.as_str()) || MEAL_CUES.contains_key(norm.as_str()) {
            continue;
        }

        // Numeric detection runs on the raw token: normalization would
        // split a decimal comma ("1,5") into two tokens' worth of digits.
        let numeric_form = raw_token
            .trim_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();

        if quantity.is_none() && NUMBER_TOKEN.is_match(&numeric_form) {
            quantity = parse_numeric(&numeric_form);
            just_after_quantity = true;
            continue;
        }

        if quantity.is_none() {
            if let Some(value) = NUMBER_WORDS.get(norm.as_str()) {
                quantity = Some(*value);
                just_after_quantity = true;
                continue;
            }
            if let Some(captures) = ATTACHED_UNIT.captures(&numeric_form) {
                if let Some(spec) = resolve_unit(&captures[2]) {
                    quantity = parse_numeric(&captures[1]);
                    unit = Some(spec.canonical.to_string());
                    just_after_quantity = false;
                    continue;
                }
            }
        }

        // A unit token counts only right after the quantity or at the
        // start of the mention ("szklanka mleka"); later occurrences are
        // part of the name.
        if unit.is_none() && (just_after_quantity || name_tokens.is_empty()) {
            if let Some(spec) = resolve_unit(&norm) {
                unit = Some(spec.canonical.to_string());
                just_after_quantity = false;
                continue;
            }
        }

        just_after_quantity = false;
        let cleaned = raw_token.trim_matches(|c: char| c.is_ascii_punctuation());
        if !cleaned.is_empty() {
            name_tokens.push(cleaned.to_string());
        }
    }

    if name_tokens.is_empty() {
        trace!("Segment '{}' yielded no food name", raw_span);
        return None;
    }

    let mut chunk = IngredientChunk::new(&name_tokens.join(" "), raw_span);
    if let Some(value) = quantity {
        chunk = chunk.with_quantity(value);
    }
    if let Some(canonical) = unit.as_deref() {
        chunk = chunk.with_unit(canonical);
    }
    Some(chunk)
}

/// Split raw text into ordered ingredient chunks.
///
/// # Examples
///
/// ```rust
/// use mealmatch::chunk_extractor::chunk_text;
///
/// let chunks = chunk_text("zjadłem 200 gramów ryżu białego i dwie kromki chleba");
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].quantity, Some(200.0));
/// assert_eq!(chunks[0].unit.as_deref(), Some("gram"));
/// assert_eq!(chunks[1].quantity, Some(2.0));
/// assert_eq!(chunks[1].unit.as_deref(), Some("kromka"));
/// ```
pub fn chunk_text(text: &str) -> Vec<IngredientChunk> {
    parse_segments(text).0
}

/// Parse all segments, returning the chunks and how many non-empty
/// segments were seen (for confidence scoring).
fn parse_segments(text: &str) -> (Vec<IngredientChunk>, usize) {
    let mut chunks = Vec::new();
    let mut segments = 0;

    for segment in SEGMENT_SEPARATOR.split(text) {
        if segment.trim().is_empty() {
            continue;
        }
        segments += 1;
        if let Some(chunk) = parse_segment(segment) {
            trace!("Parsed segment '{}' -> {}", segment.trim(), chunk);
            chunks.push(chunk);
        }
    }

    debug!("Chunked {} mentions out of {} segments", chunks.len(), segments);
    (chunks, segments)
}

fn chunk_confidence(chunk: &IngredientChunk) -> f32 {
    match (chunk.quantity.is_some(), chunk.unit.is_some()) {
        (true, true) => 0.95,
        (true, false) => 0.8,
        (false, true) => 0.7,
        (false, false) => 0.5,
    }
}

/// The rule-based extraction strategy. Stateless and always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IngredientExtractor for RuleBasedExtractor {
    async fn extract(&self, text: &str) -> Result<MealExtraction, RecognitionError> {
        let (chunks, segments) = parse_segments(text);

        let confidence = if chunks.is_empty() || segments == 0 {
            0.0
        } else {
            let mean: f32 =
                chunks.iter().map(chunk_confidence).sum::<f32>() / chunks.len() as f32;
            let success_rate = chunks.len() as f32 / segments as f32;
            (mean + success_rate) / 2.0
        };

        info!(
            "Rule-based extraction found {} mentions (confidence {:.2})",
            chunks.len(),
            confidence
        );

        Ok(MealExtraction::new(guess_meal_type(text), text)
            .with_items(chunks)
            .with_confidence(confidence))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "rule-based"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_polish_transcript() {
        let chunks = chunk_text("zjadłem 200 gramów ryżu białego");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].name, "ryżu białego");
        assert_eq!(chunks[0].quantity, Some(200.0));
        assert_eq!(chunks[0].unit.as_deref(), Some("gram"));
        assert_eq!(chunks[0].raw_span, "zjadłem 200 gramów ryżu białego");
    }

    #[test]
    fn test_conjunction_splitting() {
        let chunks = chunk_text("jajecznica z trzech jajek i dwie kromki chleba");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].quantity, Some(2.0));
        assert_eq!(chunks[1].unit.as_deref(), Some("kromka"));
        assert_eq!(chunks[1].name, "chleba");
    }

    #[test]
    fn test_number_words() {
        let chunks = chunk_text("dwie łyżki masła orzechowego");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].quantity, Some(2.0));
        assert_eq!(chunks[0].unit.as_deref(), Some("lyzka"));
        assert_eq!(chunks[0].name, "masła orzechowego");
    }

    #[test]
    fn test_half_quantity() {
        let chunks = chunk_text("pół szklanki mleka");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].quantity, Some(0.5));
        assert_eq!(chunks[0].unit.as_deref(), Some("szklanka"));
        assert_eq!(chunks[0].name, "mleka");
    }

    #[test]
    fn test_attached_unit() {
        let chunks = chunk_text("100g sera żółtego");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].quantity, Some(100.0));
        assert_eq!(chunks[0].unit.as_deref(), Some("gram"));
        assert_eq!(chunks[0].name, "sera żółtego");
    }

    #[test]
    fn test_decimal_comma() {
        let chunks = chunk_text("1,5 litra wody");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].quantity, Some(1.5));
        assert_eq!(chunks[0].unit.as_deref(), Some("litr"));
    }

    #[test]
    fn test_bare_name_without_quantity() {
        let chunks = chunk_text("xyzfoodunknown");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].name, "xyzfoodunknown");
        assert_eq!(chunks[0].quantity, None);
        assert_eq!(chunks[0].unit, None);
    }

    #[test]
    fn test_filler_only_segment_dropped() {
        let chunks = chunk_text("zjadłem na śniadanie");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_meal_type_guess() {
        assert_eq!(guess_meal_type("na śniadanie zjadłem owsiankę"), MealType::Breakfast);
        assert_eq!(guess_meal_type("obiad był pyszny"), MealType::Lunch);
        assert_eq!(guess_meal_type("for dinner I had soup"), MealType::Dinner);
        assert_eq!(guess_meal_type("mała przekąska"), MealType::Snack);
        assert_eq!(guess_meal_type("200 gramów ryżu"), MealType::Unknown);
    }

    #[test]
    fn test_english_transcript() {
        let chunks = chunk_text("I ate two slices of bread and 100 grams of cheese");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].quantity, Some(2.0));
        assert_eq!(chunks[0].unit.as_deref(), Some("plasterek"));
        assert_eq!(chunks[0].name, "bread");
        assert_eq!(chunks[1].quantity, Some(100.0));
        assert_eq!(chunks[1].unit.as_deref(), Some("gram"));
        assert_eq!(chunks[1].name, "cheese");
    }

    #[tokio::test]
    async fn test_extractor_confidence_ordering() {
        let extractor = RuleBasedExtractor::new();

        let rich = extractor
            .extract("zjadłem 200 gramów ryżu białego")
            .await
            .unwrap();
        let poor = extractor.extract("coś tam było dobrego").await.unwrap();

        assert!(rich.overall_confidence > poor.overall_confidence);
    }

    #[tokio::test]
    async fn test_empty_text_yields_zero_confidence() {
        let extractor = RuleBasedExtractor::new();
        let extraction = extractor.extract("").await.unwrap();
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.overall_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_chunk_order_preserved() {
        let extractor = RuleBasedExtractor::new();
        let extraction = extractor
            .extract("owsianka, banan, jogurt naturalny")
            .await
            .unwrap();
        let names: Vec<&str> = extraction.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["owsianka", "banan", "jogurt naturalny"]);
    }
}
