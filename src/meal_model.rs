//! # Meal Recognition Data Model
//!
//! Data structures flowing through the recognition pipeline, from extracted
//! ingredient mentions up to the final recognition result.
//!
//! ## Core Concepts
//!
//! - **IngredientChunk**: one food mention extracted from raw text, prior to
//!   catalogue resolution
//! - **SearchCandidate**: a catalogue product proposed by hybrid search,
//!   not yet verified or scaled
//! - **MatchedProduct**: a resolved chunk with nutrition scaled to grams
//! - **MealRecognitionResult**: the final artifact returned to callers
//!
//! ## Usage
//!
//! ```rust
//! use mealmatch::meal_model::{IngredientChunk, MealExtraction, MealType};
//!
//! let chunk = IngredientChunk::new("ryż biały", "200 gramów ryżu białego")
//!     .with_quantity(200.0)
//!     .with_unit("gram");
//!
//! let extraction = MealExtraction::new(MealType::Lunch, "zjadłem 200 gramów ryżu białego")
//!     .with_items(vec![chunk]);
//! assert_eq!(extraction.items.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Meal category guessed by the extractor from textual cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Morning meal ("śniadanie", "breakfast")
    Breakfast,
    /// Midday meal ("obiad", "lunch")
    Lunch,
    /// Evening meal ("kolacja", "dinner", "supper")
    Dinner,
    /// Between-meal food ("przekąska", "snack")
    Snack,
    /// No cue found in the text
    #[default]
    Unknown,
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// A single extracted food mention, immutable once created.
///
/// Quantity and unit may be absent; downstream resolution applies product
/// or configuration defaults in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientChunk {
    /// The food name as extracted (e.g., "ryż biały")
    pub name: String,
    /// Numeric quantity if the text carried one
    pub quantity: Option<f32>,
    /// Raw unit token if the text carried one (e.g., "gram", "kromka")
    pub unit: Option<String>,
    /// The span of source text this mention was extracted from
    pub raw_span: String,
}

impl IngredientChunk {
    /// Create a chunk with just a name and its source span.
    pub fn new(name: &str, raw_span: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: None,
            unit: None,
            raw_span: raw_span.to_string(),
        }
    }

    /// Attach an explicit quantity.
    pub fn with_quantity(mut self, quantity: f32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Attach a raw unit token.
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Whether the source text specified a numeric quantity.
    pub fn has_explicit_quantity(&self) -> bool {
        self.quantity.is_some()
    }
}

impl fmt::Display for IngredientChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.quantity, &self.unit) {
            (Some(q), Some(u)) => write!(f, "{q} {u} {}", self.name),
            (Some(q), None) => write!(f, "{q} {}", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// A catalogue product proposed by the search engine for one query.
///
/// Ephemeral: produced per query, ordered descending by score, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Catalogue identifier of the product
    pub product_id: String,
    /// Display name the candidate was indexed under
    pub name: String,
    /// Blended relevance score in `[0, 1]`
    pub score: f32,
    /// Optional catalogue category
    pub category: Option<String>,
}

/// A named serving unit with its gram equivalent for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Canonical unit name (e.g., "kromka", "szklanka", "sztuka")
    pub unit: String,
    /// Grams of the product per one such unit
    pub grams: f32,
}

impl UnitDefinition {
    pub fn new(unit: &str, grams: f32) -> Self {
        Self {
            unit: unit.to_string(),
            grams,
        }
    }
}

/// Nutrition values scaled to a concrete gram amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionValues {
    pub kcal: f32,
    pub protein: f32,
    pub fat: f32,
    pub carbs: f32,
}

/// The catalogue product shape consumed from the product store.
///
/// Nutrition fields are per 100 g; scaling to a portion happens during
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueProduct {
    pub id: String,
    pub name_pl: String,
    pub name_en: String,
    pub kcal_per_100g: f32,
    pub protein_per_100g: f32,
    pub fat_per_100g: f32,
    pub carbs_per_100g: f32,
    pub category: Option<String>,
    /// Relative popularity used only for deterministic tie-breaking
    pub popularity: u32,
    /// Serving units defined for this product
    pub units: Vec<UnitDefinition>,
    /// Grams of a default portion when the mention has no usable quantity
    pub default_portion_grams: Option<f32>,
}

impl CatalogueProduct {
    /// Linearly scale the per-100g nutrition to `grams`.
    pub fn nutrition_for_grams(&self, grams: f32) -> NutritionValues {
        let factor = grams / 100.0;
        NutritionValues {
            kcal: self.kcal_per_100g * factor,
            protein: self.protein_per_100g * factor,
            fat: self.fat_per_100g * factor,
            carbs: self.carbs_per_100g * factor,
        }
    }

    /// Look up the gram equivalent of a canonical unit for this product.
    pub fn unit_grams(&self, unit: &str) -> Option<f32> {
        self.units
            .iter()
            .find(|definition| definition.unit == unit)
            .map(|definition| definition.grams)
    }
}

/// A successfully resolved chunk with nutrition scaled to its portion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedProduct {
    pub product_id: String,
    pub name_pl: String,
    pub name_en: String,
    /// Resolved portion mass; always strictly positive
    pub quantity_grams: f32,
    /// Nutrition already scaled to `quantity_grams`, not per-100g
    pub kcal: f32,
    pub protein: f32,
    pub fat: f32,
    pub carbs: f32,
    /// Glycemic index, attached only for carbohydrate-bearing foods
    pub glycemic_index: Option<f32>,
    /// Calibrated confidence in `[0, 1]`
    pub match_confidence: f32,
    /// The canonical unit the quantity was interpreted in
    pub unit_matched: String,
    /// The numeric value in `unit_matched` units (before gram conversion)
    pub quantity_unit_value: f32,
    /// The query string the match was searched with
    pub original_query: String,
    /// Label of the resolution path that produced this match
    pub match_strategy: String,
    /// Serving units available for this product
    pub units: Vec<UnitDefinition>,
}

/// Output of the extractor; input to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealExtraction {
    pub meal_type: MealType,
    pub raw_transcription: String,
    pub items: Vec<IngredientChunk>,
    /// Extractor's confidence in the chunking, in `[0, 1]`
    pub overall_confidence: f32,
}

impl MealExtraction {
    pub fn new(meal_type: MealType, raw_transcription: &str) -> Self {
        Self {
            meal_type,
            raw_transcription: raw_transcription.to_string(),
            items: Vec::new(),
            overall_confidence: 1.0,
        }
    }

    pub fn with_items(mut self, items: Vec<IngredientChunk>) -> Self {
        self.items = items;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.overall_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// An extraction that produced no usable chunks.
    pub fn empty(raw_transcription: &str) -> Self {
        Self::new(MealType::Unknown, raw_transcription).with_confidence(0.0)
    }
}

/// Final artifact returned to callers.
///
/// `matched_products` and `unmatched_chunks` partition the extractor's
/// items exactly: every chunk lands in one list and only one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecognitionResult {
    pub matched_products: Vec<MatchedProduct>,
    pub unmatched_chunks: Vec<IngredientChunk>,
    /// Mean of individual match confidences; 0 when nothing matched
    pub overall_confidence: f32,
    pub processing_time_ms: f32,
    /// When the recognition completed
    pub recognized_at: DateTime<Utc>,
    /// Free-text remarks for the caller (e.g. which mentions stayed unmatched)
    pub notes: Vec<String>,
}

impl MealRecognitionResult {
    /// An empty, well-formed result used when extraction fails.
    pub fn degraded(unmatched_chunks: Vec<IngredientChunk>, processing_time_ms: f32) -> Self {
        Self {
            matched_products: Vec::new(),
            unmatched_chunks,
            overall_confidence: 0.0,
            processing_time_ms,
            recognized_at: Utc::now(),
            notes: vec!["extraction unavailable".to_string()],
        }
    }

    /// Total number of chunks the result accounts for.
    pub fn item_count(&self) -> usize {
        self.matched_products.len() + self.unmatched_chunks.len()
    }

    /// Sum of scaled calories over all matched products.
    pub fn total_kcal(&self) -> f32 {
        self.matched_products.iter().map(|m| m.kcal).sum()
    }
}
