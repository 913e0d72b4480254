//! # Meal Recognition Orchestrator
//!
//! Composes the pipeline: extract → per-chunk resolution (search → verify
//! → quantity → scale → score → GI) → aggregate. Per-chunk work runs
//! concurrently; results keep the extractor's original chunk order so
//! output is reproducible.
//!
//! ## Failure semantics
//!
//! - Extraction failure is request-fatal: the caller still receives a
//!   well-formed result, with no matches and zero confidence
//! - Per-chunk failures (search timeout, verifier rejection, unusable
//!   quantity, missing product) are local: the chunk moves to
//!   `unmatched_chunks` and the others proceed

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use tracing::Instrument;
use unic_langid::LanguageIdentifier;

use crate::extractor::IngredientExtractor;
use crate::glycemic_index::match_gi;
use crate::hybrid_search::ProductSearch;
use crate::meal_model::{
    IngredientChunk, MatchedProduct, MealRecognitionResult, SearchCandidate,
};
use crate::keyword_verifier::verify_keyword_consistency;
use crate::recognition_config::RecognitionConfig;
use crate::recognition_errors::RecognitionError;
use crate::speech::{validate_audio, SpeechToText};
use crate::unit_resolution::resolve_grams;

/// Strategy label for transcript-driven hybrid resolution.
pub const STRATEGY_VECTOR_HYBRID: &str = "vector-hybrid";
/// Strategy label for vision-derived text resolved through the same path.
pub const STRATEGY_VISION_HYBRID: &str = "vision-hybrid";

/// The meal-recognition pipeline.
///
/// Holds only shared read-only collaborators, so one instance serves
/// concurrent requests. Construct once at startup and inject wherever
/// requests are handled.
pub struct MealRecognizer {
    extractor: Arc<dyn IngredientExtractor>,
    search: Arc<dyn ProductSearch>,
    config: RecognitionConfig,
}

impl MealRecognizer {
    pub fn new(
        extractor: Arc<dyn IngredientExtractor>,
        search: Arc<dyn ProductSearch>,
        config: RecognitionConfig,
    ) -> Self {
        Self {
            extractor,
            search,
            config,
        }
    }

    /// Recognize a meal from transcript text.
    pub async fn recognize(&self, raw_text: &str) -> MealRecognitionResult {
        self.recognize_with_strategy(raw_text, STRATEGY_VECTOR_HYBRID)
            .await
    }

    /// Recognize a meal from vision-derived text. Identical pipeline;
    /// matches carry the vision strategy label.
    pub async fn recognize_vision_text(&self, raw_text: &str) -> MealRecognitionResult {
        self.recognize_with_strategy(raw_text, STRATEGY_VISION_HYBRID)
            .await
    }

    /// Recognize a meal from raw audio: validate, transcribe, recognize.
    ///
    /// Input validation errors reject the request outright with no partial
    /// processing. A failing transcription degrades to an empty result,
    /// the same contract as a failing extraction.
    pub async fn recognize_audio(
        &self,
        audio: &[u8],
        language: &LanguageIdentifier,
        speech: &dyn SpeechToText,
    ) -> Result<MealRecognitionResult, RecognitionError> {
        validate_audio(audio, &self.config.audio)?;

        let transcript = match speech.transcribe(audio, language).await {
            Ok(text) => text,
            Err(err) => {
                warn!("Transcription failed, degrading to empty result: {err}");
                return Ok(MealRecognitionResult::degraded(Vec::new(), 0.0));
            }
        };

        debug!("Transcribed {} bytes of audio into {} chars", audio.len(), transcript.len());
        Ok(self.recognize(&transcript).await)
    }

    async fn recognize_with_strategy(
        &self,
        raw_text: &str,
        strategy: &str,
    ) -> MealRecognitionResult {
        let span = tracing::info_span!("meal_recognition", strategy, text_len = raw_text.len());
        self.run_pipeline(raw_text, strategy).instrument(span).await
    }

    async fn run_pipeline(&self, raw_text: &str, strategy: &str) -> MealRecognitionResult {
        let started = Instant::now();

        let extraction_deadline = Duration::from_secs(self.config.extraction.timeout_secs);
        let extraction =
            match tokio::time::timeout(extraction_deadline, self.extractor.extract(raw_text)).await
            {
                Ok(Ok(extraction)) => extraction,
                Ok(Err(err)) => {
                    warn!("Extraction failed, degrading to empty result: {err}");
                    return MealRecognitionResult::degraded(Vec::new(), elapsed_ms(started));
                }
                Err(_) => {
                    warn!(
                        "Extraction timed out after {}s, degrading to empty result",
                        extraction_deadline.as_secs()
                    );
                    return MealRecognitionResult::degraded(Vec::new(), elapsed_ms(started));
                }
            };

        info!(
            "Extracted {} mentions ({} meal, confidence {:.2})",
            extraction.items.len(),
            extraction.meal_type,
            extraction.overall_confidence
        );

        let resolutions = join_all(
            extraction
                .items
                .iter()
                .map(|chunk| self.resolve_chunk(chunk, strategy)),
        )
        .await;

        let mut matched_products = Vec::new();
        let mut unmatched_chunks = Vec::new();
        for (chunk, resolution) in extraction.items.iter().zip(resolutions) {
            match resolution {
                Some(matched) => matched_products.push(matched),
                None => unmatched_chunks.push(chunk.clone()),
            }
        }

        let overall_confidence = if matched_products.is_empty() {
            0.0
        } else {
            matched_products
                .iter()
                .map(|m| m.match_confidence)
                .sum::<f32>()
                / matched_products.len() as f32
        };

        let mut notes = Vec::new();
        if !unmatched_chunks.is_empty() {
            notes.push(format!(
                "{} of {} mentions could not be matched to the catalogue",
                unmatched_chunks.len(),
                extraction.items.len()
            ));
        }

        let result = MealRecognitionResult {
            matched_products,
            unmatched_chunks,
            overall_confidence,
            processing_time_ms: elapsed_ms(started),
            recognized_at: Utc::now(),
            notes,
        };

        info!(
            "Recognition finished: {} matched, {} unmatched, confidence {:.2}, {:.1}ms",
            result.matched_products.len(),
            result.unmatched_chunks.len(),
            result.overall_confidence,
            result.processing_time_ms
        );
        result
    }

    /// Resolve one chunk against the catalogue. `None` means unmatched;
    /// nothing in here aborts the sibling chunks.
    async fn resolve_chunk(&self, chunk: &IngredientChunk, strategy: &str) -> Option<MatchedProduct> {
        let query = chunk.name.as_str();
        let search_deadline = Duration::from_secs(self.config.search.timeout_secs);

        let candidates = match tokio::time::timeout(
            search_deadline,
            self.search
                .search(query, self.config.search.top_k, self.config.search.alpha),
        )
        .await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(err)) => {
                warn!("Search failed for '{query}': {err}");
                return None;
            }
            Err(_) => {
                warn!(
                    "Search timed out for '{query}' after {}s",
                    search_deadline.as_secs()
                );
                return None;
            }
        };

        let best = self.pick_candidate(query, &candidates)?;
        let product = self.search.get_product_by_id(&best.product_id).or_else(|| {
            warn!(
                "Candidate {} vanished between search and lookup",
                best.product_id
            );
            None
        })?;

        let resolved = resolve_grams(
            chunk.quantity,
            chunk.unit.as_deref(),
            &product,
            &self.config.resolution,
        )?;

        let nutrition = product.nutrition_for_grams(resolved.grams);
        let quantity_factor = if resolved.explicit {
            1.0
        } else {
            self.config.resolution.implicit_quantity_factor
        };
        let match_confidence = (best.score * quantity_factor).clamp(0.0, 1.0);
        let glycemic_index = match_gi(&product.name_pl, product.carbs_per_100g);

        debug!(
            "Matched '{}' -> {} ({}g, confidence {:.2})",
            query, product.id, resolved.grams, match_confidence
        );

        Some(MatchedProduct {
            product_id: product.id,
            name_pl: product.name_pl,
            name_en: product.name_en,
            quantity_grams: resolved.grams,
            kcal: nutrition.kcal,
            protein: nutrition.protein,
            fat: nutrition.fat,
            carbs: nutrition.carbs,
            glycemic_index,
            match_confidence,
            unit_matched: resolved.unit_matched,
            quantity_unit_value: resolved.unit_value,
            original_query: query.to_string(),
            match_strategy: strategy.to_string(),
            units: product.units,
        })
    }

    /// Highest-scoring candidate that survives keyword verification.
    fn pick_candidate<'a>(
        &self,
        query: &str,
        candidates: &'a [SearchCandidate],
    ) -> Option<&'a SearchCandidate> {
        let survivor = candidates
            .iter()
            .find(|candidate| verify_keyword_consistency(query, &candidate.name));
        if survivor.is_none() && !candidates.is_empty() {
            debug!(
                "All {} candidates for '{}' failed keyword verification",
                candidates.len(),
                query
            );
        }
        survivor
    }

    /// Direct product lookup, surfacing absence as an error.
    pub fn product_by_id(&self, id: &str) -> Result<crate::meal_model::CatalogueProduct, RecognitionError> {
        self.search.require_product(id)
    }
}

fn elapsed_ms(started: Instant) -> f32 {
    started.elapsed().as_secs_f32() * 1000.0
}
