//! # Ingredient Extractor Contract
//!
//! The pipeline is polymorphic over how ingredient mentions get extracted
//! from raw text. Two interchangeable strategies exist: the rule-based
//! chunker (fast, dependency-free, weaker recall) and the generative-model
//! client (higher recall, external dependency). `FallbackExtractor` chains
//! them: the primary runs first, and the fallback takes over when the
//! primary fails or is not confident enough.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::meal_model::MealExtraction;
use crate::recognition_errors::RecognitionError;

/// Capability set every extraction strategy implements.
///
/// The extraction confidence travels on
/// [`MealExtraction::overall_confidence`] rather than as a separate return
/// value, so callers hold one artifact.
#[async_trait]
pub trait IngredientExtractor: Send + Sync {
    /// Turn raw transcript text into an ordered list of ingredient
    /// mentions plus a meal-type guess.
    ///
    /// Fails with [`RecognitionError::ExtractionFailed`] when the
    /// underlying model is unreachable or returns unparseable output.
    async fn extract(&self, text: &str) -> Result<MealExtraction, RecognitionError>;

    /// Report readiness without performing extraction. Cheap; used before
    /// committing to a fallback chain.
    fn is_available(&self) -> bool;

    /// Short strategy label for logs and match-strategy tagging.
    fn name(&self) -> &'static str;
}

/// Chains a primary extractor with a fallback.
///
/// The fallback is consulted when the primary fails outright or reports a
/// confidence below `confidence_threshold`. A failing fallback does not
/// mask a usable primary result.
pub struct FallbackExtractor {
    primary: Arc<dyn IngredientExtractor>,
    fallback: Arc<dyn IngredientExtractor>,
    confidence_threshold: f32,
}

impl FallbackExtractor {
    pub fn new(
        primary: Arc<dyn IngredientExtractor>,
        fallback: Arc<dyn IngredientExtractor>,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            primary,
            fallback,
            confidence_threshold,
        }
    }
}

#[async_trait]
impl IngredientExtractor for FallbackExtractor {
    async fn extract(&self, text: &str) -> Result<MealExtraction, RecognitionError> {
        let primary_result = self.primary.extract(text).await;

        let primary_extraction = match primary_result {
            Ok(extraction) if extraction.overall_confidence >= self.confidence_threshold => {
                debug!(
                    "Primary extractor '{}' confident ({:.2}), skipping fallback",
                    self.primary.name(),
                    extraction.overall_confidence
                );
                return Ok(extraction);
            }
            Ok(extraction) => {
                info!(
                    "Primary extractor '{}' below threshold ({:.2} < {:.2})",
                    self.primary.name(),
                    extraction.overall_confidence,
                    self.confidence_threshold
                );
                Some(extraction)
            }
            Err(err) => {
                warn!("Primary extractor '{}' failed: {}", self.primary.name(), err);
                None
            }
        };

        if !self.fallback.is_available() {
            debug!(
                "Fallback extractor '{}' unavailable, keeping primary outcome",
                self.fallback.name()
            );
            return primary_extraction.ok_or_else(|| {
                RecognitionError::ExtractionFailed(
                    "primary failed and fallback unavailable".to_string(),
                )
            });
        }

        match self.fallback.extract(text).await {
            Ok(extraction) => {
                info!(
                    "Fallback extractor '{}' produced {} items ({:.2} confidence)",
                    self.fallback.name(),
                    extraction.items.len(),
                    extraction.overall_confidence
                );
                // Prefer whichever attempt is more confident; the fallback
                // was consulted precisely because the primary was weak.
                match primary_extraction {
                    Some(primary) if primary.overall_confidence > extraction.overall_confidence => {
                        Ok(primary)
                    }
                    _ => Ok(extraction),
                }
            }
            Err(err) => {
                warn!(
                    "Fallback extractor '{}' failed: {}",
                    self.fallback.name(),
                    err
                );
                primary_extraction.ok_or(err)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.primary.is_available() || self.fallback.is_available()
    }

    fn name(&self) -> &'static str {
        "fallback-chain"
    }
}
