//! # Recognition Configuration Module
//!
//! Configuration structures for the meal-recognition pipeline: search
//! blending, extraction fallback, circuit-breaker settings, audio input
//! limits, and quantity-resolution defaults.

use std::env;

use log::warn;

// Constants for pipeline configuration
pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_ALPHA: f32 = 0.3;
pub const DEFAULT_PORTION_GRAMS: f32 = 100.0;
pub const MAX_AUDIO_FILE_SIZE: u64 = 25 * 1024 * 1024; // 25MB limit for audio files

/// Hybrid-search tunables.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of candidates returned per query
    pub top_k: usize,
    /// Lexical weight in the blend: `alpha * lexical + (1 - alpha) * vector`
    pub alpha: f32,
    /// Deadline for one search-index query in seconds
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_ALPHA,
            timeout_secs: 5,
        }
    }
}

/// Extraction strategy tunables.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Below this rule-based confidence the generative fallback is consulted
    pub fallback_confidence_threshold: f32,
    /// Deadline for one extraction call in seconds
    pub timeout_secs: u64,
    /// Completion endpoint of the generative extraction model
    pub llm_endpoint: Option<String>,
    /// Bearer token for the endpoint, if it requires one
    pub llm_api_key: Option<String>,
    /// Model identifier sent with each completion request
    pub llm_model: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fallback_confidence_threshold: 0.6,
            timeout_secs: 20,
            llm_endpoint: None,
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Circuit-breaker settings guarding the generative extractor.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before closing again
    pub reset_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_secs: 60,
        }
    }
}

/// Per-container size caps for audio input validation.
#[derive(Debug, Clone)]
pub struct AudioSizeLimits {
    /// WAV is uncompressed, so the cap is generous
    pub wav_max: u64,
    pub mp3_max: u64,
    pub ogg_max: u64,
    pub flac_max: u64,
    pub m4a_max: u64,
}

impl Default for AudioSizeLimits {
    fn default() -> Self {
        Self {
            wav_max: 25 * 1024 * 1024,
            mp3_max: 15 * 1024 * 1024,
            ogg_max: 15 * 1024 * 1024,
            flac_max: 20 * 1024 * 1024,
            m4a_max: 15 * 1024 * 1024,
        }
    }
}

/// Audio input validation settings.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Global byte cap applied before format detection
    pub max_file_size: u64,
    /// Longest accepted recording in seconds
    pub max_duration_secs: u32,
    /// Per-format byte caps
    pub size_limits: AudioSizeLimits,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_AUDIO_FILE_SIZE,
            max_duration_secs: 120,
            size_limits: AudioSizeLimits::default(),
        }
    }
}

/// Quantity-resolution defaults.
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Portion mass assumed when neither the mention nor the product
    /// supplies a usable quantity
    pub default_portion_grams: f32,
    /// Confidence multiplier applied when quantity or unit was defaulted
    pub implicit_quantity_factor: f32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            default_portion_grams: DEFAULT_PORTION_GRAMS,
            implicit_quantity_factor: 0.8,
        }
    }
}

/// Top-level configuration for the recognition pipeline.
#[derive(Debug, Clone, Default)]
pub struct RecognitionConfig {
    pub search: SearchConfig,
    pub extraction: ExtractionConfig,
    pub breaker: BreakerConfig,
    pub audio: AudioConfig,
    pub resolution: ResolutionConfig,
}

impl RecognitionConfig {
    /// Build a configuration from defaults overridden by environment
    /// variables.
    ///
    /// Recognized variables: `MEALMATCH_LLM_ENDPOINT`,
    /// `MEALMATCH_LLM_API_KEY`, `MEALMATCH_LLM_MODEL`,
    /// `MEALMATCH_SEARCH_ALPHA`, `MEALMATCH_SEARCH_TOP_K`. Unparseable
    /// numeric values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = env::var("MEALMATCH_LLM_ENDPOINT") {
            if !endpoint.is_empty() {
                config.extraction.llm_endpoint = Some(endpoint);
            }
        }
        if let Ok(key) = env::var("MEALMATCH_LLM_API_KEY") {
            if !key.is_empty() {
                config.extraction.llm_api_key = Some(key);
            }
        }
        if let Ok(model) = env::var("MEALMATCH_LLM_MODEL") {
            if !model.is_empty() {
                config.extraction.llm_model = model;
            }
        }
        if let Ok(raw) = env::var("MEALMATCH_SEARCH_ALPHA") {
            match raw.parse::<f32>() {
                Ok(alpha) if (0.0..=1.0).contains(&alpha) => config.search.alpha = alpha,
                _ => warn!("Ignoring invalid MEALMATCH_SEARCH_ALPHA value: '{raw}'"),
            }
        }
        if let Ok(raw) = env::var("MEALMATCH_SEARCH_TOP_K") {
            match raw.parse::<usize>() {
                Ok(top_k) if top_k > 0 => config.search.top_k = top_k,
                _ => warn!("Ignoring invalid MEALMATCH_SEARCH_TOP_K value: '{raw}'"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecognitionConfig::default();
        assert_eq!(config.search.top_k, 20);
        assert!((config.search.alpha - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.resolution.default_portion_grams, 100.0);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert!(config.extraction.llm_endpoint.is_none());
    }

    #[test]
    fn test_alpha_weights_vector_more_heavily_by_default() {
        let config = SearchConfig::default();
        assert!(config.alpha < 0.5);
    }
}
