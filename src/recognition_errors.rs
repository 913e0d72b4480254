//! # Recognition Error Types Module
//!
//! Error taxonomy for the meal-recognition pipeline. Unmatched chunks are
//! deliberately not represented here: staying unmatched is a first-class
//! outcome recorded on the result, not an error.

/// Errors surfaced by the recognition pipeline and its collaborators.
#[derive(Debug, Clone)]
pub enum RecognitionError {
    /// Extraction model unreachable or returned an unparseable structure.
    /// Request-fatal: the caller receives a degraded empty result.
    ExtractionFailed(String),
    /// Direct catalogue lookup by id found nothing. Local; caller decides.
    ProductNotFound(String),
    /// Input audio is not in a supported container format.
    AudioFormat(String),
    /// Input audio exceeds the configured size or duration cap.
    AudioTooLong(String),
    /// The embedding model rejected a request or returned a bad vector.
    EmbeddingFailed(String),
    /// An external call exceeded its deadline.
    Timeout(String),
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionError::ExtractionFailed(msg) => write!(f, "Extraction failed: {msg}"),
            RecognitionError::ProductNotFound(id) => write!(f, "Product not found: {id}"),
            RecognitionError::AudioFormat(msg) => write!(f, "Audio format error: {msg}"),
            RecognitionError::AudioTooLong(msg) => write!(f, "Audio too long: {msg}"),
            RecognitionError::EmbeddingFailed(msg) => write!(f, "Embedding failed: {msg}"),
            RecognitionError::Timeout(msg) => write!(f, "Timeout: {msg}"),
        }
    }
}

impl std::error::Error for RecognitionError {}

impl From<anyhow::Error> for RecognitionError {
    fn from(err: anyhow::Error) -> Self {
        RecognitionError::ExtractionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RecognitionError::ExtractionFailed("model offline".to_string());
        assert_eq!(format!("{err}"), "Extraction failed: model offline");

        let err = RecognitionError::ProductNotFound("rice-white".to_string());
        assert_eq!(format!("{err}"), "Product not found: rice-white");
    }

    #[test]
    fn test_from_anyhow() {
        let err: RecognitionError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, RecognitionError::ExtractionFailed(_)));
    }
}
