//! # Generative-Model Extractor
//!
//! Fallback extraction strategy that asks a hosted completion model to
//! chunk the transcript. Higher recall than the rule-based path on
//! unusual phrasing, at the cost of latency and an external dependency.
//! Repeated failures open the circuit breaker so the fallback chain stops
//! consulting a dead endpoint.

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::circuit_breaker::ExtractorBreaker;
use crate::extractor::IngredientExtractor;
use crate::meal_model::{IngredientChunk, MealExtraction, MealType};
use crate::recognition_config::{BreakerConfig, ExtractionConfig};
use crate::recognition_errors::RecognitionError;

const SYSTEM_PROMPT: &str = r#"Parse the user's meal description into structured JSON.

For each mentioned food, extract:
- name: the food name as mentioned (keep the original language)
- quantity: the numeric amount, or null if not specified
- unit: the unit as mentioned (e.g. "gram", "kromka", "szklanka"), or null

Also report:
- meal_type: one of "breakfast", "lunch", "dinner", "snack", "unknown"
- confidence: your confidence in the item list, 0.0 to 1.0

Respond with ONLY a JSON object, no other text. Example:
{"meal_type": "lunch", "confidence": 0.9, "items": [{"name": "ryż biały", "quantity": 200, "unit": "gram"}]}"#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// The JSON payload the model is instructed to produce.
#[derive(Debug, Deserialize)]
struct MealPayload {
    meal_type: Option<String>,
    confidence: Option<f32>,
    #[serde(default)]
    items: Vec<MealPayloadItem>,
}

#[derive(Debug, Deserialize)]
struct MealPayloadItem {
    name: String,
    quantity: Option<f32>,
    unit: Option<String>,
}

fn parse_meal_type(raw: Option<&str>) -> MealType {
    match raw {
        Some("breakfast") => MealType::Breakfast,
        Some("lunch") => MealType::Lunch,
        Some("dinner") => MealType::Dinner,
        Some("snack") => MealType::Snack,
        _ => MealType::Unknown,
    }
}

/// Extraction strategy backed by a hosted completion endpoint.
///
/// Explicitly constructed and injected; expensive pieces (the HTTP client,
/// connection pool) are built once and reused across requests.
pub struct LlmExtractor {
    client: reqwest::Client,
    config: ExtractionConfig,
    breaker: ExtractorBreaker,
}

impl LlmExtractor {
    /// Build the extractor with its own pooled HTTP client.
    pub fn new(config: ExtractionConfig, breaker_config: BreakerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            breaker: ExtractorBreaker::new(breaker_config),
        })
    }

    /// Parse the model's JSON reply into a `MealExtraction`.
    ///
    /// Kept separate from the transport so the contract is testable
    /// without a live endpoint.
    fn parse_payload(raw_text: &str, content: &str) -> Result<MealExtraction, RecognitionError> {
        let payload: MealPayload = serde_json::from_str(content.trim()).map_err(|e| {
            RecognitionError::ExtractionFailed(format!(
                "model returned unparseable JSON: {e}"
            ))
        })?;

        let items: Vec<IngredientChunk> = payload
            .items
            .into_iter()
            .filter(|item| !item.name.trim().is_empty())
            .map(|item| {
                let mut chunk = IngredientChunk::new(item.name.trim(), item.name.trim());
                if let Some(quantity) = item.quantity {
                    chunk = chunk.with_quantity(quantity);
                }
                if let Some(unit) = item.unit.as_deref() {
                    chunk = chunk.with_unit(unit);
                }
                chunk
            })
            .collect();

        let confidence = payload.confidence.unwrap_or(0.85);
        Ok(
            MealExtraction::new(parse_meal_type(payload.meal_type.as_deref()), raw_text)
                .with_items(items)
                .with_confidence(confidence),
        )
    }

    async fn request_completion(&self, text: &str) -> Result<String, RecognitionError> {
        let endpoint = self.config.llm_endpoint.as_deref().ok_or_else(|| {
            RecognitionError::ExtractionFailed("no extraction endpoint configured".to_string())
        })?;

        let request = ChatRequest {
            model: &self.config.llm_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(key) = self.config.llm_api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            RecognitionError::ExtractionFailed(format!("extraction endpoint unreachable: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(RecognitionError::ExtractionFailed(format!(
                "extraction endpoint returned status {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            RecognitionError::ExtractionFailed(format!("malformed completion envelope: {e}"))
        })?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                RecognitionError::ExtractionFailed("completion had no choices".to_string())
            })
    }
}

#[async_trait]
impl IngredientExtractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<MealExtraction, RecognitionError> {
        if self.breaker.is_open() {
            return Err(RecognitionError::ExtractionFailed(
                "extraction model circuit breaker is open".to_string(),
            ));
        }

        match self.request_completion(text).await {
            Ok(content) => {
                debug!("Extraction model replied with {} bytes", content.len());
                match Self::parse_payload(text, &content) {
                    Ok(extraction) => {
                        self.breaker.record_success();
                        Ok(extraction)
                    }
                    Err(err) => {
                        self.breaker.record_failure();
                        warn!("Extraction model reply rejected: {err}");
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.breaker.record_failure();
                Err(err)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.config.llm_endpoint.is_some() && !self.breaker.is_open()
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
