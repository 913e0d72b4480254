//! Wiring demo for the recognition pipeline.
//!
//! Runs one transcript through chunking, hybrid search over a small
//! in-memory catalogue, and aggregation, then prints the result as JSON.
//! The embedding model is stubbed with a deterministic token-hash
//! embedder so the demo works offline; production wiring injects a real
//! multilingual sentence-embedding backend instead.
//!
//! Usage: `cargo run --example recognize_meal -- "zjadłem 200 gramów ryżu białego"`

use std::env;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::info;

use mealmatch::chunk_extractor::RuleBasedExtractor;
use mealmatch::embedding::{TextEmbedder, EMBEDDING_DIM};
use mealmatch::extractor::FallbackExtractor;
use mealmatch::hybrid_search::{InMemoryHybridIndex, ProductSearch};
use mealmatch::llm_extractor::LlmExtractor;
use mealmatch::meal_model::{CatalogueProduct, UnitDefinition};
use mealmatch::recognition::MealRecognizer;
use mealmatch::recognition_config::RecognitionConfig;
use mealmatch::text_normalizer::normalized_tokens;

/// Offline stand-in for the embedding model: each normalized token lights
/// up a handful of hash-derived dimensions, so shared tokens mean nearby
/// vectors. Good enough to demonstrate the blend; not a real model.
struct TokenHashEmbedder;

#[async_trait]
impl TextEmbedder for TokenHashEmbedder {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; EMBEDDING_DIM];
                for token in normalized_tokens(text) {
                    let mut hash: usize = 5381;
                    for byte in token.bytes() {
                        hash = hash.wrapping_mul(33).wrapping_add(byte as usize);
                    }
                    for offset in 0..4 {
                        vector[(hash.wrapping_add(offset * 97)) % EMBEDDING_DIM] += 1.0;
                    }
                }
                vector
            })
            .collect())
    }
}

fn demo_catalogue() -> Vec<CatalogueProduct> {
    vec![
        CatalogueProduct {
            id: "rice-white".to_string(),
            name_pl: "ryż biały".to_string(),
            name_en: "white rice".to_string(),
            kcal_per_100g: 130.0,
            protein_per_100g: 2.7,
            fat_per_100g: 0.3,
            carbs_per_100g: 28.8,
            category: Some("grains".to_string()),
            popularity: 50,
            units: vec![UnitDefinition::new("szklanka", 180.0)],
            default_portion_grams: Some(150.0),
        },
        CatalogueProduct {
            id: "bread-wheat".to_string(),
            name_pl: "chleb pszenny".to_string(),
            name_en: "wheat bread".to_string(),
            kcal_per_100g: 250.0,
            protein_per_100g: 8.0,
            fat_per_100g: 3.0,
            carbs_per_100g: 48.0,
            category: Some("bakery".to_string()),
            popularity: 80,
            units: vec![UnitDefinition::new("kromka", 40.0)],
            default_portion_grams: Some(80.0),
        },
        CatalogueProduct {
            id: "yogurt-plain".to_string(),
            name_pl: "jogurt naturalny".to_string(),
            name_en: "plain yogurt".to_string(),
            kcal_per_100g: 61.0,
            protein_per_100g: 4.3,
            fat_per_100g: 3.2,
            carbs_per_100g: 4.7,
            category: Some("dairy".to_string()),
            popularity: 60,
            units: vec![UnitDefinition::new("opakowanie", 150.0)],
            default_portion_grams: Some(150.0),
        },
        CatalogueProduct {
            id: "banana".to_string(),
            name_pl: "banan".to_string(),
            name_en: "banana".to_string(),
            kcal_per_100g: 89.0,
            protein_per_100g: 1.1,
            fat_per_100g: 0.3,
            carbs_per_100g: 22.8,
            category: Some("fruit".to_string()),
            popularity: 70,
            units: vec![UnitDefinition::new("sztuka", 120.0)],
            default_portion_grams: Some(120.0),
        },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let transcript = env::args()
        .nth(1)
        .unwrap_or_else(|| "zjadłem 200 gramów ryżu białego i dwie kromki chleba".to_string());

    let config = RecognitionConfig::from_env();

    info!("Indexing demo catalogue");
    let index = Arc::new(InMemoryHybridIndex::new(Arc::new(TokenHashEmbedder)));
    index.index_products(&demo_catalogue()).await?;

    let llm = LlmExtractor::new(config.extraction.clone(), config.breaker.clone())?;
    let extractor = FallbackExtractor::new(
        Arc::new(RuleBasedExtractor::new()),
        Arc::new(llm),
        config.extraction.fallback_confidence_threshold,
    );

    let recognizer = MealRecognizer::new(Arc::new(extractor), index, config);

    info!("Recognizing: {transcript}");
    let result = recognizer.recognize(&transcript).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
