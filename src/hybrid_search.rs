//! # Hybrid Search Engine
//!
//! Retrieval over the product catalogue blending two signals per
//! candidate: cosine similarity of multilingual name embeddings and a
//! lexical token-overlap score. The blend is
//! `alpha * lexical + (1 - alpha) * vector`; the default alpha weights the
//! vector signal more heavily, and callers raise it to bias toward exact
//! lexical hits on short ambiguous queries.
//!
//! The index is an in-memory upsert store safe for concurrent reads; the
//! embedding model behind it is an external collaborator.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};

use crate::embedding::{check_dimension, cosine_unit_interval, TextEmbedder};
use crate::keyword_verifier::tokens_overlap;
use crate::meal_model::{CatalogueProduct, SearchCandidate};
use crate::recognition_errors::RecognitionError;
use crate::text_normalizer::normalized_tokens;

/// Search access to the product catalogue.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    /// Return up to `top_k` candidates for a query, ordered by blended
    /// score descending. Ties resolve by catalogue popularity (higher
    /// first), then product id, so results are reproducible.
    async fn search(&self, query: &str, top_k: usize, alpha: f32) -> Result<Vec<SearchCandidate>>;

    /// Idempotent upsert of products into the index.
    async fn index_products(&self, products: &[CatalogueProduct]) -> Result<()>;

    /// Direct lookup bypassing search.
    fn get_product_by_id(&self, id: &str) -> Option<CatalogueProduct>;

    /// Direct lookup that treats absence as an error.
    fn require_product(&self, id: &str) -> Result<CatalogueProduct, RecognitionError> {
        self.get_product_by_id(id)
            .ok_or_else(|| RecognitionError::ProductNotFound(id.to_string()))
    }
}

/// Fraction of query tokens found in the candidate token set.
///
/// Tokens of length ≥ 3 may match by substring in either direction;
/// shorter tokens require equality. Empty queries score 0.
fn lexical_score(query_tokens: &[String], candidate_tokens: &[String]) -> f32 {
    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }
    let matched = query_tokens
        .iter()
        .filter(|q| candidate_tokens.iter().any(|c| tokens_overlap(q, c)))
        .count();
    matched as f32 / query_tokens.len() as f32
}

struct IndexedProduct {
    product: CatalogueProduct,
    embedding: Vec<f32>,
    tokens: Vec<String>,
}

/// In-memory hybrid index over catalogue products.
///
/// Embeds product names once at upsert time; queries embed once and score
/// against the stored vectors. Reads share the `RwLock` freely; the lock
/// is never held across an await point.
pub struct InMemoryHybridIndex {
    embedder: Arc<dyn TextEmbedder>,
    entries: RwLock<HashMap<String, IndexedProduct>>,
}

impl InMemoryHybridIndex {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of indexed products.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text a product is embedded and lexically indexed under.
    fn index_text(product: &CatalogueProduct) -> String {
        format!("{} {}", product.name_pl, product.name_en)
    }
}

#[async_trait]
impl ProductSearch for InMemoryHybridIndex {
    async fn search(&self, query: &str, top_k: usize, alpha: f32) -> Result<Vec<SearchCandidate>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let alpha = alpha.clamp(0.0, 1.0);

        let query_vector = self.embedder.embed(query).await?;
        check_dimension(&query_vector, self.embedder.dim())?;
        let query_tokens = normalized_tokens(query);

        let entries = self.entries.read().unwrap();
        let mut scored: Vec<(f32, &IndexedProduct)> = entries
            .values()
            .map(|entry| {
                let vector = cosine_unit_interval(&query_vector, &entry.embedding);
                let lexical = lexical_score(&query_tokens, &entry.tokens);
                let blended = alpha * lexical + (1.0 - alpha) * vector;
                (blended.clamp(0.0, 1.0), entry)
            })
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.product.popularity.cmp(&a.product.popularity))
                .then_with(|| a.product.id.cmp(&b.product.id))
        });
        scored.truncate(top_k);

        debug!(
            "Hybrid search for '{}' scored {} products, returning {}",
            query,
            entries.len(),
            scored.len()
        );

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchCandidate {
                product_id: entry.product.id.clone(),
                name: entry.product.name_pl.clone(),
                score,
                category: entry.product.category.clone(),
            })
            .collect())
    }

    async fn index_products(&self, products: &[CatalogueProduct]) -> Result<()> {
        if products.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = products.iter().map(Self::index_text).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != products.len() {
            return Err(anyhow::anyhow!(
                "Embedder returned {} vectors for {} products",
                embeddings.len(),
                products.len()
            ));
        }

        let mut entries = self.entries.write().unwrap();
        for (product, embedding) in products.iter().zip(embeddings) {
            check_dimension(&embedding, self.embedder.dim())?;
            entries.insert(
                product.id.clone(),
                IndexedProduct {
                    tokens: normalized_tokens(&Self::index_text(product)),
                    product: product.clone(),
                    embedding,
                },
            );
        }

        info!("Indexed {} products ({} total)", products.len(), entries.len());
        Ok(())
    }

    fn get_product_by_id(&self, id: &str) -> Option<CatalogueProduct> {
        self.entries
            .read()
            .unwrap()
            .get(id)
            .map(|entry| entry.product.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_model::UnitDefinition;

    /// Deterministic low-dimension embedder for tests: known texts map to
    /// fixed vectors, everything else to a constant direction.
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        dim: usize,
    }

    impl StubEmbedder {
        fn new(dim: usize, pairs: Vec<(&str, Vec<f32>)>) -> Self {
            Self {
                vectors: pairs
                    .into_iter()
                    .map(|(text, vector)| (text.to_string(), vector))
                    .collect(),
                dim,
            }
        }
    }

    #[async_trait]
    impl TextEmbedder for StubEmbedder {
        fn dim(&self) -> usize {
            self.dim
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    self.vectors
                        .get(text)
                        .cloned()
                        .unwrap_or_else(|| vec![1.0; self.dim])
                })
                .collect())
        }
    }

    fn product(id: &str, name_pl: &str, name_en: &str, popularity: u32) -> CatalogueProduct {
        CatalogueProduct {
            id: id.to_string(),
            name_pl: name_pl.to_string(),
            name_en: name_en.to_string(),
            kcal_per_100g: 100.0,
            protein_per_100g: 5.0,
            fat_per_100g: 2.0,
            carbs_per_100g: 15.0,
            category: None,
            popularity,
            units: vec![UnitDefinition::new("sztuka", 100.0)],
            default_portion_grams: None,
        }
    }

    #[tokio::test]
    async fn test_index_and_lookup_by_id() {
        let embedder = Arc::new(StubEmbedder::new(4, vec![]));
        let index = InMemoryHybridIndex::new(embedder);

        index
            .index_products(&[product("p1", "ryż biały", "white rice", 1)])
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        let found = index.get_product_by_id("p1").unwrap();
        assert_eq!(found.name_pl, "ryż biały");
        assert!(index.get_product_by_id("missing").is_none());
        assert!(matches!(
            index.require_product("missing"),
            Err(RecognitionError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let embedder = Arc::new(StubEmbedder::new(4, vec![]));
        let index = InMemoryHybridIndex::new(embedder);

        let products = [product("p1", "ryż biały", "white rice", 1)];
        index.index_products(&products).await.unwrap();
        index.index_products(&products).await.unwrap();

        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_vector_signal_ranks_similar_first() {
        let embedder = Arc::new(StubEmbedder::new(
            2,
            vec![
                ("ryż biały white rice", vec![1.0, 0.0]),
                ("kefir naturalny kefir", vec![0.0, 1.0]),
                ("ryż", vec![1.0, 0.0]),
            ],
        ));
        let index = InMemoryHybridIndex::new(embedder);
        index
            .index_products(&[
                product("rice", "ryż biały", "white rice", 1),
                product("kefir", "kefir naturalny", "kefir", 1),
            ])
            .await
            .unwrap();

        let candidates = index.search("ryż", 10, 0.0).await.unwrap();
        assert_eq!(candidates[0].product_id, "rice");
        assert!(candidates[0].score > candidates[1].score);
    }

    #[tokio::test]
    async fn test_alpha_biases_toward_lexical() {
        // Vectors are identical, so only the lexical signal separates the
        // two products.
        let embedder = Arc::new(StubEmbedder::new(2, vec![]));
        let index = InMemoryHybridIndex::new(embedder);
        index
            .index_products(&[
                product("bread", "chleb pszenny", "wheat bread", 1),
                product("rice", "ryż biały", "white rice", 1),
            ])
            .await
            .unwrap();

        let candidates = index.search("chleb", 10, 1.0).await.unwrap();
        assert_eq!(candidates[0].product_id, "bread");
        assert!((candidates[0].score - 1.0).abs() < 1e-6);
        assert_eq!(candidates[1].score, 0.0);
    }

    #[tokio::test]
    async fn test_tie_break_popularity_then_id() {
        let embedder = Arc::new(StubEmbedder::new(2, vec![]));
        let index = InMemoryHybridIndex::new(embedder);
        index
            .index_products(&[
                product("b-low", "mleko", "milk", 2),
                product("a-high", "mleko", "milk", 9),
                product("a-low", "mleko", "milk", 2),
            ])
            .await
            .unwrap();

        let candidates = index.search("mleko", 10, 0.5).await.unwrap();
        let ids: Vec<&str> = candidates.iter().map(|c| c.product_id.as_str()).collect();
        assert_eq!(ids, vec!["a-high", "a-low", "b-low"]);
    }

    #[tokio::test]
    async fn test_top_k_truncation() {
        let embedder = Arc::new(StubEmbedder::new(2, vec![]));
        let index = InMemoryHybridIndex::new(embedder);
        let products: Vec<CatalogueProduct> = (0..30)
            .map(|i| product(&format!("p{i:02}"), "mleko", "milk", i))
            .collect();
        index.index_products(&products).await.unwrap();

        let candidates = index.search("mleko", 20, 0.3).await.unwrap();
        assert_eq!(candidates.len(), 20);

        let none = index.search("mleko", 0, 0.3).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        struct BadEmbedder;

        #[async_trait]
        impl TextEmbedder for BadEmbedder {
            fn dim(&self) -> usize {
                4
            }
            async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
            }
        }

        let index = InMemoryHybridIndex::new(Arc::new(BadEmbedder));
        let err = index
            .index_products(&[product("p1", "mleko", "milk", 1)])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn test_lexical_score_fractions() {
        let query = vec!["ryzu".to_string(), "bialego".to_string()];
        let name = vec!["ryz".to_string(), "bialy".to_string()];
        // "ryzu" contains "ryz"; "bialego" and "bialy" share no substring.
        assert!((lexical_score(&query, &name) - 0.5).abs() < 1e-6);
        assert_eq!(lexical_score(&[], &name), 0.0);
    }
}
