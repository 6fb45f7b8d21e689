//! The embedding seam: text in, fixed-dimension vectors out.
//!
//! The index builder and the retrieval path must use the same provider; the
//! snapshot records the provider's model id so a drifting configuration is
//! detected at load time instead of silently degrading retrieval.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::{
    config::{API_KEY_ENV_VAR, Settings},
    error::{Error, Result},
};

/// Maps batches of texts to fixed-dimension dense vectors.
///
/// Implementations are pure from the caller's perspective: the same text
/// maps to the same vector for the lifetime of the process, and every vector
/// from one provider has the same dimension.
pub trait Embedder: Send + Sync {
    /// Identifier recorded in the index snapshot.
    fn model_id(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Select the embedding provider from settings.
///
/// With an API key configured the OpenAI-compatible remote provider is used;
/// otherwise the deterministic local embedder keeps the system functional
/// offline (with reduced retrieval quality).
pub fn embedder_from_settings(settings: &Settings) -> Arc<dyn Embedder> {
    match std::env::var(API_KEY_ENV_VAR) {
        Ok(key) if !key.is_empty() => Arc::new(RemoteEmbedder::new(
            settings.embed_model.clone(),
            settings.api_base_url.clone(),
            key,
        )),
        _ => {
            warn!(
                "{API_KEY_ENV_VAR} not set; using the local hashed embedder"
            );
            Arc::new(HashEmbedder::default())
        }
    }
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
pub struct RemoteEmbedder {
    model: String,
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(model: String, base_url: String, api_key: String) -> Self {
        Self {
            model,
            base_url,
            api_key,
            agent: ureq::agent(),
        }
    }
}

impl Embedder for RemoteEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .map_err(|err| match err {
                ureq::Error::Status(code, response) => Error::Embedding(
                    format!(
                        "HTTP {code}: {}",
                        response.into_string().unwrap_or_default()
                    ),
                ),
                ureq::Error::Transport(transport) => {
                    Error::Embedding(transport.to_string())
                }
            })?;

        let mut parsed: EmbeddingResponse = response
            .into_json()
            .map_err(|err| Error::Embedding(err.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // The API reports an index per row; order by it rather than
        // trusting response order.
        parsed.data.sort_by_key(|row| row.index);
        Ok(parsed.data.into_iter().map(|row| row.embedding).collect())
    }
}

/// Dimension of the local hashed bag-of-words embedding.
pub const HASH_EMBED_DIM: usize = 256;

/// Deterministic hashed bag-of-words embedder.
///
/// Each lowercase whitespace token hashes to one of [`HASH_EMBED_DIM`]
/// signed buckets; the bucket counts are L2-normalized. No model weights,
/// no network: the fallback provider for offline use, and the fixture
/// provider for tests. Same text in, same vector out, on every run.
#[derive(Debug, Default)]
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        "local/hashed-bow-256"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| hash_embed(text)).collect())
    }
}

fn hash_embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; HASH_EMBED_DIM];
    for token in text.to_lowercase().split_whitespace() {
        let hash = fnv1a(token.as_bytes());
        let bucket = (hash % HASH_EMBED_DIM as u64) as usize;
        let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

// FNV-1a, fixed offset/prime so vectors are stable across runs and builds.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed_one(text: &str) -> Vec<f32> {
        HashEmbedder
            .embed(&[text.to_string()])
            .unwrap()
            .pop()
            .unwrap()
    }

    fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }

    #[test]
    fn hash_embedder_is_deterministic() {
        let a = embed_one("battery capacity 4422 mAh");
        let b = embed_one("battery capacity 4422 mAh");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_EMBED_DIM);
    }

    #[test]
    fn vectors_are_l2_normalized() {
        let v = embed_one("display panel brightness nits");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let v = embed_one("");
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn shared_vocabulary_is_closer_than_disjoint() {
        let query = embed_one("battery capacity");
        let related = embed_one("battery capacity is 4422 mah");
        let unrelated = embed_one("titanium frame ceramic shield glass");

        assert!(
            l2_distance(&query, &related) < l2_distance(&query, &unrelated)
        );
    }

    #[test]
    fn batch_preserves_input_order() {
        let vectors = HashEmbedder
            .embed(&["alpha".to_string(), "beta".to_string()])
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], embed_one("alpha"));
        assert_eq!(vectors[1], embed_one("beta"));
    }

    #[test]
    fn empty_batch_is_fine() {
        assert!(HashEmbedder.embed(&[]).unwrap().is_empty());
    }
}
