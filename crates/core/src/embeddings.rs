use crate::error::EmbedError;
use reqwest::blocking::Client;
use serde::Serialize;
use url::Url;

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;
pub const DEFAULT_MODEL_ID: &str = "character-ngram-v1";

/// Maps text to fixed-dimension vectors. Output is positionally aligned with
/// the input and deterministic for a fixed model identity; the identity is
/// explicit configuration, never introspected from the model.
pub trait Embedder {
    fn id(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let batch = [text.to_string()];
        let mut vectors = self.embed(&batch)?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::Model("model returned no vector".to_string()))
    }
}

impl Embedder for Box<dyn Embedder + Send + Sync> {
    fn id(&self) -> &str {
        self.as_ref().id()
    }

    fn dimensions(&self) -> usize {
        self.as_ref().dimensions()
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.as_ref().embed(texts)
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.as_ref().embed_one(text)
    }
}

/// Local deterministic embedder: FNV-hashed character trigrams bucketed into
/// an L2-normalized vector. No model download, always available.
#[derive(Debug, Clone)]
pub struct CharacterNgramEmbedder {
    model_id: String,
    dimensions: usize,
}

impl CharacterNgramEmbedder {
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_ID, DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

/// Client for a remote sentence-embedding endpoint that accepts
/// `{"inputs": [...]}` and answers with a JSON array of vectors. Requests
/// block, so calls belong under `block_in_place` when a runtime is active.
pub struct HttpEmbedder {
    endpoint: Url,
    api_key: Option<String>,
    model_id: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: &str,
        model_id: impl Into<String>,
        dimensions: usize,
        api_key: Option<String>,
    ) -> Result<Self, EmbedError> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self {
            endpoint,
            api_key,
            model_id: model_id.into(),
            dimensions,
        })
    }
}

impl Embedder for HttpEmbedder {
    fn id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = Client::new()
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .json(&EmbedRequest { inputs: texts });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;

        if !response.status().is_success() {
            return Err(EmbedError::Model(format!(
                "embedding endpoint {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let vectors: Vec<Vec<f32>> = response.json()?;

        if vectors.len() != texts.len() {
            return Err(EmbedError::BadResponse {
                expected: format!("{} vectors", texts.len()),
                actual: format!("{} vectors", vectors.len()),
            });
        }

        if let Some(vector) = vectors.iter().find(|vector| vector.len() != self.dimensions) {
            return Err(EmbedError::BadResponse {
                expected: format!("dimension {}", self.dimensions),
                actual: format!("dimension {}", vector.len()),
            });
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::{CharacterNgramEmbedder, Embedder, HttpEmbedder};

    #[test]
    fn embedder_is_deterministic() {
        let embedder = CharacterNgramEmbedder::default();
        let first = embedder.embed_one("What is the capital of France?").unwrap();
        let second = embedder.embed_one("What is the capital of France?").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn embedder_outputs_expected_length() {
        let embedder = CharacterNgramEmbedder::new("test", 32);
        let vector = embedder.embed_one("abc").unwrap();
        assert_eq!(vector.len(), 32);
    }

    #[test]
    fn batch_output_is_positionally_aligned() {
        let embedder = CharacterNgramEmbedder::default();
        let texts = vec!["first chunk".to_string(), "second chunk".to_string()];
        let vectors = embedder.embed(&texts).unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], embedder.embed_one("first chunk").unwrap());
        assert_eq!(vectors[1], embedder.embed_one("second chunk").unwrap());
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = CharacterNgramEmbedder::new("test", 16);
        let vector = embedder.embed_one("").unwrap();
        assert!(vector.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn http_embedder_rejects_invalid_endpoint() {
        assert!(HttpEmbedder::new("not a url", "remote-model", 384, None).is_err());
    }
}
