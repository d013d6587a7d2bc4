use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of the document an index was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub source_path: String,
    pub checksum: String,
    pub indexed_at: DateTime<Utc>,
}

/// Per-chunk metadata, positionally aligned with the chunk texts.
///
/// `page: None` is the explicit "page unavailable" state used when a legacy
/// artifact carried no metadata sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMeta {
    pub page: Option<u32>,
}

impl ChunkMeta {
    pub fn for_page(page: u32) -> Self {
        Self { page: Some(page) }
    }

    pub fn unavailable() -> Self {
        Self { page: None }
    }
}

/// The persisted unit: chunk texts, their embeddings, and per-chunk metadata,
/// all positionally aligned, plus the identity of the model that produced the
/// embeddings. Built wholesale by one indexing run and never mutated in
/// place; re-indexing replaces the whole value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticIndex {
    pub chunks: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub metadata: Vec<ChunkMeta>,
    pub model_id: String,
    pub dimensions: usize,
    pub fingerprint: Option<DocumentFingerprint>,
}

impl SemanticIndex {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Checks the positional invariant: one embedding and one metadata record
    /// per chunk, every embedding row at the declared dimension.
    pub fn ensure_aligned(&self) -> Result<(), String> {
        if self.embeddings.len() != self.chunks.len() {
            return Err(format!(
                "{} embeddings for {} chunks",
                self.embeddings.len(),
                self.chunks.len()
            ));
        }

        if self.metadata.len() != self.chunks.len() {
            return Err(format!(
                "{} metadata records for {} chunks",
                self.metadata.len(),
                self.chunks.len()
            ));
        }

        if let Some(row) = self
            .embeddings
            .iter()
            .find(|row| row.len() != self.dimensions)
        {
            return Err(format!(
                "embedding row has dimension {}, index declares {}",
                row.len(),
                self.dimensions
            ));
        }

        Ok(())
    }
}

/// One ranked hit returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub rank: usize,
    pub score: f32,
    pub text: String,
    pub page: Option<u32>,
}

/// Snapshot of the engine's loaded-index state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub has_index: bool,
    pub chunk_count: usize,
    pub model_id: Option<String>,
    pub source_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SemanticIndex {
        SemanticIndex {
            chunks: vec!["first".to_string(), "second".to_string()],
            embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            metadata: vec![ChunkMeta::for_page(1), ChunkMeta::for_page(2)],
            model_id: "test-model".to_string(),
            dimensions: 2,
            fingerprint: None,
        }
    }

    #[test]
    fn aligned_index_passes_check() {
        assert!(sample_index().ensure_aligned().is_ok());
    }

    #[test]
    fn missing_metadata_record_fails_check() {
        let mut index = sample_index();
        index.metadata.pop();
        assert!(index.ensure_aligned().is_err());
    }

    #[test]
    fn wrong_embedding_dimension_fails_check() {
        let mut index = sample_index();
        index.embeddings[1] = vec![0.0, 1.0, 0.5];
        assert!(index.ensure_aligned().is_err());
    }
}
