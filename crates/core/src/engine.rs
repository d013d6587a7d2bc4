use crate::chunker::{chunk_pages, ChunkerConfig};
use crate::embeddings::Embedder;
use crate::error::{EmbedError, ExtractError, IndexError, LoadError, SearchError};
use crate::extractor::PdfExtractor;
use crate::models::{DocumentFingerprint, IndexStatus, SearchResult, SemanticIndex};
use crate::store::IndexStore;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Normalized dot product, defined as 0.0 (not NaN) when either vector has
/// zero norm or the lengths disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Owns the loaded index and runs the whole lifecycle: extract → chunk →
/// embed → persist → swap, and cosine-ranked top-k search against whatever
/// index is currently loaded.
///
/// The index lives behind `RwLock<Option<Arc<_>>>`: searches clone the `Arc`
/// and re-indexing replaces the reference in one write, so a concurrent
/// search observes the fully-old or fully-new index, never a mix. At most one
/// indexing run is in flight; further requests are rejected.
pub struct SearchEngine<X, E, S>
where
    X: PdfExtractor,
    E: Embedder,
    S: IndexStore,
{
    extractor: X,
    embedder: E,
    store: S,
    chunker: ChunkerConfig,
    index: RwLock<Option<Arc<SemanticIndex>>>,
    indexing: Mutex<()>,
}

impl<X, E, S> SearchEngine<X, E, S>
where
    X: PdfExtractor + Send + Sync,
    E: Embedder + Send + Sync,
    S: IndexStore + Send + Sync,
{
    pub fn new(extractor: X, embedder: E, store: S, chunker: ChunkerConfig) -> Self {
        Self {
            extractor,
            embedder,
            store,
            chunker,
            index: RwLock::new(None),
            indexing: Mutex::new(()),
        }
    }

    /// Runs the full pipeline for one document, persists the result, and
    /// swaps it in as the loaded index. Returns the chunk count. Any stage
    /// error aborts the run and leaves the previously loaded index untouched.
    pub async fn index_document(&self, path: &Path) -> Result<usize, IndexError> {
        let _gate = self
            .indexing
            .try_lock()
            .map_err(|_| IndexError::IndexingInProgress)?;

        let built = tokio::task::block_in_place(|| self.build_index(path))?;
        let chunk_count = built.chunk_count();

        self.store.save(&built).await?;
        self.swap_index(Arc::new(built));

        Ok(chunk_count)
    }

    fn build_index(&self, path: &Path) -> Result<SemanticIndex, IndexError> {
        let pages = self.extractor.extract_pages(path)?;
        let (chunks, metadata) = chunk_pages(&pages, self.chunker)?;

        if chunks.is_empty() {
            return Err(IndexError::EmptyIndex(path.display().to_string()));
        }

        let embeddings = self.embedder.embed(&chunks)?;
        if embeddings.len() != chunks.len() {
            return Err(EmbedError::BadResponse {
                expected: format!("{} vectors", chunks.len()),
                actual: format!("{} vectors", embeddings.len()),
            }
            .into());
        }

        let fingerprint = DocumentFingerprint {
            source_path: path.to_string_lossy().to_string(),
            checksum: digest_file(path).map_err(ExtractError::Io)?,
            indexed_at: Utc::now(),
        };

        Ok(SemanticIndex {
            chunks,
            embeddings,
            metadata,
            model_id: self.embedder.id().to_string(),
            dimensions: self.embedder.dimensions(),
            fingerprint: Some(fingerprint),
        })
    }

    /// Loads the persisted index and swaps it in, after checking it against
    /// the engine's embedder: an index built with another model or dimension
    /// is rejected rather than silently queried. On error the engine keeps
    /// its current state.
    pub async fn load_persisted(&self) -> Result<usize, LoadError> {
        let index = self.store.load().await?;

        if index.model_id != self.embedder.id() {
            return Err(LoadError::ModelMismatch {
                index_model: index.model_id,
                engine_model: self.embedder.id().to_string(),
            });
        }

        if index.dimensions != self.embedder.dimensions() {
            return Err(LoadError::Misaligned(format!(
                "index dimension {} does not match embedder dimension {}",
                index.dimensions,
                self.embedder.dimensions()
            )));
        }

        let chunk_count = index.chunk_count();
        self.swap_index(Arc::new(index));

        Ok(chunk_count)
    }

    pub fn status(&self) -> IndexStatus {
        match self.current_index() {
            Some(index) => IndexStatus {
                has_index: true,
                chunk_count: index.chunk_count(),
                model_id: Some(index.model_id.clone()),
                source_path: index
                    .fingerprint
                    .as_ref()
                    .map(|fingerprint| fingerprint.source_path.clone()),
            },
            None => IndexStatus {
                has_index: false,
                chunk_count: 0,
                model_id: None,
                source_path: None,
            },
        }
    }

    /// Ranks all chunks by cosine similarity to the embedded query and
    /// returns the best `top_k`, ties broken by lower chunk position. Pure:
    /// the same query against an unchanged index yields identical results.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        if top_k == 0 {
            return Err(SearchError::InvalidTopK);
        }

        let index = self.current_index().ok_or(SearchError::NotIndexed)?;
        let query_vector = tokio::task::block_in_place(|| self.embedder.embed_one(query))?;

        let mut scored: Vec<(usize, f32)> = index
            .embeddings
            .iter()
            .map(|embedding| cosine_similarity(embedding, &query_vector))
            .enumerate()
            .collect();

        scored.sort_by(|left, right| {
            right
                .1
                .total_cmp(&left.1)
                .then_with(|| left.0.cmp(&right.0))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(position, (chunk_index, score))| SearchResult {
                rank: position + 1,
                score,
                text: index.chunks[chunk_index].clone(),
                // Defensive: metadata shorter than the chunk list must not
                // panic, it degrades to an unavailable page.
                page: index
                    .metadata
                    .get(chunk_index)
                    .and_then(|meta| meta.page),
            })
            .collect())
    }

    fn current_index(&self) -> Option<Arc<SemanticIndex>> {
        let guard = match self.index.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }

    fn swap_index(&self, next: Arc<SemanticIndex>) {
        let mut guard = match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(next);
    }
}

fn digest_file(path: &Path) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
