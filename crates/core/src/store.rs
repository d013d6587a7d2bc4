use crate::error::{LoadError, StoreError};
use crate::models::{ChunkMeta, DocumentFingerprint, SemanticIndex};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

pub const INDEX_FORMAT_VERSION: u32 = 1;

#[async_trait]
pub trait IndexStore {
    async fn save(&self, index: &SemanticIndex) -> Result<(), StoreError>;

    async fn load(&self) -> Result<SemanticIndex, LoadError>;
}

#[derive(Debug, Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    chunks: &'a [String],
    embeddings: &'a [Vec<f32>],
    metadata: &'a [ChunkMeta],
    model_id: &'a str,
    dimensions: usize,
    fingerprint: Option<&'a DocumentFingerprint>,
}

#[derive(Debug, Deserialize)]
struct ArtifactOwned {
    format_version: u32,
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    metadata: Option<Vec<ChunkMeta>>,
    #[serde(default)]
    model_id: Option<String>,
    #[serde(default)]
    dimensions: Option<usize>,
    #[serde(default)]
    fingerprint: Option<DocumentFingerprint>,
}

/// Persists the whole index as one JSON artifact. Saves write a sibling
/// `.tmp` file and rename it into place, so a crash mid-save never corrupts a
/// previously valid artifact and a partial file is never read as an index.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl IndexStore for JsonFileStore {
    async fn save(&self, index: &SemanticIndex) -> Result<(), StoreError> {
        let artifact = ArtifactRef {
            format_version: INDEX_FORMAT_VERSION,
            chunks: &index.chunks,
            embeddings: &index.embeddings,
            metadata: &index.metadata,
            model_id: &index.model_id,
            dimensions: index.dimensions,
            fingerprint: index.fingerprint.as_ref(),
        };

        let bytes = serde_json::to_vec(&artifact)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, &bytes).await?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    async fn load(&self) -> Result<SemanticIndex, LoadError> {
        let bytes = fs::read(&self.path).await?;
        let artifact: ArtifactOwned = serde_json::from_slice(&bytes)
            .map_err(|error| LoadError::Corrupt(error.to_string()))?;

        if artifact.format_version != INDEX_FORMAT_VERSION {
            return Err(LoadError::FormatVersion {
                found: artifact.format_version,
                expected: INDEX_FORMAT_VERSION,
            });
        }

        let chunk_count = artifact.chunks.len();

        // Legacy artifacts may lack the metadata sequence; a synthesized
        // all-unavailable sequence keeps the positional invariant intact.
        let metadata = artifact
            .metadata
            .unwrap_or_else(|| vec![ChunkMeta::unavailable(); chunk_count]);

        let dimensions = artifact
            .dimensions
            .or_else(|| artifact.embeddings.first().map(Vec::len))
            .unwrap_or(0);

        let index = SemanticIndex {
            chunks: artifact.chunks,
            embeddings: artifact.embeddings,
            metadata,
            model_id: artifact.model_id.unwrap_or_else(|| "unknown".to_string()),
            dimensions,
            fingerprint: artifact.fingerprint,
        };

        index.ensure_aligned().map_err(LoadError::Misaligned)?;

        Ok(index)
    }
}
