use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid chunking config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model failure: {0}")]
    Model(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("unexpected embedding response: expected {expected}, got {actual}")]
    BadResponse { expected: String, actual: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt index artifact: {0}")]
    Corrupt(String),

    #[error("unsupported index format version {found}, expected {expected}")]
    FormatVersion { found: u32, expected: u32 },

    #[error("index was built with model {index_model}, engine uses {engine_model}")]
    ModelMismatch {
        index_model: String,
        engine_model: String,
    },

    #[error("misaligned index artifact: {0}")]
    Misaligned(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("chunking failed: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("persisting index failed: {0}")]
    Store(#[from] StoreError),

    #[error("another indexing run is already in progress")]
    IndexingInProgress,

    #[error("document produced no indexable chunks: {0}")]
    EmptyIndex(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no index loaded")]
    NotIndexed,

    #[error("query is empty")]
    EmptyQuery,

    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
