//! HTTP and Qdrant adapters for the `Embedder`, `VectorIndex`, and
//! `CrossEncoder` collaborator traits.

pub mod cross_encoder;
pub mod embedder;
pub mod vector_index;

pub use cross_encoder::HttpCrossEncoder;
pub use embedder::HttpEmbedder;
pub use vector_index::QdrantVectorIndex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("reranker error: {0}")]
    Reranker(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RagError::Connection(format!("request timed out: {err}"))
        } else {
            RagError::Connection(err.to_string())
        }
    }
}

impl From<RagError> for credit_explain_core::Error {
    fn from(err: RagError) -> Self {
        credit_explain_core::Error::Retrieval(err.to_string())
    }
}
