//! Crate-wide error type for `credit-explain-core`.

use thiserror::Error;

/// Top-level error shared by core domain logic.
///
/// Collaborator crates (`credit-explain-rag`, `credit-explain-llm`, ...)
/// define their own error enums and convert into this one at the boundary,
/// mirroring how each adapter crate in this workspace owns its error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("critic error: {0}")]
    Critic(String),

    #[error("audit error: {0}")]
    Audit(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
