//! Orchestrator-local error type.
//!
//! The public `run()` entry point never returns this — every branch is
//! matched explicitly and mapped to a terminal state and a `Response`
//!. It exists for the handful of internal helpers that still
//! benefit from `?`, and to give the S_PIPE catch-all something concrete
//! to log.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector index search failed: {0}")]
    Retrieval(String),

    #[error("audit sink failed: {0}")]
    Audit(String),
}

impl From<OrchestratorError> for credit_explain_core::Error {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Embedding(m) | OrchestratorError::Retrieval(m) => {
                credit_explain_core::Error::Retrieval(m)
            }
            OrchestratorError::Audit(m) => credit_explain_core::Error::Audit(m),
        }
    }
}
