//! Durable audit sink: one JSONL line per run plus a per-run JSON file.

mod sink;

pub use sink::JsonlAuditSink;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("io error writing audit record: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<AuditError> for credit_explain_core::Error {
    fn from(err: AuditError) -> Self {
        credit_explain_core::Error::Audit(err.to_string())
    }
}
