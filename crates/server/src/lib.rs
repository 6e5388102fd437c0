//! CreditExplain HTTP Server
//!
//! Thin HTTP façade over the self-reflective RAG orchestrator: serves
//! `/query`, `/upload`, `/documents`, `/metrics` and `/audit/{run_id}` and
//! adapts them to [`credit_explain_orchestrator::SelfReflectiveRag`].
//! Ingestion (PDF parsing, chunking, embedding-on-upload) is out of scope —
//! `/upload` only accepts and stores PDF bytes.

pub mod error;
pub mod http;
pub mod metrics;
pub mod state;

pub use error::ServerError;
pub use http::create_router;
pub use metrics::Metrics;
pub use state::AppState;
