//! The self-reflective RAG orchestrator.
//!
//! Drives retrieval, per-candidate generation and critique, selection, and
//! follow-up generation behind a single `SelfReflectiveRag::run` entry
//! point. Collaborators (embedder, vector index, cross encoder, critic,
//! generator, audit sink) are injected as `Arc<dyn Trait>` from
//! `credit-explain-core`, so this crate has no knowledge of Groq, Qdrant,
//! or any other concrete backend.

pub mod config;
pub mod error;
pub mod followups;
pub mod orchestrator;

pub use config::{Deadlines, OrchestratorConfig};
pub use error::OrchestratorError;
pub use followups::default_followups;
pub use orchestrator::SelfReflectiveRag;
