//! Core domain types and collaborator traits for the self-reflective RAG
//! orchestrator.
//!
//! This crate provides the foundational vocabulary shared across every
//! other crate: the query/passage/answer domain types, critic scoring and
//! candidate selection, the audit record, and the `async_trait` interfaces
//! each collaborator (embedder, vector index, cross encoder, critic,
//! generator, audit sink) implements.

pub mod answer;
pub mod audit;
pub mod candidate;
pub mod critic_scores;
pub mod error;
pub mod passage;
pub mod query;
pub mod response;
pub mod traits;

pub use answer::{Answer, Citation, Confidence};
pub use audit::{AuditCandidate, AuditRecord, ModelVersions, RunError, RunStatus};
pub use candidate::Candidate;
pub use critic_scores::{CriticScores, RetrievalDecision, SelectionWeights};
pub use error::{Error, Result};
pub use passage::{Passage, RankedPassage};
pub use query::Query;
pub use response::Response;
pub use traits::{AuditSink, Critic, CrossEncoder, Embedder, Generator, MetadataFilter, VectorIndex};
