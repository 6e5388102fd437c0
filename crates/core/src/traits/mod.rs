//! Collaborator traits for the self-reflective RAG orchestrator.
//!
//! Each trait is an explicit capability set for one pipeline collaborator:
//! `Embedder`, `VectorIndex`, `CrossEncoder`, `Critic`, `Generator`, and
//! `AuditSink`. Alternative back-ends (an API-based vs. a local model, a
//! Qdrant vs. an in-memory index) are parallel implementations of the same
//! trait, selected once at service startup — never behind a lazy global.

mod audit_sink;
mod critic;
mod cross_encoder;
mod embedder;
mod generator;
mod vector_index;

pub use audit_sink::AuditSink;
pub use critic::Critic;
pub use cross_encoder::CrossEncoder;
pub use embedder::Embedder;
pub use generator::Generator;
pub use vector_index::{MetadataFilter, VectorIndex};
