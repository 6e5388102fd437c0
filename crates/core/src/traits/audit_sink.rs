//! AuditSink trait: durably persists one audit record per run.

use async_trait::async_trait;

use crate::audit::AuditRecord;
use crate::error::Result;

/// Durably persists one `AuditRecord` per run and returns an opaque
/// `audit_id` the caller can later use to retrieve it.
///
/// A write failure must be logged by the implementation and surfaced to
/// the Orchestrator as `Err`, but the Orchestrator itself never lets an
/// audit failure fail the HTTP response — it degrades to an empty
/// `audit_id` instead
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn write(&self, record: &AuditRecord) -> Result<String>;
}
