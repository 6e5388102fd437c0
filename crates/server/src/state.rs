//! Shared application state, constructed once in `main` and cloned
//! (cheaply, via `Arc`) into every request handler.

use std::sync::Arc;

use credit_explain_audit::JsonlAuditSink;
use credit_explain_config::Settings;
use credit_explain_orchestrator::SelfReflectiveRag;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<SelfReflectiveRag>,
    pub audit_sink: Arc<JsonlAuditSink>,
    pub settings: Arc<Settings>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        rag: Arc<SelfReflectiveRag>,
        audit_sink: Arc<JsonlAuditSink>,
        settings: Arc<Settings>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            rag,
            audit_sink,
            settings,
            metrics,
        }
    }
}
