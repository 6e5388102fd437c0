//! Run counters and latency stats, recorded into both the process-wide
//! `metrics` recorder (installed once in `main`) and a lightweight
//! in-memory snapshot so `GET /metrics` can return a JSON stats object
//! rather than a raw Prometheus scrape body.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-wide counters, cheap to update from any `run()` call without
/// holding a lock.
#[derive(Default)]
pub struct Metrics {
    runs_success_total: AtomicU64,
    runs_error_total: AtomicU64,
    candidates_failed_total: AtomicU64,
    audit_write_failures_total: AtomicU64,
    latency_sum_millis: AtomicU64,
    latency_count: AtomicU64,
}

impl Metrics {
    pub fn record_run(&self, status: &str, latency_s: f64) {
        if status == "success" {
            self.runs_success_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.runs_error_total.fetch_add(1, Ordering::Relaxed);
        }
        metrics::counter!("runs_total", "status" => status.to_string()).increment(1);

        let millis = (latency_s * 1000.0).round().max(0.0) as u64;
        self.latency_sum_millis.fetch_add(millis, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        metrics::histogram!("run_latency_seconds").record(latency_s);
    }

    pub fn record_candidate_failure(&self) {
        self.candidates_failed_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("candidates_failed_total").increment(1);
    }

    pub fn record_audit_write_failure(&self) {
        self.audit_write_failures_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("audit_write_failures_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let count = self.latency_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_millis.load(Ordering::Relaxed);
        let mean_latency_s = if count == 0 { 0.0 } else { (sum as f64 / count as f64) / 1000.0 };

        MetricsSnapshot {
            runs_success_total: self.runs_success_total.load(Ordering::Relaxed),
            runs_error_total: self.runs_error_total.load(Ordering::Relaxed),
            candidates_failed_total: self.candidates_failed_total.load(Ordering::Relaxed),
            audit_write_failures_total: self.audit_write_failures_total.load(Ordering::Relaxed),
            run_latency_seconds_mean: mean_latency_s,
            run_count: count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub runs_success_total: u64,
    pub runs_error_total: u64,
    pub candidates_failed_total: u64,
    pub audit_write_failures_total: u64,
    pub run_latency_seconds_mean: f64,
    pub run_count: u64,
}
