//! `JsonlAuditSink`: appends one line to a daily JSONL file and writes a
//! per-run JSON file, both durably flushed before `write()` returns.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use credit_explain_core::{AuditRecord, AuditSink, Result};

use crate::AuditError;

/// Writes every `AuditRecord` to two places under `audit_dir`:
/// - `audit_YYYYMMDD.jsonl`, appended with one compact JSON line per run
///   (true append-only durability, the canonical on-disk stream).
/// - `audit_<run_id>.json`, a pretty-printed per-run file, so
///   `GET /audit/{run_id}` can be served by reading a single known path.
///
/// Both writes are serialized through `writer_lock` so concurrent runs
/// never interleave partial lines, and both are `sync_all()`'d before this
/// returns, so a successful `write()` guarantees the record is on disk.
pub struct JsonlAuditSink {
    audit_dir: PathBuf,
    writer_lock: Mutex<()>,
}

impl JsonlAuditSink {
    pub fn new(audit_dir: impl Into<PathBuf>) -> Self {
        Self {
            audit_dir: audit_dir.into(),
            writer_lock: Mutex::new(()),
        }
    }

    fn jsonl_path(&self, record: &AuditRecord) -> PathBuf {
        let day = record.timestamp.format("%Y%m%d");
        self.audit_dir.join(format!("audit_{day}.jsonl"))
    }

    fn per_run_path(&self, record: &AuditRecord) -> PathBuf {
        self.audit_dir.join(format!("audit_{}.json", record.run_id))
    }

    /// Read back a previously written per-run audit file.
    pub async fn read_run(&self, audit_dir: &Path, run_id: &str) -> Result<Option<AuditRecord>> {
        let path = audit_dir.join(format!("audit_{run_id}.json"));
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let record = serde_json::from_slice(&bytes)
                    .map_err(|e| AuditError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuditError::Io(e.to_string()).into()),
        }
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn write(&self, record: &AuditRecord) -> Result<String> {
        let _guard = self.writer_lock.lock().await;

        tokio::fs::create_dir_all(&self.audit_dir)
            .await
            .map_err(|e| AuditError::Io(e.to_string()))?;

        let line = serde_json::to_string(record).map_err(|e| AuditError::Serialization(e.to_string()))?;

        let mut jsonl_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.jsonl_path(record))
            .await
            .map_err(|e| AuditError::Io(e.to_string()))?;
        jsonl_file
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| AuditError::Io(e.to_string()))?;
        jsonl_file.sync_all().await.map_err(|e| AuditError::Io(e.to_string()))?;

        let pretty = serde_json::to_vec_pretty(record).map_err(|e| AuditError::Serialization(e.to_string()))?;
        let mut per_run_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.per_run_path(record))
            .await
            .map_err(|e| AuditError::Io(e.to_string()))?;
        per_run_file.write_all(&pretty).await.map_err(|e| AuditError::Io(e.to_string()))?;
        per_run_file.sync_all().await.map_err(|e| AuditError::Io(e.to_string()))?;

        Ok(record.run_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_explain_core::{Confidence, ModelVersions, RetrievalDecision, RunStatus};

    fn sample_record(run_id: &str) -> AuditRecord {
        AuditRecord {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            case_id: None,
            query: "what is KYC".to_string(),
            retrieval_decision: RetrievalDecision {
                retrieve: true,
                notes: None,
            },
            retrieval_performed: true,
            retrieved_count: 0,
            top_candidates: vec![],
            rerank_scores: vec![],
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: Confidence::Medium,
            result: serde_json::json!({}),
            follow_up_questions: vec![],
            latency_s: 0.2,
            model_versions: ModelVersions::default(),
            error: None,
            status: RunStatus::Success,
            provenance_meta: None,
        }
    }

    #[tokio::test]
    async fn writes_jsonl_and_per_run_file() {
        let dir = tempdir();
        let sink = JsonlAuditSink::new(dir.path());
        let record = sample_record("run-1");

        let audit_id = sink.write(&record).await.unwrap();
        assert_eq!(audit_id, "run-1");

        let per_run = sink.read_run(dir.path(), "run-1").await.unwrap().unwrap();
        assert_eq!(per_run.run_id, "run-1");

        let jsonl_path = sink.jsonl_path(&record);
        let contents = tokio::fs::read_to_string(jsonl_path).await.unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn appends_multiple_runs_to_the_same_daily_file() {
        let dir = tempdir();
        let sink = JsonlAuditSink::new(dir.path());

        sink.write(&sample_record("run-1")).await.unwrap();
        sink.write(&sample_record("run-2")).await.unwrap();

        let jsonl_path = sink.jsonl_path(&sample_record("run-3"));
        let contents = tokio::fs::read_to_string(jsonl_path).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    struct TempDir(PathBuf);
    impl TempDir {
        fn path(&self) -> &Path {
            &self.0
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn tempdir() -> TempDir {
        let path = std::env::temp_dir().join(format!("credit-explain-audit-test-{}", uuid_like()));
        std::fs::create_dir_all(&path).unwrap();
        TempDir(path)
    }

    fn uuid_like() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        format!("{nanos}-{:?}", std::thread::current().id())
    }
}
