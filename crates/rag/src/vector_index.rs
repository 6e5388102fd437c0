//! `VectorIndex` adapter backed by Qdrant.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, Condition, CreateCollectionBuilder, Distance, FieldCondition, Filter, Match,
    ScoredPoint, SearchPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;

use credit_explain_core::{MetadataFilter, Passage, Result, VectorIndex};

use crate::RagError;

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub endpoint: String,
    pub collection: String,
    pub vector_dim: usize,
    pub api_key: Option<String>,
}

/// A `VectorIndex` backed by a Qdrant collection.
///
/// `search` translates the caller's `MetadataFilter` into a Qdrant keyword
/// `must` condition; any filter field type other than a string is rejected
/// outright rather than silently dropped, per the trait's documented
/// contract.
pub struct QdrantVectorIndex {
    client: Qdrant,
    config: QdrantConfig,
}

impl QdrantVectorIndex {
    pub async fn new(config: QdrantConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.endpoint);
        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create the backing collection if it does not already exist.
    pub async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection)
                        .vectors_config(VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine)),
                )
                .await
                .map_err(|e| RagError::VectorStore(e.to_string()))?;
        }

        Ok(())
    }

    fn build_filter(filter: &MetadataFilter) -> Result<Filter> {
        let keyword = match &filter.value {
            Value::String(s) => s.clone(),
            other => {
                return Err(RagError::VectorStore(format!(
                    "unsupported metadata filter value for field '{}': {other:?} (only string equality is supported)",
                    filter.field
                ))
                .into())
            }
        };

        Ok(Filter {
            must: vec![Condition {
                condition_one_of: Some(qdrant_client::qdrant::condition::ConditionOneOf::Field(FieldCondition {
                    key: filter.field.clone(),
                    r#match: Some(Match {
                        match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(keyword)),
                    }),
                    ..Default::default()
                })),
            }],
            ..Default::default()
        })
    }

    /// Convert one Qdrant search hit into a `Passage`, pulling the `text`
    /// payload field out as the passage body and everything else into
    /// `metadata`. Payload fields with an unrecognized value kind (e.g. a
    /// list or nested struct) are dropped rather than rejected.
    fn point_to_passage(point: ScoredPoint) -> Passage {
        let mut metadata = HashMap::new();
        let mut text = String::new();

        for (k, v) in point.payload {
            match v.kind {
                Some(Kind::StringValue(s)) if k == "text" => text = s,
                Some(Kind::StringValue(s)) => {
                    metadata.insert(k, Value::String(s));
                }
                Some(Kind::IntegerValue(i)) => {
                    metadata.insert(k, Value::from(i));
                }
                Some(Kind::DoubleValue(d)) => {
                    metadata.insert(k, serde_json::json!(d));
                }
                Some(Kind::BoolValue(b)) => {
                    metadata.insert(k, Value::Bool(b));
                }
                _ => {}
            }
        }

        let id = point
            .id
            .map(|pid| match pid.point_id_options {
                Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
                Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
                None => String::new(),
            })
            .unwrap_or_default();

        Passage {
            id,
            text,
            metadata,
            // Qdrant reports cosine *similarity* (higher = closer);
            // `Passage::distance` is contractually smaller-is-closer,
            // so invert it to a true cosine distance here rather than
            // push the inversion onto every caller.
            distance: 1.0 - point.score,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn search(&self, vector: &[f32], k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<Passage>> {
        let mut builder = SearchPointsBuilder::new(&self.config.collection, vector.to_vec(), k as u64).with_payload(true);

        if let Some(f) = filter {
            builder = builder.filter(Self::build_filter(f)?);
        }

        let results = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(results.result.into_iter().map(Self::point_to_passage).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{point_id::PointIdOptions, PointId, Value as QdrantValue};

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    #[test]
    fn build_filter_accepts_a_string_value() {
        let filter = MetadataFilter {
            field: "doc_type".to_string(),
            value: Value::String("policy".to_string()),
        };
        let built = QdrantVectorIndex::build_filter(&filter).expect("string filter is supported");
        assert_eq!(built.must.len(), 1);
    }

    #[test]
    fn build_filter_rejects_a_non_string_value() {
        let filter = MetadataFilter {
            field: "version".to_string(),
            value: Value::from(3),
        };
        assert!(QdrantVectorIndex::build_filter(&filter).is_err());
    }

    #[test]
    fn point_to_passage_pulls_text_out_of_payload_and_inverts_the_score() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), string_value("eligibility rules"));
        payload.insert("doc_type".to_string(), string_value("policy"));

        let point = ScoredPoint {
            id: Some(PointId {
                point_id_options: Some(PointIdOptions::Uuid("abc-123".to_string())),
            }),
            payload,
            score: 0.9,
            ..Default::default()
        };

        let passage = QdrantVectorIndex::point_to_passage(point);
        assert_eq!(passage.id, "abc-123");
        assert_eq!(passage.text, "eligibility rules");
        assert_eq!(passage.metadata.get("doc_type"), Some(&Value::String("policy".to_string())));
        // score 0.9 (very similar) must become a small distance.
        assert!((passage.distance - 0.1).abs() < 1e-6);
    }

    #[test]
    fn point_to_passage_falls_back_to_numeric_id_and_empty_text() {
        let point = ScoredPoint {
            id: Some(PointId {
                point_id_options: Some(PointIdOptions::Num(42)),
            }),
            payload: HashMap::new(),
            score: 0.2,
            ..Default::default()
        };

        let passage = QdrantVectorIndex::point_to_passage(point);
        assert_eq!(passage.id, "42");
        assert_eq!(passage.text, "");
        assert!((passage.distance - 0.8).abs() < 1e-6);
    }

    #[test]
    fn point_to_passage_defaults_id_when_missing() {
        let point = ScoredPoint {
            id: None,
            payload: HashMap::new(),
            score: 0.0,
            ..Default::default()
        };

        let passage = QdrantVectorIndex::point_to_passage(point);
        assert_eq!(passage.id, "");
    }
}
