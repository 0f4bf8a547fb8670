//! Backend wire contract.
//!
//! Request types skip absent optional fields when serialized. Response
//! types default every field so a partial body, or a 204, decodes to an
//! empty result instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `POST /v1/search` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<SearchOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
}

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_any: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<bool>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// `"cache"`, `"index"`, or another backend-chosen value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// `POST /v1/search` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_epoch: Option<u64>,
}

/// `POST /v1/ingest` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// `"incremental"`, `"full"`, or another backend-accepted value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Per-outcome file counters reported by ingest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_failed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_failed: Option<u64>,
}

impl IngestCounts {
    /// Sum of all failure counters; absent counters count as zero.
    ///
    /// Saturates, so huge counters never wrap around to a clean result.
    pub fn failures(&self) -> u64 {
        [self.failed, self.parse_failed, self.index_failed]
            .into_iter()
            .flatten()
            .fold(0u64, u64::saturating_add)
    }
}

/// Aggregate block some backends add to an ingest response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSummary {
    #[serde(flatten)]
    pub counts: IngestCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Result for one file processed by ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFileResult {
    pub path: String,
    /// `indexed`, `updated`, `skipped`, `failed`, `parse_failed`,
    /// `index_failed`, or another backend-chosen value.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /v1/ingest` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestResponse {
    #[serde(flatten)]
    pub counts: IngestCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_epoch: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<IngestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<IngestFileResult>>,
}

/// `POST /v1/reindex` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReindexResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_epoch: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_cleared: Option<bool>,
}

/// `GET /v1/stats` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_epoch: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_entries: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searches_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hits_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_misses_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_runs_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_failures_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_failures_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ingest_at: Option<String>,
}

/// Ingest summary embedded in an upload response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadIngest {
    #[serde(flatten)]
    pub counts: IngestCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_epoch: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// `POST /v1/upload` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub path: String,
    pub filename: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<UploadIngest>,
}

impl UploadResponse {
    /// Decode a 2xx upload body field by field.
    ///
    /// A null or mistyped field falls back to its default without hiding
    /// the others, so the ingest summary is found whatever `path`,
    /// `filename` or `size` hold. Returns `None` unless the body is a JSON
    /// object.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let object = value.as_object()?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(Self {
            path: text("path"),
            filename: text("filename"),
            size: object.get("size").and_then(Value::as_u64).unwrap_or(0),
            ingest: object
                .get("ingest")
                .and_then(Value::as_object)
                .map(UploadIngest::from_object),
        })
    }
}

impl UploadIngest {
    fn from_object(object: &Map<String, Value>) -> Self {
        let count = |key: &str| object.get(key).and_then(Value::as_u64);
        Self {
            counts: IngestCounts {
                indexed: count("indexed"),
                updated: count("updated"),
                skipped: count("skipped"),
                failed: count("failed"),
                parse_failed: count("parse_failed"),
                index_failed: count("index_failed"),
            },
            index_epoch: count("index_epoch"),
            errors: object.get("errors").and_then(Value::as_array).map(|errors| {
                errors
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_request_omits_absent_fields() {
        let body = serde_json::to_value(SearchRequest::new("todo")).unwrap();
        assert_eq!(body, json!({"q": "todo"}));

        let full = SearchRequest {
            q: "rust".into(),
            limit: Some(5),
            filters: Some(SearchFilters {
                tags_any: Some(vec!["work".into()]),
                path_prefix: None,
            }),
            options: Some(SearchOptions { fuzzy: Some(true) }),
            cache: Some(false),
        };
        assert_eq!(
            serde_json::to_value(full).unwrap(),
            json!({
                "q": "rust",
                "limit": 5,
                "filters": {"tags_any": ["work"]},
                "options": {"fuzzy": true},
                "cache": false
            })
        );
    }

    #[test]
    fn test_ingest_response_flattened_counts() {
        let response: IngestResponse = serde_json::from_value(json!({
            "indexed": 3,
            "parse_failed": 1,
            "index_epoch": 9,
            "errors": ["bad.md: unexpected token"],
            "summary": {"indexed": 3, "parse_failed": 1, "total": 4},
            "files": [{"path": "bad.md", "status": "parse_failed", "code": "PARSE_ERROR"}]
        }))
        .unwrap();

        assert_eq!(response.counts.indexed, Some(3));
        assert_eq!(response.counts.failures(), 1);
        assert_eq!(response.summary.unwrap().total, Some(4));
        assert_eq!(response.files.unwrap()[0].code.as_deref(), Some("PARSE_ERROR"));
    }

    #[test]
    fn test_partial_upload_response() {
        let response: UploadResponse =
            serde_json::from_value(json!({"ingest": {"failed": 2, "errors": ["x"]}})).unwrap();
        assert!(response.path.is_empty());
        assert_eq!(response.ingest.unwrap().counts.failures(), 2);
    }

    #[test]
    fn test_upload_body_with_null_fields_keeps_ingest() {
        let body = br#"{"path":null,"filename":"a.md","size":"3","ingest":{"failed":1,"errors":["boom"]}}"#;
        let response = UploadResponse::from_body(body).unwrap();

        assert!(response.path.is_empty());
        assert_eq!(response.filename, "a.md");
        assert_eq!(response.size, 0);
        let ingest = response.ingest.unwrap();
        assert_eq!(ingest.counts.failures(), 1);
        assert_eq!(ingest.errors, Some(vec!["boom".to_string()]));
    }

    #[test]
    fn test_upload_body_not_an_object() {
        assert!(UploadResponse::from_body(b"not json").is_none());
        assert!(UploadResponse::from_body(b"[1,2]").is_none());
        assert!(UploadResponse::from_body(br#"{"ingest":null}"#).unwrap().ingest.is_none());

        // A bad counter is ignored; the other counters still count.
        let mixed = UploadResponse::from_body(br#"{"ingest":{"indexed":"x","index_failed":2,"errors":[null,"e"]}}"#)
            .unwrap()
            .ingest
            .unwrap();
        assert_eq!(mixed.counts.indexed, None);
        assert_eq!(mixed.counts.failures(), 2);
        assert_eq!(mixed.errors, Some(vec!["e".to_string()]));
    }

    #[test]
    fn test_failures_saturate() {
        let counts = IngestCounts {
            failed: Some(u64::MAX),
            parse_failed: Some(1),
            index_failed: Some(7),
            ..IngestCounts::default()
        };
        assert_eq!(counts.failures(), u64::MAX);
    }

    #[test]
    fn test_counts_failures_ignore_successes() {
        let counts = IngestCounts {
            indexed: Some(10),
            updated: Some(2),
            skipped: Some(1),
            ..IngestCounts::default()
        };
        assert_eq!(counts.failures(), 0);
    }
}
