//! HTTP client wrapper for interacting with Qdrant.

use crate::config::Config;
use crate::qdrant::{
    payload::{current_timestamp_rfc3339, point_id_for_key, stamp_payload},
    types::{PointInsert, QdrantError, QueryResponse, QueryResponseResult, ScoredPoint},
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Payload fields indexed as keywords so filtered searches stay cheap.
const KEYWORD_FIELDS: [&str; 3] = ["kind", "category", "candidate_id"];

/// Lightweight HTTP client for Qdrant operations.
pub struct QdrantService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl QdrantService {
    /// Construct a client for the given base URL.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, QdrantError> {
        let client = Client::builder().user_agent("ai-relay/0.1").build()?;

        let base_url = normalize_base_url(url).map_err(QdrantError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = %api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Construct a client using `QDRANT_URL` / `QDRANT_API_KEY`.
    pub fn from_config(config: &Config) -> Result<Self, QdrantError> {
        Self::new(&config.qdrant_url, config.qdrant_api_key.clone())
    }

    /// Create a collection only when it is missing from Qdrant.
    pub async fn create_collection_if_not_exists(
        &self,
        collection_name: &str,
        vector_size: u64,
    ) -> Result<(), QdrantError> {
        if self.collection_exists(collection_name).await? {
            return Ok(());
        }

        tracing::debug!(
            collection = collection_name,
            vector_size,
            "Creating collection"
        );
        self.create_collection(collection_name, vector_size).await
    }

    /// Create or update a collection with the specified vector size.
    pub async fn create_collection(
        &self,
        collection_name: &str,
        vector_size: u64,
    ) -> Result<(), QdrantError> {
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{collection_name}"))
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = collection_name, "Collection ensured/created");
        })
        .await
    }

    /// Ensure keyword payload indexes exist for the filterable fields.
    pub async fn ensure_payload_indexes(&self, collection_name: &str) -> Result<(), QdrantError> {
        for field in KEYWORD_FIELDS {
            let body = json!({
                "field_name": field,
                "field_schema": "keyword",
            });

            let response = self
                .request(Method::PUT, &format!("collections/{collection_name}/index"))
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() {
                tracing::debug!(collection = collection_name, field, "Payload index ensured");
            } else if response.status() == StatusCode::CONFLICT {
                tracing::debug!(
                    collection = collection_name,
                    field,
                    "Payload index already exists"
                );
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = QdrantError::UnexpectedStatus { status, body };
                tracing::warn!(collection = collection_name, field, error = %error, "Failed to ensure payload index");
            }
        }

        Ok(())
    }

    /// Upsert points, deriving each point id from its logical key.
    pub async fn upsert_points(
        &self,
        collection_name: &str,
        points: Vec<PointInsert>,
    ) -> Result<usize, QdrantError> {
        if points.is_empty() {
            return Ok(0);
        }

        let now = current_timestamp_rfc3339();
        let serialized: Vec<_> = points
            .into_iter()
            .map(|point| {
                json!({
                    "id": point_id_for_key(&point.key),
                    "vector": point.vector,
                    "payload": stamp_payload(point.payload, &now),
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(
                Method::PUT,
                &format!("collections/{collection_name}/points"),
            )
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = collection_name,
                points = point_count,
                "Points upserted"
            );
        })
        .await?;

        Ok(point_count)
    }

    /// Perform a similarity search against a collection, returning scored payloads.
    pub async fn search_points(
        &self,
        collection_name: &str,
        vector: Vec<f32>,
        filter: Option<Value>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>, QdrantError> {
        let mut body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });

        if let Value::Object(obj) = &mut body {
            if let Some(threshold) = score_threshold {
                obj.insert("score_threshold".into(), Value::from(threshold));
            }
            if let Some(filter_value) = filter {
                obj.insert("filter".into(), filter_value);
            }
        }

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection_name}/points/query"),
            )
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = QdrantError::UnexpectedStatus { status, body };
            tracing::error!(collection = collection_name, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };
        Ok(points
            .into_iter()
            .map(|point| ScoredPoint {
                id: stringify_point_id(point.id),
                score: point.score,
                payload: point.payload,
            })
            .collect())
    }

    async fn collection_exists(&self, collection_name: &str) -> Result<bool, QdrantError> {
        let response = self
            .request(Method::GET, &format!("collections/{collection_name}"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = QdrantError::UnexpectedStatus { status, body };
                tracing::error!(collection = collection_name, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            req = req.header("api-key", api_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), QdrantError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = QdrantError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

pub(crate) fn stringify_point_id(id: Value) -> String {
    match id {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Object(map) => map
            .get("uuid")
            .map(|value| match value {
                Value::String(uuid) => uuid.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| Value::Object(map).to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qdrant::{SearchFilterArgs, build_search_filter};
    use httpmock::{Method::POST, Method::PUT, MockServer};
    use serde_json::Map;

    fn service(server: &MockServer) -> QdrantService {
        QdrantService::new(&server.base_url(), None).expect("client")
    }

    #[tokio::test]
    async fn search_points_emits_expected_request() {
        let server = MockServer::start_async().await;

        let filter = build_search_filter(&SearchFilterArgs {
            kind: Some("category".into()),
            category: Some("skills".into()),
            ..Default::default()
        })
        .expect("filter value");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/collections/resumes/points/query")
                    .json_body(json!({
                        "query": [0.5, 0.25],
                        "limit": 3,
                        "with_payload": true,
                        "filter": {
                            "must": [
                                { "key": "kind", "match": { "value": "category" } },
                                { "key": "category", "match": { "value": "skills" } }
                            ]
                        }
                    }));
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": {
                        "points": [
                            {
                                "id": "7d0b5c1e-0000-0000-0000-000000000000",
                                "score": 0.42,
                                "payload": { "candidate_id": "17", "text": "Example" }
                            }
                        ]
                    }
                }));
            })
            .await;

        let results = service(&server)
            .search_points("resumes", vec![0.5, 0.25], Some(filter), 3, None)
            .await
            .expect("search request");

        mock.assert_async().await;
        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert_eq!(hit.id, "7d0b5c1e-0000-0000-0000-000000000000");
        assert!((hit.score - 0.42).abs() < f32::EPSILON);
        let payload = hit.payload.as_ref().expect("payload");
        assert_eq!(payload["candidate_id"], Value::String("17".into()));
    }

    #[tokio::test]
    async fn upsert_points_derives_ids_from_keys() {
        let server = MockServer::start_async().await;
        let expected_id = point_id_for_key("17/skills");
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/resumes/points")
                    .query_param("wait", "true")
                    .body_contains(expected_id.as_str())
                    .body_contains("\"ingested_at\"");
                then.status(200).json_body(json!({ "status": "ok", "result": {} }));
            })
            .await;

        let mut payload = Map::new();
        payload.insert("text".into(), Value::String("Java, Kotlin".into()));
        let written = service(&server)
            .upsert_points(
                "resumes",
                vec![PointInsert {
                    key: "17/skills".into(),
                    vector: vec![0.5, 0.5],
                    payload,
                }],
            )
            .await
            .expect("upsert");

        mock.assert_async().await;
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn upsert_failure_surfaces_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/resumes/points");
                then.status(400).body("wrong vector size");
            })
            .await;

        let error = service(&server)
            .upsert_points(
                "resumes",
                vec![PointInsert {
                    key: "1/roles".into(),
                    vector: vec![1.0],
                    payload: Map::new(),
                }],
            )
            .await
            .expect_err("bad request");

        assert!(matches!(
            error,
            QdrantError::UnexpectedStatus { status, .. } if status == StatusCode::BAD_REQUEST
        ));
    }

    #[test]
    fn numeric_and_uuid_object_ids_are_stringified() {
        assert_eq!(stringify_point_id(json!(42)), "42");
        assert_eq!(stringify_point_id(json!({ "uuid": "abc" })), "abc");
        assert_eq!(stringify_point_id(Value::Null), "");
    }
}
