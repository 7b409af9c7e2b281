//! Supabase backend implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use langengine_core::Metadata;
use langengine_http::{HttpClient, HttpConfig, HttpRequest};
use serde_json::{Map, Value, json};

use super::{DEFAULT_QUERY_NAME, SupabaseConfig};
use crate::TRACING_TARGET;
use crate::config::{FieldMapping, VectorStoreConfig};
use crate::entry::{Candidate, SearchParams, VectorEntry};
use crate::error::{VectorError, VectorResult};
use crate::metric::DistanceMetric;
use crate::store::VectorBackend;

/// Maximum number of ids placed in a single `in.(...)` filter.
const IDS_PER_REQUEST: usize = 100;

/// Column the search function reports similarity in.
const SIMILARITY_COLUMN: &str = "similarity";

/// Supabase backend implementation.
///
/// Writes go to `/rest/v1/{table}` as upserts; searches call
/// `/rest/v1/rpc/{query_name}` with `query_embedding`, `match_count` and an
/// optional `filter`, and convert the returned `similarity` column into a
/// distance with the store metric.
pub struct SupabaseBackend {
    client: HttpClient,
    table: String,
    query_name: String,
    fields: FieldMapping,
    metric: DistanceMetric,
    batch_size: usize,
}

impl SupabaseBackend {
    /// Creates a new Supabase backend.
    pub fn new(store: &VectorStoreConfig, config: &SupabaseConfig) -> VectorResult<Self> {
        config.validate()?;

        let http = HttpConfig::new(&config.url)
            .map_err(|e| VectorError::invalid_config(e.to_string()))?
            .with_bearer_token(&config.api_key)
            .with_header("apikey", &config.api_key);
        let client =
            HttpClient::new(http).map_err(|e| VectorError::invalid_config(e.to_string()))?;

        if store.metric() != DistanceMetric::Cosine && config.query_name == DEFAULT_QUERY_NAME {
            tracing::warn!(
                target: TRACING_TARGET,
                metric = %store.metric(),
                query_name = %config.query_name,
                "The stock query function returns cosine similarity; distances will be wrong \
                 unless it was replaced with one for this metric"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET,
            url = %config.url,
            table = %config.table,
            query_name = %config.query_name,
            "Supabase backend initialized"
        );

        Ok(Self {
            client,
            table: config.table.clone(),
            query_name: config.query_name.clone(),
            fields: store.fields().clone(),
            metric: store.metric(),
            batch_size: store.batch_size(),
        })
    }

    fn table_path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    fn rpc_path(&self) -> String {
        format!("rest/v1/rpc/{}", self.query_name)
    }

    fn to_row(&self, entry: &VectorEntry) -> Value {
        let mut row = Map::new();
        row.insert(self.fields.id.clone(), Value::String(entry.id.clone()));
        row.insert(self.fields.content.clone(), Value::String(entry.content.clone()));
        row.insert(self.fields.vector.clone(), json!(entry.vector));
        row.insert(self.fields.metadata.clone(), json!(entry.metadata));
        Value::Object(row)
    }

    fn parse_entry(&self, row: &Value) -> VectorResult<VectorEntry> {
        let id = row
            .get(&self.fields.id)
            .and_then(parse_id)
            .ok_or_else(|| VectorError::backend(format!("row is missing '{}'", self.fields.id)))?;

        Ok(VectorEntry {
            id,
            content: row
                .get(&self.fields.content)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            vector: row
                .get(&self.fields.vector)
                .and_then(parse_vector)
                .unwrap_or_default(),
            metadata: row
                .get(&self.fields.metadata)
                .map(parse_metadata)
                .unwrap_or_default(),
        })
    }

    fn parse_candidate(&self, row: &Value, include_vectors: bool) -> VectorResult<Candidate> {
        let similarity = row
            .get(SIMILARITY_COLUMN)
            .and_then(Value::as_f64)
            .ok_or_else(|| VectorError::backend("search result is missing 'similarity'"))?;
        let entry = self.parse_entry(row)?;

        Ok(Candidate {
            id: entry.id,
            content: entry.content,
            vector: (include_vectors && !entry.vector.is_empty()).then_some(entry.vector),
            metadata: entry.metadata,
            distance: self.metric.distance_from_similarity(similarity as f32),
        })
    }

    fn rows(&self, value: Value) -> VectorResult<Vec<Value>> {
        match value {
            Value::Array(rows) => Ok(rows),
            other => Err(VectorError::backend(format!(
                "expected an array of rows, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl VectorBackend for SupabaseBackend {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn upsert(&self, entries: Vec<VectorEntry>) -> VectorResult<()> {
        for chunk in entries.chunks(self.batch_size) {
            let rows: Vec<Value> = chunk.iter().map(|entry| self.to_row(entry)).collect();
            let request = HttpRequest::post(self.table_path())
                .with_query("on_conflict", &self.fields.id)
                .with_header("Prefer", "resolution=merge-duplicates,return=minimal")
                .with_json(&rows)?;
            self.client.send(request).await?;

            tracing::debug!(
                target: TRACING_TARGET,
                table = %self.table,
                rows = rows.len(),
                "Upserted rows"
            );
        }
        Ok(())
    }

    async fn search(&self, params: &SearchParams) -> VectorResult<Vec<Candidate>> {
        let mut body = json!({
            "query_embedding": params.vector,
            "match_count": params.limit,
        });
        if !params.filter.is_empty() {
            body["filter"] = json!(params.filter);
        }

        let value: Value = self.client.post_json(self.rpc_path(), &body).await?;
        let mut candidates = self
            .rows(value)?
            .iter()
            .map(|row| self.parse_candidate(row, params.include_vectors))
            .collect::<VectorResult<Vec<_>>>()?;

        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(params.limit);
        Ok(candidates)
    }

    async fn get(&self, ids: &[String]) -> VectorResult<Vec<VectorEntry>> {
        let mut found: HashMap<String, VectorEntry> = HashMap::new();
        for chunk in ids.chunks(IDS_PER_REQUEST) {
            let request = HttpRequest::get(self.table_path())
                .with_query("select", "*")
                .with_query(&self.fields.id, in_filter(chunk));
            let value: Value = self.client.send(request).await?.json()?;
            for row in self.rows(value)? {
                let entry = self.parse_entry(&row)?;
                found.insert(entry.id.clone(), entry);
            }
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    async fn delete(&self, ids: &[String]) -> VectorResult<()> {
        for chunk in ids.chunks(IDS_PER_REQUEST) {
            let request =
                HttpRequest::delete(self.table_path()).with_query(&self.fields.id, in_filter(chunk));
            self.client.send(request).await?;
        }
        Ok(())
    }

    async fn count(&self) -> VectorResult<usize> {
        let request = HttpRequest::get(self.table_path())
            .with_query("select", &self.fields.id)
            .with_header("Prefer", "count=exact");
        let response = self.client.send(request).await?;

        // Content-Range: 0-24/25 or */0
        let total = response
            .header("content-range")
            .and_then(|range| range.rsplit('/').next())
            .and_then(|total| total.parse::<usize>().ok());

        match total {
            Some(total) => Ok(total),
            None => Ok(self.rows(response.json()?)?.len()),
        }
    }
}

/// Builds a PostgREST `in` filter with every id double-quoted.
fn in_filter(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

fn parse_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// pgvector columns arrive either as JSON arrays or as their text form
/// `"[1,2,3]"`, which is itself valid JSON.
fn parse_vector(value: &Value) -> Option<Vec<f32>> {
    match value {
        Value::Array(_) => serde_json::from_value(value.clone()).ok(),
        Value::String(s) => serde_json::from_str(s).ok(),
        _ => None,
    }
}

fn parse_metadata(value: &Value) -> Metadata {
    match value {
        Value::Object(map) => map.clone().into_iter().collect(),
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|e| {
            tracing::warn!(target: TRACING_TARGET, error = %e, "Ignoring unparsable metadata");
            Metadata::new()
        }),
        _ => Metadata::new(),
    }
}
