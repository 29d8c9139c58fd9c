//! services/api/src/adapters/supabase.rs
//!
//! This module contains the hosted-store adapter. One client implements both the
//! `DocumentStore` port (PostgREST table access) and the `BlobStore` port
//! (Storage bucket uploads) from the `core` crate.

use async_trait::async_trait;
use bytes::Bytes;
use recipe_finder_core::ports::{BlobStore, DocumentStore, Filter, FilterOp, PortError, PortResult, SelectQuery};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::SupabaseConfig;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter for a Supabase project, authenticated with the service role key.
#[derive(Debug, Clone)]
pub struct SupabaseAdapter {
    client: reqwest::Client,
    url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseAdapter {
    /// Creates a new `SupabaseAdapter` storing blobs in `bucket`.
    pub fn new(client: reqwest::Client, config: &SupabaseConfig, bucket: String) -> Self {
        Self {
            client,
            url: config.url.clone(),
            service_role_key: config.service_role_key.clone(),
            bucket,
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// The public URL of an object in the configured bucket.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, self.bucket, path)
    }
}

//=========================================================================================
// PostgREST Query Encoding
//=========================================================================================

/// The PostgREST error body (also used by the storage API, with `error`).
#[derive(Debug, Default, Deserialize)]
struct RestError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Renders a scalar as PostgREST expects it in a filter value.
fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encodes one filter as a `(column, operator.value)` query pair.
fn filter_param(filter: &Filter) -> (String, String) {
    let condition = match (filter.op, &filter.value) {
        (FilterOp::Eq, Value::Null) => "is.null".to_string(),
        (FilterOp::Eq, value) => format!("eq.{}", filter_value(value)),
        (FilterOp::In, Value::Array(values)) => {
            let quoted: Vec<String> = values
                .iter()
                .map(|v| format!("\"{}\"", filter_value(v).replace('"', "\\\"")))
                .collect();
            format!("in.({})", quoted.join(","))
        }
        (FilterOp::In, value) => format!("in.({})", filter_value(value)),
    };
    (filter.column.clone(), condition)
}

/// Filter pairs for a write. PostgREST refuses unfiltered writes, so "all rows"
/// is expressed as `id is not null`.
fn write_filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    if filters.is_empty() {
        return vec![("id".to_string(), "not.is.null".to_string())];
    }
    filters.iter().map(filter_param).collect()
}

fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(query.filters.iter().map(filter_param));
    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect();
        params.push(("order".to_string(), order.join(",")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Turns a non-success response into a `Storage` error carrying the service's message.
async fn check(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let parsed: RestError = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed.message.or(parsed.error).unwrap_or(body);
    Err(PortError::Storage(format!("{} ({})", message, status.as_u16())))
}

async fn rows(response: Response) -> PortResult<Vec<Value>> {
    let response = check(response).await?;
    response
        .json::<Vec<Value>>()
        .await
        .map_err(|e| PortError::Storage(format!("Unreadable response from document store: {e}")))
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::Storage(e.to_string())
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for SupabaseAdapter {
    async fn select(&self, table: &str, query: &SelectQuery) -> PortResult<Vec<Value>> {
        debug!(table, filters = query.filters.len(), "Document store select");
        let response = self
            .request(Method::GET, self.table_url(table))
            .query(&select_params(query))
            .send()
            .await
            .map_err(transport)?;
        rows(response).await
    }

    async fn insert(&self, table: &str, new_rows: Vec<Value>) -> PortResult<Vec<Value>> {
        debug!(table, rows = new_rows.len(), "Document store insert");
        let response = self
            .request(Method::POST, self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&new_rows)
            .send()
            .await
            .map_err(transport)?;
        rows(response).await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> PortResult<Vec<Value>> {
        debug!(table, filters = filters.len(), "Document store update");
        let response = self
            .request(Method::PATCH, self.table_url(table))
            .query(&write_filter_params(filters))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        rows(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> PortResult<()> {
        debug!(table, filters = filters.len(), "Document store delete");
        let response = self
            .request(Method::DELETE, self.table_url(table))
            .query(&write_filter_params(filters))
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }
}

//=========================================================================================
// `BlobStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BlobStore for SupabaseAdapter {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> PortResult<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, path);
        debug!(bucket = %self.bucket, path, bytes = data.len(), "Uploading blob");
        let response = self
            .request(Method::POST, url)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(self.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_finder_core::ports::Order;
    use serde_json::json;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_filter_encoding() {
        assert_eq!(filter_param(&Filter::eq("is_ai_recipe", false)), pair("is_ai_recipe", "eq.false"));
        assert_eq!(filter_param(&Filter::eq("recipe_id", 42)), pair("recipe_id", "eq.42"));
        assert_eq!(filter_param(&Filter::eq("name", "Pad Thai")), pair("name", "eq.Pad Thai"));
        assert_eq!(filter_param(&Filter::eq("name", Value::Null)), pair("name", "is.null"));
        assert_eq!(
            filter_param(&Filter::is_in("id", vec![json!("a"), json!("b")])),
            pair("id", "in.(\"a\",\"b\")")
        );
    }

    #[test]
    fn test_select_params() {
        let query = SelectQuery::new()
            .filter(Filter::eq("checked", true))
            .order_by(Order::asc("checked"))
            .order_by(Order::desc("created_at"))
            .limit(200);
        assert_eq!(
            select_params(&query),
            vec![
                pair("select", "*"),
                pair("checked", "eq.true"),
                pair("order", "checked.asc,created_at.desc"),
                pair("limit", "200"),
            ]
        );
    }

    #[test]
    fn test_unfiltered_writes_target_all_rows_explicitly() {
        assert_eq!(write_filter_params(&[]), vec![pair("id", "not.is.null")]);
    }

    #[test]
    fn test_public_url() {
        let adapter = SupabaseAdapter::new(
            reqwest::Client::new(),
            &SupabaseConfig {
                url: "https://p.supabase.co".to_string(),
                service_role_key: "k".to_string(),
            },
            "recipe-images".to_string(),
        );
        assert_eq!(
            adapter.public_url("saved/abc.png"),
            "https://p.supabase.co/storage/v1/object/public/recipe-images/saved/abc.png"
        );
    }
}
