//! # REST Catalog Client
//!
//! `RemoteCatalog` over a PostgREST-style HTTP backend.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert_batch        POST rest/v1/medicines?on_conflict=id             │
//! │                      Prefer: resolution=merge-duplicates,              │
//! │                              return=representation                     │
//! │  get_by_id           GET  rest/v1/medicines?id=eq.{id}&select=*        │
//! │  search              POST rest/v1/rpc/search_medicines                 │
//! │  get_alternatives    POST rest/v1/rpc/get_medicine_alternatives        │
//! │  check_interactions  POST rest/v1/rpc/check_drug_interactions          │
//! │  get_by_indication   POST rest/v1/rpc/get_medicines_by_indication      │
//! │                                                                         │
//! │  Every request carries `apikey: <key>` and `Authorization: Bearer`.    │
//! │  Non-2xx → RemoteError::Rejected { status, body }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use medi_core::{InteractionReport, RemoteMedicineRow};

use super::{RemoteCatalog, SearchFilters, UpsertOutcome};
use crate::error::{RemoteError, RemoteResult};

const MEDICINES_PATH: &str = "rest/v1/medicines";
const RPC_PATH: &str = "rest/v1/rpc/";

/// HTTP client for the hosted canonical catalog.
#[derive(Debug, Clone)]
pub struct RestCatalogClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl RestCatalogClient {
    /// Creates a client; `base_url` is the backend root
    /// (e.g. `https://catalog.example.org`).
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let mut base_url = Url::parse(base_url)?;

        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::InvalidRequest(format!("HTTP client: {e}")))?;

        Ok(RestCatalogClient {
            client,
            base_url,
            api_key: api_key.into(),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn rpc_endpoint(&self, function: &str) -> RemoteResult<Url> {
        self.endpoint(&format!("{RPC_PATH}{function}"))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Sends a request and decodes a 2xx JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let response = self.check_status(response).await?;
        response.json::<T>().await.map_err(|e| self.map_transport_error(e))
    }

    /// Calls a stored procedure with a JSON object of named arguments.
    async fn rpc<B: Serialize, T: DeserializeOwned>(&self, function: &str, args: &B) -> RemoteResult<T> {
        let url = self.rpc_endpoint(function)?;
        debug!(function, "Calling remote RPC");
        self.send(self.client.post(url).json(args)).await
    }

    async fn check_status(&self, response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Remote catalog rejected request");
        Err(RemoteError::Rejected {
            status: Some(status.as_u16()),
            message: if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout {
                after: self.timeout,
            }
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if err.is_builder() {
            RemoteError::InvalidRequest(err.to_string())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

/// Named arguments of `search_medicines`.
fn search_args(query: &str, limit: usize, offset: usize, filters: &SearchFilters) -> serde_json::Value {
    json!({
        "search_query": query,
        "limit_count": limit,
        "offset_count": offset,
        "filter_class": filters.therapeutic_class,
        "filter_form": filters.form,
        "filter_prescription": filters.prescription_required,
        "filter_manufacturer": filters.manufacturer,
    })
}

#[async_trait]
impl RemoteCatalog for RestCatalogClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        filters: &SearchFilters,
    ) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.rpc("search_medicines", &search_args(query, limit, offset, filters))
            .await
    }

    async fn get_by_id(&self, id: &str) -> RemoteResult<Option<RemoteMedicineRow>> {
        let url = self.endpoint(MEDICINES_PATH)?;
        let request = self
            .client
            .get(url)
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())]);

        let rows: Vec<RemoteMedicineRow> = self.send(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_alternatives(&self, generic_name: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.rpc(
            "get_medicine_alternatives",
            &json!({ "generic_name_param": generic_name }),
        )
        .await
    }

    async fn check_interactions(&self, ids: &[String]) -> RemoteResult<InteractionReport> {
        self.rpc("check_drug_interactions", &json!({ "medicine_ids": ids }))
            .await
    }

    async fn get_by_indication(&self, term: &str) -> RemoteResult<Vec<RemoteMedicineRow>> {
        self.rpc(
            "get_medicines_by_indication",
            &json!({ "indication_term": term }),
        )
        .await
    }

    async fn upsert_batch(&self, rows: &[RemoteMedicineRow]) -> RemoteResult<UpsertOutcome> {
        let url = self.endpoint(MEDICINES_PATH)?;
        let request = self
            .client
            .post(url)
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(rows);

        // The backend does not say which rows already existed.
        let written: Vec<serde_json::Value> = self.send(request).await?;
        Ok(UpsertOutcome {
            inserted: written.len(),
            updated: 0,
        })
    }
}
