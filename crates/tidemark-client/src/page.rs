//! One-page fetches against the SPARQL endpoint.
//!
//! A page fetch is a single GET round trip: the query text (and the opaque
//! continuation cursor, when resuming) travel as query parameters, and the
//! reply is a JSON body carrying `results.bindings` plus an optional
//! `cursor` for the next page. The fetcher hands bindings back untouched;
//! normalization happens downstream.

use std::time::Duration;

use crate::error::ClientError;

/// One page of raw results from the endpoint.
#[derive(Debug, Clone)]
pub struct Page {
    /// Raw binding objects, in server order.
    pub bindings: Vec<serde_json::Value>,
    /// Continuation cursor for the next page. Absent on the final page.
    pub cursor: Option<String>,
}

/// Handle to one SPARQL endpoint.
///
/// Owns a `reqwest` client constructed once with an explicit request
/// timeout, so a hung endpoint fails the page instead of stalling the
/// query forever. Cheap to share by reference across concurrent queries;
/// all per-query state lives with the caller.
pub struct SparqlEndpoint {
    client: reqwest::Client,
    endpoint_url: String,
}

impl SparqlEndpoint {
    /// Create an endpoint handle.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        endpoint_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("HTTP client construction failed: {e}")))?;
        Ok(Self {
            client,
            endpoint_url: endpoint_url.into(),
        })
    }

    /// The endpoint URL this handle talks to.
    pub fn url(&self) -> &str {
        &self.endpoint_url
    }

    /// Fetch one page of results.
    ///
    /// Issues `GET {endpoint}?query=...` with an additional `cursor`
    /// parameter when resuming; the client percent-encodes both. No
    /// retries: any failure surfaces immediately and the caller discards
    /// partial accumulation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the request fails, the status
    /// is non-success, or the body is not JSON; [`ClientError::Protocol`]
    /// if the JSON lacks the `results.bindings` array.
    pub async fn fetch_page(
        &self,
        query: &str,
        cursor: Option<&str>,
    ) -> Result<Page, ClientError> {
        let mut request = self
            .client
            .get(&self.endpoint_url)
            .query(&[("query", query)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("endpoint request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ClientError::Transport(format!(
                "endpoint returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("response body decode failed: {e}")))?;

        let bindings = extract_bindings(&json)?;
        let cursor = extract_cursor(&json);
        Ok(Page { bindings, cursor })
    }
}

/// Extract the binding array from a reply body.
fn extract_bindings(json: &serde_json::Value) -> Result<Vec<serde_json::Value>, ClientError> {
    json.get("results")
        .and_then(|r| r.get("bindings"))
        .and_then(serde_json::Value::as_array)
        .cloned()
        .ok_or_else(|| ClientError::Protocol("reply missing results.bindings array".to_owned()))
}

/// Extract the continuation cursor from a reply body.
///
/// An absent member, a JSON `null`, and a non-string value all mean the
/// same thing: this was the final page.
fn extract_cursor(json: &serde_json::Value) -> Option<String> {
    json.get("cursor")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
