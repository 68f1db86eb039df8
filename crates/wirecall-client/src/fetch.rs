//! `fetch`-shaped HTTP collaborator.
//!
//! The dispatcher only needs "POST this body to this URL and give me the
//! JSON back". [`ReqwestFetch`] does that over the network; tests plug in
//! their own [`Fetch`] to capture what would have been sent.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use wirecall_core::BoxFuture;

use crate::error::TransportError;

/// Request options, mirroring the fields a browser `fetch` call receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOptions {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FetchOptions {
    /// `POST` with a JSON body.
    pub fn post_json(body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: "POST".to_string(),
            headers,
            body,
        }
    }
}

pub trait Fetch: Send + Sync {
    /// Send the request and parse the response body as JSON.
    fn fetch(&self, url: String, options: FetchOptions) -> BoxFuture<'_, Result<Value, TransportError>>;
}

/// [`Fetch`] over `reqwest`. Relative URLs are resolved against `base_url`.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestFetch {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Fetch for ReqwestFetch {
    fn fetch(&self, url: String, options: FetchOptions) -> BoxFuture<'_, Result<Value, TransportError>> {
        Box::pin(async move {
            let method = reqwest::Method::from_bytes(options.method.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

            let mut request = self.client.request(method, format!("{}{}", self.base_url, url));
            for (name, value) in &options.headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request.body(options.body).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;

            // Non-2xx answers still carry an envelope; only the body decides.
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
                status: status.as_u16(),
                message: e.to_string(),
            })
        })
    }
}
