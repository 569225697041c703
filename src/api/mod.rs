//! API gateway client: single entry point for all HTTP requests.
//!
//! Attaches the session bearer token when one is set, and normalizes every
//! non-2xx response into an [`ApiError`] carrying status, parsed body, and a
//! human-readable message. No retries happen here; that is the caller's
//! concern, and a 401 is surfaced rather than acted on.

pub mod communities;
pub mod media;
pub mod moderation;
pub mod posts;
pub mod users;

use std::sync::{Arc, RwLock};

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Error, Result};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the access token attached to subsequent requests.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token slot poisoned") = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token slot poisoned").clone()
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Dispatch a request and return the parsed JSON body on 2xx. An empty
    /// 2xx body parses as `{}`. Non-2xx responses become `Error::Api`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url_for(path);
        debug!(%method, %url, "dispatching request");

        let mut req = self.http.request(method, &url);
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        Self::into_json(response).await
    }

    /// Dispatch a multipart request (uploads). Content-type, including the
    /// part boundary, is delegated to the request library.
    pub async fn request_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value> {
        let url = self.url_for(path);
        debug!(%url, "dispatching multipart request");

        let mut req = self.http.post(&url).multipart(form);
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        Self::into_json(response).await
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn into_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                Ok(Value::Object(serde_json::Map::new()))
            } else {
                Ok(serde_json::from_str(&text)?)
            }
        } else {
            Err(Error::Api(ApiError::from_body(status.as_u16(), &text)))
        }
    }
}
