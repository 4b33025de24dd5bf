//! Description of a single upstream API call.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::errors::{GatewayError, Result};

/// Method, path, query and body of one upstream call.
///
/// Path segments added with [`ApiRequest::segment`] are percent-encoded as a
/// single segment, so caller-supplied keys and ids cannot change the route.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retry_enabled: bool,
}

impl ApiRequest {
    /// Create a request for a static route such as `/api/v3/secrets/raw`
    pub fn new(method: Method, path: &str) -> Self {
        let segments =
            path.split('/').filter(|s| !s.is_empty()).map(|s| s.to_string()).collect();
        Self { method, segments, query: Vec::new(), body: None, retry_enabled: true }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one dynamic path segment
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            GatewayError::serialization(e, format!("Failed to encode body for {}", self.path()))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Disable retries for this request
    pub fn without_retry(mut self) -> Self {
        self.retry_enabled = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Route path for logging, e.g. `/api/v3/secrets/raw/API_KEY`
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn retry_enabled(&self) -> bool {
        self.retry_enabled
    }

    /// Resolve against the base URL, keeping any path prefix it carries
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::configuration(format!("Base URL '{}' cannot be a base", base))
            })?
            .pop_if_empty()
            .extend(self.segments.iter());

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}
