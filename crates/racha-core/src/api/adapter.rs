//! Request adapter: turns a verb, a relative path and an optional body into a
//! request against the configured backend, with auth and content headers.
//!
//! The adapter keeps no session state of its own. Every call re-reads the
//! token from durable storage and rebuilds its headers, so a sign-out (which
//! clears storage first) is honored by the very next request.
//!
//! Non-2xx responses are returned as-is; deciding what is an error belongs to
//! the caller. There is no retry, timeout or caching at this layer.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Request, Response, Url};
use serde::Serialize;
use tracing::{debug, warn};

use super::ApiError;
use crate::config::Config;
use crate::storage::SharedStore;

/// Request payload.
pub enum Body {
    /// Serialized to a JSON string with `Content-Type: application/json`
    Json(serde_json::Value),
    /// Sent as-is; the transport writes the multipart content type and boundary
    Multipart(Form),
}

impl Body {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| ApiError::Decode(format!("Failed to serialize request body: {}", e)))
    }

    /// An empty JSON object, for POSTs that carry no data
    pub fn empty() -> Self {
        Body::Json(serde_json::Value::Object(Default::default()))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Body::Multipart(_))
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Form> for Body {
    fn from(form: Form) -> Self {
        Body::Multipart(form)
    }
}

/// Per-call passthrough settings.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers, applied after (and overriding) the adapter's own
    pub headers: HeaderMap,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Skip the bearer header even when a token is stored
    pub anonymous: bool,
}

impl RequestOptions {
    pub fn anonymous() -> Self {
        Self {
            anonymous: true,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// HTTP adapter for the racha backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpAdapter {
    client: Client,
    origin: String,
    storage: SharedStore,
    token_key: String,
}

impl HttpAdapter {
    /// Create an adapter with its own client. Cookies are kept and sent
    /// alongside the bearer token.
    pub fn new(config: &Config, storage: SharedStore) -> Result<Self, ApiError> {
        let client = Client::builder().cookie_store(true).build()?;
        Self::with_client(client, config, storage)
    }

    /// Create an adapter sharing an existing client's connection pool
    pub fn with_client(client: Client, config: &Config, storage: SharedStore) -> Result<Self, ApiError> {
        let origin = config.backend_url.trim().trim_end_matches('/').to_string();
        Url::parse(&origin).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", origin, e)))?;

        Ok(Self {
            client,
            origin,
            storage,
            token_key: config.token_key.clone(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Join a relative path onto the origin. One leading slash is dropped, so
    /// `/api/user` and `api/user` resolve identically.
    pub fn resolve_url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.origin, path)
    }

    /// Current token from storage. A failed read degrades to no token.
    async fn stored_token(&self) -> Option<String> {
        match self.storage.get(&self.token_key).await {
            Ok(Some(token)) if !token.trim().is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read access token, sending request unauthenticated");
                None
            }
        }
    }

    async fn headers(&self, multipart: bool, anonymous: bool) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        if !multipart {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if !anonymous {
            if let Some(token) = self.stored_token().await {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }

    /// Build a fully formed request without sending it
    pub async fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Request, ApiError> {
        let url = Url::parse(&self.resolve_url(path))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))?;
        let multipart = body.as_ref().map(Body::is_multipart).unwrap_or(false);
        let headers = self.headers(multipart, options.anonymous).await?;

        let mut builder = self.client.request(method, url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        builder = match body {
            Some(Body::Json(value)) => builder.body(value.to_string()),
            Some(Body::Multipart(form)) => builder.multipart(form),
            None => builder,
        };
        if !options.headers.is_empty() {
            builder = builder.headers(options.headers);
        }

        Ok(builder.build()?)
    }

    /// Send a built request. Any HTTP status is a successful send.
    pub async fn send(&self, request: Request) -> Result<Response, ApiError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let response = self.client.execute(request).await?;
        debug!(%method, url = %url, status = %response.status(), "Request completed");
        Ok(response)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let request = self.build(method, path, body, options).await?;
        self.send(request).await
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Response, ApiError> {
        self.request(Method::GET, path, None, options).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.request(Method::POST, path, Some(body.into()), options)
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.request(Method::PUT, path, body, options).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.request(Method::PATCH, path, Some(body.into()), options)
            .await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<Response, ApiError> {
        self.request(Method::DELETE, path, None, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn adapter(backend_url: &str) -> HttpAdapter {
        let config = Config {
            backend_url: backend_url.to_string(),
            ..Config::default()
        };
        HttpAdapter::with_client(Client::new(), &config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_resolve_url_strips_one_leading_slash() {
        let api = adapter("http://localhost:8080");
        assert_eq!(api.resolve_url("/api/groups"), "http://localhost:8080/api/groups");
        assert_eq!(api.resolve_url("api/groups"), "http://localhost:8080/api/groups");
        assert_eq!(api.resolve_url("//x"), "http://localhost:8080//x");
        assert_eq!(api.resolve_url("api/a/b"), "http://localhost:8080/api/a/b");
    }

    #[test]
    fn test_origin_trailing_slash_trimmed() {
        let api = adapter("http://localhost:8080/");
        assert_eq!(api.origin(), "http://localhost:8080");
        assert_eq!(api.resolve_url("/check"), "http://localhost:8080/check");
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let config = Config {
            backend_url: "not a url".to_string(),
            ..Config::default()
        };
        let result = HttpAdapter::with_client(Client::new(), &config, Arc::new(MemoryStore::new()));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_body_kinds() {
        assert!(!Body::empty().is_multipart());
        assert!(Body::from(Form::new()).is_multipart());
        match Body::json(&serde_json::json!({ "paid": true })).unwrap() {
            Body::Json(value) => assert_eq!(value["paid"], true),
            Body::Multipart(_) => panic!("expected JSON body"),
        }
    }
}
