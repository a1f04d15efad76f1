//! Promise-style transport
//!
//! One call, one eventual response. The response body is a byte stream so the
//! interceptor can hand the caller an untouched copy while recording its own.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;

use crate::error::{EchoError, Result};

/// Streamed response body.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// An outgoing call through the promise-style transport.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub url: String,
    /// Defaults to GET when absent.
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub payload: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn post(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Some("POST".to_string()),
            payload: Some(payload.into()),
            ..Default::default()
        }
    }

    pub fn method_or_default(&self) -> &str {
        self.method.as_deref().unwrap_or("GET")
    }
}

/// The eventual result of a promise-style call.
pub struct FetchResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: BodyStream,
}

impl FetchResponse {
    /// Build a response around an already-known body.
    pub fn from_text(status: u16, body: impl Into<String>, content_type: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.into());
        let bytes = Bytes::from(body.into());
        Self {
            status,
            headers,
            body: futures::stream::once(async move { Ok(bytes) }).boxed(),
        }
    }

    /// Case-insensitive content-type header lookup.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// Consume the body stream into a string.
    pub async fn text(self) -> Result<String> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The promise-style transport seam. The interceptor holds the real transport
/// behind this trait and implements it itself, so it can stand wherever the
/// real transport stood.
#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn dispatch(&self, request: FetchRequest) -> Result<FetchResponse>;
}

/// Real transport backed by reqwest.
pub struct HttpFetchTransport {
    client: reqwest::Client,
}

impl HttpFetchTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| EchoError::Transport(anyhow::Error::new(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchTransport for HttpFetchTransport {
    async fn dispatch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let method = reqwest::Method::from_bytes(request.method_or_default().as_bytes())
            .map_err(|e| EchoError::Transport(anyhow::Error::new(e)))?;
        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            if let Ok(name) = reqwest::header::HeaderName::try_from(key.as_str()) {
                if let Ok(header_value) = reqwest::header::HeaderValue::from_str(value) {
                    builder = builder.header(name, header_value);
                }
            }
        }
        if let Some(payload) = request.payload {
            builder = builder.body(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EchoError::Transport(anyhow::Error::new(e)))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| EchoError::Transport(anyhow::Error::new(e))))
            .boxed();

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
