//! COS Client module
//!
//! Provides the Object Storage Client the benchmark drives: a minimal
//! PutObject/DeleteObject client for Tencent COS with SigV4 signing and
//! tracing spans.
//!
//! # Example
//!
//! ```no_run
//! use cos_speedtest::cos::{CosClient, CosClientConfig};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CosClientConfig {
//!     bucket: "examplebucket-1250000000".to_string(),
//!     region: "ap-guangzhou".to_string(),
//!     endpoint: None,
//!     secret_id: "AKIDEXAMPLE".to_string(),
//!     secret_key: "secret".to_string(),
//!     timeout: None,
//! };
//!
//! let client = CosClient::new(config)?;
//! let response = client.put_object("hello.txt", Bytes::from("Hello, World!")).await?;
//! println!("{} {:?}", response.status_text(), response.request_id);
//! client.delete_object("hello.txt").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | PutObject | `cos.put_object` | bucket, key, method, bytes, status_code, request_id |
//! | DeleteObject | `cos.delete_object` | bucket, key, method, status_code, request_id |

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode, Url};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub mod credentials;
pub mod error;
pub mod signing;

pub use credentials::{Credentials, CredentialsError};
pub use error::{ServiceError, StorageError};
use signing::{SigV4Signer, UNSIGNED_PAYLOAD};

use crate::config::Config;

/// Response header carrying the server-assigned request identifier
pub const REQUEST_ID_HEADER: &str = "x-cos-request-id";

/// Object key characters left unescaped in the request path
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// COS client errors
#[derive(Error, Debug)]
pub enum CosClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Credentials error")]
    CredentialsError(#[from] CredentialsError),

    #[error("Signing error: {0}")]
    SigningError(String),
}

/// Metadata of a successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub request_id: Option<String>,
}

impl ResponseMeta {
    /// Status line text, e.g. `200 OK`
    pub fn status_text(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }
}

/// The two operations the benchmark needs from an object store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `body` under `key`, returning once the full response arrived
    async fn put(&self, key: &str, body: Bytes) -> Result<ResponseMeta, StorageError>;

    /// Delete the object stored under `key`
    async fn delete(&self, key: &str) -> Result<ResponseMeta, StorageError>;
}

/// COS Client configuration
#[derive(Debug, Clone)]
pub struct CosClientConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub secret_id: String,
    pub secret_key: String,
    pub timeout: Option<Duration>,
}

impl CosClientConfig {
    /// Build client configuration from the loaded configuration document
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            secret_id: config.secret_id.clone(),
            secret_key: config.secret_key.clone(),
            timeout: None,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the endpoint URL
    ///
    /// Defaults to the virtual-hosted bucket endpoint
    /// `http://<bucket>.cos.<region>.myqcloud.com`.
    pub fn endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!("http://{}.cos.{}.myqcloud.com", self.bucket, self.region)
        })
    }
}

/// COS Client
pub struct CosClient {
    config: CosClientConfig,
    signer: SigV4Signer,
    http_client: reqwest::Client,
    /// `scheme://host[:port]` of the endpoint
    origin: String,
    /// Value of the `Host` header, as signed
    host: String,
}

impl CosClient {
    /// Create a new COS client
    pub fn new(config: CosClientConfig) -> Result<Self, CosClientError> {
        let endpoint = config.endpoint();
        let url = Url::parse(&endpoint)
            .map_err(|e| CosClientError::ConfigError(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let host_name = url
            .host_str()
            .ok_or_else(|| CosClientError::ConfigError(format!("endpoint '{}' has no host", endpoint)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };
        let origin = format!("{}://{}", url.scheme(), host);

        let credentials = Credentials::new(&config.secret_id, &config.secret_key);
        if credentials.secret_id().is_empty() || credentials.secret_key().is_empty() {
            return Err(CredentialsError::MissingCredentials(
                "SecretID and SecretKey are required".into(),
            )
            .into());
        }
        let signer = SigV4Signer::new(credentials, &config.region);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| CosClientError::ConfigError(e.to_string()))?;

        Ok(Self {
            config,
            signer,
            http_client,
            origin,
            host,
        })
    }

    /// Create a client from the loaded configuration document
    pub fn from_config(config: &Config, timeout: Option<Duration>) -> Result<Self, CosClientError> {
        let mut client_config = CosClientConfig::from_config(config);
        client_config.timeout = timeout;
        Self::new(client_config)
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Get the region
    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> String {
        self.config.endpoint()
    }

    /// Full request URL for an object key
    pub fn object_url(&self, key: &str) -> String {
        format!("{}{}", self.origin, canonical_uri(key))
    }

    /// Upload an object (PutObject)
    #[tracing::instrument(
        name = "cos.put_object",
        skip(self, body),
        fields(
            cos.bucket = %self.config.bucket,
            cos.key = %key,
            http.method = "PUT",
            upload.bytes = body.len(),
            http.status_code = tracing::field::Empty,
            cos.request_id = tracing::field::Empty
        )
    )]
    pub async fn put_object(&self, key: &str, body: Bytes) -> Result<ResponseMeta, StorageError> {
        let response = self.send(Method::PUT, key, Some(body)).await?;
        let meta = read_response(response).await?;
        record_response(&meta);

        tracing::debug!(status = %meta.status, "PutObject completed");
        Ok(meta)
    }

    /// Delete an object (DeleteObject)
    #[tracing::instrument(
        name = "cos.delete_object",
        skip(self),
        fields(
            cos.bucket = %self.config.bucket,
            cos.key = %key,
            http.method = "DELETE",
            http.status_code = tracing::field::Empty,
            cos.request_id = tracing::field::Empty
        )
    )]
    pub async fn delete_object(&self, key: &str) -> Result<ResponseMeta, StorageError> {
        let response = self.send(Method::DELETE, key, None).await?;
        let meta = read_response(response).await?;
        record_response(&meta);

        tracing::debug!(status = %meta.status, "DeleteObject completed");
        Ok(meta)
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response, StorageError> {
        let uri = canonical_uri(key);

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), self.host.clone());
        let authorization = self
            .signer
            .sign(
                method.as_str(),
                &uri,
                "",
                &mut headers,
                UNSIGNED_PAYLOAD,
                Utc::now(),
            )
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        // reqwest derives Host from the URL
        headers.remove("host");

        let mut request = self
            .http_client
            .request(method, format!("{}{}", self.origin, uri))
            .header(AUTHORIZATION, authorization);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }
}

#[async_trait]
impl ObjectStore for CosClient {
    async fn put(&self, key: &str, body: Bytes) -> Result<ResponseMeta, StorageError> {
        self.put_object(key, body).await
    }

    async fn delete(&self, key: &str) -> Result<ResponseMeta, StorageError> {
        self.delete_object(key).await
    }
}

fn canonical_uri(key: &str) -> String {
    format!("/{}", utf8_percent_encode(key, KEY_ENCODE_SET))
}

async fn read_response(response: reqwest::Response) -> Result<ResponseMeta, StorageError> {
    let status = response.status();
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if status.is_success() {
        // The upload only counts once the whole response has arrived
        response.bytes().await?;
        return Ok(ResponseMeta { status, request_id });
    }

    let body = response.text().await.unwrap_or_default();
    Err(StorageError::from_response(status, request_id, &body))
}

fn record_response(meta: &ResponseMeta) {
    let span = tracing::Span::current();
    span.record("http.status_code", meta.status.as_u16());
    if let Some(ref request_id) = meta.request_id {
        span.record("cos.request_id", request_id.as_str());
    }
}
