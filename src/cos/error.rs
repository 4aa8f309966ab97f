//! Storage error classification
//!
//! Every failed COS operation lands in one of three buckets:
//!
//! | Variant | Trigger | Benchmark handling |
//! |---------|---------|--------------------|
//! | `NotFound` | HTTP 404 | warning |
//! | `Service` | any other non-2xx with (or without) an XML error body | error |
//! | `Transport` | connection, timeout, signing or other local failure | error |

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Structured error returned by the COS service
///
/// Decoded from the XML body:
///
/// ```xml
/// <Error>
///   <Code>NoSuchBucket</Code>
///   <Message>The specified bucket does not exist.</Message>
///   <Resource>examplebucket-1250000000.cos.ap-guangzhou.myqcloud.com</Resource>
///   <RequestId>NjA3YjYwZDBfOTBmYTUwNjRfNmY2Nl8x****</RequestId>
/// </Error>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceError {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Resource", default)]
    pub resource: String,
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
    #[serde(skip)]
    pub status: u16,
}

/// Errors surfaced by an object store operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Resource not found")]
    NotFound { request_id: Option<String> },

    #[error("Service error {}: {}", .0.code, .0.message)]
    Service(ServiceError),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl StorageError {
    /// Classify a non-success HTTP response
    ///
    /// `request_id` is the `x-cos-request-id` header; it backfills the
    /// structured error when the body omits one.
    pub fn from_response(status: StatusCode, request_id: Option<String>, body: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return StorageError::NotFound { request_id };
        }

        let mut error = match quick_xml::de::from_str::<ServiceError>(body) {
            Ok(parsed) if !parsed.code.is_empty() => parsed,
            _ => ServiceError {
                code: status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string(),
                message: body.trim().to_string(),
                ..Default::default()
            },
        };

        error.status = status.as_u16();
        if error.request_id.is_empty() {
            error.request_id = request_id.unwrap_or_default();
        }

        StorageError::Service(error)
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::NotFound { .. } => "not_found",
            StorageError::Service(_) => "service",
            StorageError::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        StorageError::Transport(error.to_string())
    }
}
