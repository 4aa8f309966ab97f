//! Shared test doubles
//!
//! `ScriptedStore` replays a queue of upload outcomes, each after a simulated
//! transfer delay, and records every call it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use cos_speedtest::cos::{ObjectStore, ResponseMeta, StorageError};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted outcome for one Put
#[derive(Debug, Clone)]
pub enum Step {
    Succeed(Duration),
    Fail(Duration, StorageError),
}

/// A call observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Put { key: String, len: usize },
    Delete(String),
}

pub struct ScriptedStore {
    steps: Mutex<VecDeque<Step>>,
    /// Used once the script is exhausted
    fallback: Step,
    delete_error: Option<StorageError>,
    calls: Mutex<Vec<Call>>,
    request_counter: Mutex<u32>,
}

impl ScriptedStore {
    pub fn new(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            delete_error: None,
            calls: Mutex::new(Vec::new()),
            request_counter: Mutex::new(0),
        }
    }

    /// Every Put succeeds after `delay`
    pub fn always_succeeding(delay: Duration) -> Self {
        Self::new(Vec::new(), Step::Succeed(delay))
    }

    /// Every Put fails with `error`
    pub fn always_failing(error: StorageError) -> Self {
        Self::new(Vec::new(), Step::Fail(Duration::ZERO, error))
    }

    pub fn with_delete_error(mut self, error: StorageError) -> Self {
        self.delete_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn put_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Put { .. }))
            .count()
    }

    fn next_request_id(&self) -> String {
        let mut counter = self.request_counter.lock().unwrap();
        let id = format!("req-{}", *counter);
        *counter += 1;
        id
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<ResponseMeta, StorageError> {
        self.calls.lock().unwrap().push(Call::Put {
            key: key.to_string(),
            len: body.len(),
        });

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Succeed(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ResponseMeta {
                    status: StatusCode::OK,
                    request_id: Some(self.next_request_id()),
                })
            }
            Step::Fail(delay, error) => {
                tokio::time::sleep(delay).await;
                Err(error)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<ResponseMeta, StorageError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(key.to_string()));

        match &self.delete_error {
            Some(error) => Err(error.clone()),
            None => Ok(ResponseMeta {
                status: StatusCode::NO_CONTENT,
                request_id: None,
            }),
        }
    }
}
