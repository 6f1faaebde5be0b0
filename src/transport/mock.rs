//! # Mock Transport
//!
//! An in-memory [`Transport`] for tests. Register the responses you expect,
//! run the code under test, then check what was requested.
//!
//! ```ignore
//! let mock = MockTransport::new();
//! mock.expect_get("/orders/42").return_ok(json!({ "properties": { "id": 42 } }));
//! mock.expect_get("/orders/43").return_err(TransportFailure::status(404, "{}"));
//!
//! let transport: Arc<dyn Transport> = Arc::new(mock.clone());
//! // Use transport in tests...
//! assert_eq!(mock.call_count("/orders/42"), 1);
//! mock.verify(); // Ensures all expectations were met
//! ```
//!
//! Every response is delivered after yielding to the scheduler once, so two
//! resolutions started together (e.g. with `tokio::join!`) really overlap: the
//! second one observes the first one's request while it is still pending.

use crate::transport::{Request, Transport, TransportFailure};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Response = Result<Value, TransportFailure>;

#[derive(Default)]
struct MockState {
    expectations: HashMap<(String, String), VecDeque<Response>>,
    calls: Vec<Request>,
    latency: Option<Duration>,
}

/// A transport with expectation tracking.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response by `latency` on top of the scheduler yield.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expects a `GET` of `url`.
    pub fn expect_get(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect("GET", url)
    }

    /// Expects a request with the given method.
    pub fn expect(&self, method: impl Into<String>, url: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            key: (method.into().to_uppercase(), url.into()),
            state: self.state.clone(),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<Request> {
        self.lock().calls.clone()
    }

    /// Number of requests received for `url`, any method.
    pub fn call_count(&self, url: &str) -> usize {
        self.lock().calls.iter().filter(|r| r.url == url).count()
    }

    /// Total number of requests received.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.lock();
        let remaining: usize = state.expectations.values().map(VecDeque::len).sum();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: Request) -> Result<Value, TransportFailure> {
        let (response, latency) = {
            let mut state = self.lock();
            let key = (request.method.to_uppercase(), request.url.clone());
            let response = state
                .expectations
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(TransportFailure::new(
                        None,
                        format!("unexpected request: {} {}", key.0, key.1),
                    ))
                });
            state.calls.push(request);
            (response, state.latency)
        };

        tokio::task::yield_now().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        response
    }
}

/// Builder for a single expected response.
pub struct ExpectationBuilder {
    key: (String, String),
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    fn push(self, response: Response) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.expectations.entry(self.key).or_default().push_back(response);
    }

    /// Answers the request with a JSON body.
    pub fn return_ok(self, body: Value) {
        self.push(Ok(body));
    }

    /// Answers the request with a failure.
    pub fn return_err(self, failure: TransportFailure) {
        self.push(Err(failure));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_transport_with_expectations() {
        let mock = MockTransport::new();
        mock.expect_get("/a").return_ok(json!({ "properties": { "id": 1 } }));
        mock.expect("post", "/a").return_err(TransportFailure::status(422, "{}"));

        let ok = mock.fetch(Request::get("/a")).await.unwrap();
        assert_eq!(ok["properties"]["id"], 1);

        let post = Request {
            method: "POST".into(),
            ..Request::get("/a")
        };
        let err = mock.fetch(post).await.unwrap_err();
        assert_eq!(err.status, Some(422));

        assert_eq!(mock.call_count("/a"), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn test_unexpected_request_fails() {
        let mock = MockTransport::new();
        let err = mock.fetch(Request::get("/nowhere")).await.unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.body.contains("/nowhere"));
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_panics_on_leftovers() {
        let mock = MockTransport::new();
        mock.expect_get("/never").return_ok(json!({}));
        mock.verify();
    }
}
