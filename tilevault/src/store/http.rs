//! HTTP client abstraction for tile downloads.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("tilevault/", env!("CARGO_PKG_VERSION"));

/// Errors raised while downloading a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The request could not be sent or timed out
    #[error("Request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body could not be read
    #[error("Failed to read response: {0}")]
    Body(String),
}

/// Async HTTP GET.
///
/// Implemented by [`AsyncReqwestClient`] in production and by mocks in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// Non-2xx statuses are errors.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// HTTP client backed by reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(HttpError::Request(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => Err(HttpError::Body(e.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Serves `body` for every URL except those marked as failing.
    #[derive(Default)]
    pub struct MockHttpClient {
        pub body: Vec<u8>,
        pub failing: HashSet<String>,
        pub requests: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn serving(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                ..Default::default()
            }
        }

        pub fn failing_on(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(url.to_string());
            }
            if self.failing.contains(url) {
                return Err(HttpError::Status {
                    status: 404,
                    url: url.to_string(),
                });
            }
            Ok(self.body.clone())
        }
    }
}
