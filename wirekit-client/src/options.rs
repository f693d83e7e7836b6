//! Per-call configuration.

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};

/// Options for one RPC call: a timeout override and extra request headers.
///
/// # Example
///
/// ```ignore
/// let options = CallOptions::new()
///     .timeout(Duration::from_secs(5))
///     .header("authorization", "Bearer token123");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    pub(crate) timeout: Option<Duration>,
    pub(crate) headers: HeaderMap,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this call, overriding the client default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured timeout, if any.
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Add a request header for this call. Invalid names or values are
    /// silently dropped; use typed `HeaderName`/`HeaderValue` arguments when
    /// that matters.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.headers.insert(name, value);
        }
        self
    }

    /// The extra headers configured for this call.
    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }
}
