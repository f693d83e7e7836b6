//! Hyper-based gRPC transport.
//!
//! This module provides [`HyperTransport`], the default transport built on
//! hyper_util's legacy client. It speaks HTTP/2 with prior knowledge (h2c),
//! which is what gRPC servers expect on unencrypted connections.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::StreamExt;
use http::header::{CONTENT_TYPE, TE};
use http::{HeaderMap, Method, Uri};
use http_body_util::{BodyExt, BodyStream, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use wirekit_core::{Trailers, GRPC_STATUS};

use crate::error::TransportError;
use crate::transport::{CancelHandle, GrpcTransport, StreamCall, TransportResponse};

type HyperClient = Client<HttpConnector, Full<Bytes>>;

/// gRPC transport over hyper_util's legacy client.
///
/// # Example
///
/// ```ignore
/// let transport = HyperTransport::new("http://localhost:50051".parse()?);
/// let client = GrpcClient::new(transport);
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    endpoint: Uri,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport for `endpoint` with default settings.
    pub fn new(endpoint: Uri) -> Self {
        Self::builder(endpoint).build()
    }

    /// Create a transport builder for `endpoint`.
    pub fn builder(endpoint: Uri) -> HyperTransportBuilder {
        HyperTransportBuilder::new(endpoint)
    }

    fn build_request(
        &self,
        path: &str,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Result<http::Request<Full<Bytes>>, TransportError> {
        let mut parts = self.endpoint.clone().into_parts();
        parts.path_and_query = Some(
            path.parse()
                .map_err(|e| TransportError::Network(format!("invalid call path: {e}")))?,
        );
        let uri = Uri::from_parts(parts)
            .map_err(|e| TransportError::Network(format!("invalid request uri: {e}")))?;

        let mut request = http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/grpc")
            .header(TE, "trailers")
            .body(Full::new(body))
            .map_err(|e| TransportError::Network(format!("invalid request: {e}")))?;
        request.headers_mut().extend(headers.clone());
        Ok(request)
    }
}

impl GrpcTransport for HyperTransport {
    fn unary_call(
        &self,
        path: String,
        frame: Bytes,
        timeout: Option<Duration>,
        headers: HeaderMap,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
        let client = self.client.clone();
        let request = self.build_request(&path, frame, &headers);

        Box::pin(async move {
            let request = request?;
            let exchange = async move {
                let response = client
                    .request(request)
                    .await
                    .map_err(|e| TransportError::Network(format!("request failed: {e}")))?;
                let (parts, body) = response.into_parts();
                let collected = body
                    .collect()
                    .await
                    .map_err(|e| TransportError::Network(format!("body read failed: {e}")))?;
                // Trailers-only responses carry grpc-status in the headers.
                let trailers = match collected.trailers() {
                    Some(map) if map.contains_key(GRPC_STATUS) => map.clone(),
                    _ => parts.headers,
                };
                Ok(TransportResponse {
                    body: collected.to_bytes(),
                    trailers: Trailers::new(trailers),
                })
            };

            match timeout {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .map_err(|_| TransportError::Timeout)?,
                None => exchange.await,
            }
        })
    }

    fn server_stream(
        &self,
        path: String,
        frame: Bytes,
        headers: HeaderMap,
    ) -> BoxFuture<'static, Result<StreamCall, TransportError>> {
        let client = self.client.clone();
        let request = self.build_request(&path, frame, &headers);

        Box::pin(async move {
            let response = client
                .request(request?)
                .await
                .map_err(|e| TransportError::Network(format!("request failed: {e}")))?;

            let chunks = BodyStream::new(response.into_body()).filter_map(|result| {
                futures::future::ready(match result {
                    // Trailer frames end the body; only data frames are bytes.
                    Ok(frame) => frame.into_data().ok().map(Ok),
                    Err(e) => Some(Err(TransportError::Network(format!("body read failed: {e}")))),
                })
            });
            let (incoming, handle) = futures::stream::abortable(chunks);

            Ok(StreamCall {
                incoming: incoming.boxed(),
                cancel: CancelHandle::new(handle),
            })
        })
    }
}

/// Builder for [`HyperTransport`].
pub struct HyperTransportBuilder {
    endpoint: Uri,
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: usize,
    h2_keep_alive_interval: Option<Duration>,
    h2_keep_alive_timeout: Option<Duration>,
}

impl HyperTransportBuilder {
    pub fn new(endpoint: Uri) -> Self {
        Self {
            endpoint,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            h2_keep_alive_interval: None,
            h2_keep_alive_timeout: None,
        }
    }

    /// Close pooled connections idle for longer than this.
    ///
    /// Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Maximum idle connections kept per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Send HTTP/2 PING frames at this interval to detect dead
    /// connections.
    pub fn h2_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.h2_keep_alive_interval = Some(interval);
        self
    }

    /// How long to wait for a PING response before closing the connection.
    /// Only effective with `h2_keep_alive_interval`.
    pub fn h2_keep_alive_timeout(mut self, timeout: Duration) -> Self {
        self.h2_keep_alive_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> HyperTransport {
        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new());
        builder.http2_only(true);

        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        if let Some(interval) = self.h2_keep_alive_interval {
            builder.http2_keep_alive_interval(interval);
        }
        if let Some(timeout) = self.h2_keep_alive_timeout {
            builder.http2_keep_alive_timeout(timeout);
        }

        HyperTransport {
            client: builder.build_http(),
            endpoint: self.endpoint,
        }
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("endpoint", &self.endpoint)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("h2_keep_alive_interval", &self.h2_keep_alive_interval)
            .field("h2_keep_alive_timeout", &self.h2_keep_alive_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Uri {
        Uri::from_static("http://localhost:50051")
    }

    #[test]
    fn test_builder_defaults() {
        let builder = HyperTransportBuilder::new(endpoint());
        assert_eq!(builder.pool_max_idle_per_host, 32);
        assert!(builder.pool_idle_timeout.is_some());
    }

    #[test]
    fn test_builder_pool_settings() {
        let builder = HyperTransportBuilder::new(endpoint())
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(10);
        assert_eq!(builder.pool_idle_timeout, Some(Duration::from_secs(60)));
        assert_eq!(builder.pool_max_idle_per_host, 10);
    }

    #[test]
    fn test_request_carries_grpc_headers() {
        let transport = HyperTransport::new(endpoint());
        let request = transport
            .build_request("/demo.Service/Call", Bytes::from_static(b"x"), &HeaderMap::new())
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/demo.Service/Call");
        assert_eq!(request.uri().authority().unwrap(), "localhost:50051");
        assert_eq!(request.headers().get(CONTENT_TYPE).unwrap(), "application/grpc");
        assert_eq!(request.headers().get(TE).unwrap(), "trailers");
    }

    #[test]
    fn test_extra_headers_are_applied() {
        let transport = HyperTransport::new(endpoint());
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", http::HeaderValue::from_static("abc"));
        let request = transport
            .build_request("/demo.Service/Call", Bytes::new(), &headers)
            .unwrap();

        assert_eq!(request.headers().get("x-request-id").unwrap(), "abc");
    }
}
