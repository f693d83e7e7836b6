//! gRPC client runtime for wirekit-generated service stubs.
//!
//! The pieces fit together like this:
//!
//! - [`GrpcClient`] — the call runtime: encodes, frames, dispatches, and
//!   normalizes every fault into a status-coded failure
//! - [`GrpcTransport`] — the seam to the network; [`HyperTransport`] is the
//!   default HTTP/2 implementation
//! - [`MessageStream`] — lazy server-streaming responses, cancellable
//! - [`CallOptions`] — per-call timeout and headers
//!
//! Generated stubs wrap a [`GrpcClient`] and bind each method to its call
//! path; applications rarely use this crate directly beyond constructing
//! the client.
//!
//! ```ignore
//! let transport = HyperTransport::new("http://localhost:50051".parse()?);
//! let client = GrpcClient::builder(transport)
//!     .default_timeout(Duration::from_secs(10))
//!     .build();
//! let books = BookServiceClient::new(client);
//! ```

mod client;
mod error;
mod frame;
mod options;
mod transport;

pub use client::{GrpcClient, GrpcClientBuilder, MessageStream};
pub use error::TransportError;
pub use frame::FrameDecoder;
pub use options::CallOptions;
pub use transport::{CancelHandle, GrpcTransport, StreamCall, TransportResponse};

#[cfg(feature = "hyper-transport")]
pub use transport::hyper::{HyperTransport, HyperTransportBuilder};
