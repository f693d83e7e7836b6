//! Core wire-format types for wirekit.
//!
//! This crate provides the protobuf binary codec, the gRPC message framing
//! layer and the status/response types shared by the client runtime
//! (`wirekit-client`) and by generated code.
//!
//! ## Modules
//!
//! - [`wire`]: wire types, tags and varint/zigzag primitives
//! - [`writer`]: the append-only encode buffer builder
//! - [`reader`]: the bounded decode cursor
//! - [`message`]: the encode/decode capability implemented by generated types
//! - [`framing`]: gRPC length-prefixed framing
//! - [`status`]: status codes, trailers and the per-call response envelope
//! - [`error`]: decode and framing error types

mod error;
mod framing;
mod message;
mod reader;
mod status;
mod wire;
mod writer;

pub use error::*;
pub use framing::*;
pub use message::*;
pub use reader::*;
pub use status::*;
pub use wire::*;
pub use writer::*;
