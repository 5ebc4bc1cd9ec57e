//! HTTP codec module for decoding requests and encoding responses
//!
//! - [`RequestDecoder`]: turns inbound bytes into complete requests, buffering each
//!   `Content-Length` body before the request is handed on
//! - [`ResponseEncoder`]: serializes buffered responses
//!
//! # Example
//!
//! ```no_run
//! use relay_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let message = decoder.decode(&mut buffer);
//! ```

mod header_decoder;
mod request_decoder;
mod response_encoder;

pub use header_decoder::HeaderDecoder;
pub use request_decoder::RequestDecoder;
pub use response_encoder::{HeadOnly, ResponseEncoder};
