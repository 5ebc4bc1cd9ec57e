//! The HTTP/1.1 transport underneath relay
//!
//! This crate accepts bytes from a socket, turns them into complete requests, hands each one to
//! a [`handler::Handler`] and writes the response it returns. Bodies are buffered whole; there is
//! no streaming in either direction.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use relay_http::connection::HttpConnection;
//! use relay_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             if let Err(e) = HttpConnection::new(reader, writer).process(handler).await {
//!                 error!("service has error, cause {}, connection shutdown", e);
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<Bytes>) -> Option<Response<Bytes>> {
//!     info!(path = request.uri().path(), "receiving request");
//!     Some(Response::new(Bytes::from_static(b"Hello World!\r\n")))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: connection lifecycle, keep-alive and `100 Continue`
//! - [`protocol`]: request header, decoder messages and error types
//! - [`codec`]: request decoding and response encoding
//! - [`handler`]: the trait a request-answering service implements
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - No TLS support
//! - `Content-Length` request bodies only, `Transfer-Encoding` is refused
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
