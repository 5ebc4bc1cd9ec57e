//! HTTP connection handling
//!
//! [`HttpConnection`] reads complete requests off a socket, hands each one to a
//! [`Handler`](crate::handler::Handler) and writes the response back:
//!
//! - keep-alive per HTTP/1.0 and HTTP/1.1 rules, honoring `Connection: close`
//! - `Expect: 100-continue` acknowledged before the body is read
//! - `400 Bad Request` on unparsable input, then the connection is closed
//! - a request the handler never answers keeps the connection open until the peer leaves

mod http_connection;

pub use http_connection::HttpConnection;
