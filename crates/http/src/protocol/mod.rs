//! Core HTTP protocol types shared by the codec and the connection.
//!
//! - [`Message`]: what the request decoder yields, either a complete buffered request or a
//!   signal that the client waits for `100 Continue`
//! - [`RequestHeader`]: a parsed request head before its body is attached
//! - [`HttpError`], [`ParseError`], [`SendError`]: transport errors

mod message;
pub use message::Message;

mod request;
pub use request::RequestHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
