//! HTTP request decoder.
//!
//! Coordinates header parsing with body buffering. A request is only emitted once its whole
//! `Content-Length` body is in the buffer; chunked or otherwise encoded bodies are rejected
//! because relay never streams.
//!
//! # State Machine
//!
//! The decoder keeps its state in the `pending` field:
//! - `None`: parsing the next request header
//! - `Some(PendingBody)`: the header is parsed and its body is still arriving

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header_decoder::HeaderDecoder;
use crate::ensure;
use crate::protocol::{Message, ParseError, RequestHeader};

/// Largest `Content-Length` accepted for a request body.
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Upper bound on how much buffer space is reserved per poll while a body is arriving.
const BODY_RESERVE_CHUNK: usize = 8 * 1024;

/// A decoder that turns raw bytes into complete, buffered requests.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    pending: Option<PendingBody>,
}

#[derive(Debug)]
struct PendingBody {
    header: RequestHeader,
    length: usize,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = Message;
    type Error = ParseError;

    /// # Returns
    ///
    /// - `Ok(Some(Message::Request(_)))`: a complete request
    /// - `Ok(Some(Message::ExpectContinue))`: the client waits before sending its body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the bytes are not a request relay accepts
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.pending.is_none() {
            let Some(header) = self.header_decoder.decode(src)? else {
                return Ok(None);
            };

            let length = content_length(&header)?;
            if length == 0 {
                return Ok(Some(Message::Request(header.body(Bytes::new()))));
            }

            let expects_continue = header.expects_continue();
            self.pending = Some(PendingBody { header, length });
            if expects_continue && src.len() < length {
                return Ok(Some(Message::ExpectContinue));
            }
        }

        match self.pending.take() {
            Some(PendingBody { header, length }) if src.len() >= length => {
                let body = src.split_to(length).freeze();
                Ok(Some(Message::Request(header.body(body))))
            }
            Some(pending) => {
                trace!(received = src.len(), expected = pending.length, "waiting for request body");
                src.reserve((pending.length - src.len()).min(BODY_RESERVE_CHUNK));
                self.pending = Some(pending);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        match &self.pending {
            Some(pending) => Err(ParseError::incomplete_body(pending.length, src.len())),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::invalid_header("connection closed before the request header completed")),
        }
    }
}

/// Reads the body length announced by the header, refusing any transfer-coding.
fn content_length(header: &RequestHeader) -> Result<usize, ParseError> {
    if let Some(te_value) = header.headers().get(TRANSFER_ENCODING) {
        let encoding = String::from_utf8_lossy(te_value.as_bytes());
        if !encoding.trim().eq_ignore_ascii_case("identity") {
            return Err(ParseError::unsupported_transfer_encoding(encoding));
        }
    }

    let Some(cl_value) = header.headers().get(CONTENT_LENGTH) else {
        return Ok(0);
    };

    let cl_str = cl_value.to_str().map_err(|_e| ParseError::invalid_content_length("value can't to_str"))?;
    let length = cl_str
        .trim()
        .parse::<usize>()
        .map_err(|_e| ParseError::invalid_content_length(format!("value {cl_str} is not usize")))?;

    ensure!(length <= MAX_BODY_BYTES, ParseError::too_large_body(length, MAX_BODY_BYTES));
    Ok(length)
}
