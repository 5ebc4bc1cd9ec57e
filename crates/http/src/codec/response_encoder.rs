//! HTTP response encoder.
//!
//! Serializes a fully buffered `Response<Bytes>`: status line, headers, then the body. The
//! `Content-Length` header always reflects the response body, and a `Date` header is added
//! when the handler did not set one. [`HeadOnly`] answers `HEAD` requests: same head, no body.

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, DATE};
use http::response::Parts;
use http::{HeaderMap, HeaderValue, Response, Version};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::SendError;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

/// A response to a `HEAD` request.
///
/// Encodes the same head as the full response, `Content-Length` included, but no body bytes.
#[derive(Debug)]
pub struct HeadOnly(pub Response<Bytes>);

impl Encoder<Response<Bytes>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = item.into_parts();
        encode_head(parts, body.len(), dst)?;
        dst.put_slice(&body);
        Ok(())
    }
}

impl Encoder<HeadOnly> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: HeadOnly, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = item.0.into_parts();
        encode_head(parts, body.len(), dst)
    }
}

fn encode_head(mut parts: Parts, body_len: usize, dst: &mut BytesMut) -> Result<(), SendError> {
    if parts.version != Version::HTTP_11 {
        error!(http_version = ?parts.version, "unsupported http version");
        return Err(SendError::UnsupportedVersion(parts.version));
    }

    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
    insert_date(&mut parts.headers);

    dst.reserve(INIT_HEADER_SIZE + body_len);

    dst.put_slice(b"HTTP/1.1 ");
    dst.put_slice(parts.status.as_str().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(parts.status.canonical_reason().unwrap_or_default().as_bytes());
    dst.put_slice(b"\r\n");

    for (header_name, header_value) in &parts.headers {
        dst.put_slice(header_name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
    Ok(())
}

fn insert_date(headers: &mut HeaderMap) {
    if headers.contains_key(DATE) {
        return;
    }

    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    if let Ok(value) = HeaderValue::from_bytes(&buf) {
        headers.insert(DATE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http::header::CONTENT_TYPE;

    fn encode(response: Response<Bytes>) -> String {
        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(response, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn encode_json_response() {
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(br#"{"error":"Not Found"}"#))
            .unwrap();

        let encoded = encode(response);

        assert!(encoded.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(encoded.contains("content-type: application/json\r\n"));
        assert!(encoded.contains("content-length: 21\r\n"));
        assert!(encoded.contains("date: "));
        assert!(encoded.ends_with("\r\n\r\n{\"error\":\"Not Found\"}"));
    }

    #[test]
    fn content_length_follows_body() {
        let response = Response::builder().header(CONTENT_LENGTH, "999").body(Bytes::from_static(b"\"hello\"")).unwrap();

        let encoded = encode(response);

        assert!(encoded.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(encoded.contains("content-length: 7\r\n"));
        assert!(!encoded.contains("999"));
    }

    #[test]
    fn keeps_handler_date() {
        let response = Response::builder().header(DATE, "Thu, 01 Jan 1970 00:00:00 GMT").body(Bytes::new()).unwrap();

        let encoded = encode(response);

        assert!(encoded.contains("date: Thu, 01 Jan 1970 00:00:00 GMT\r\n"));
        assert!(encoded.contains("content-length: 0\r\n"));
    }

    #[test]
    fn head_only_keeps_length_and_drops_body() {
        let response = Response::new(Bytes::from_static(br#"{"error":"Not Found"}"#));

        let mut dst = BytesMut::new();
        ResponseEncoder::new().encode(HeadOnly(response), &mut dst).unwrap();
        let encoded = String::from_utf8(dst.to_vec()).unwrap();

        assert!(encoded.contains("content-length: 21\r\n"));
        assert!(encoded.ends_with("\r\n\r\n"));
        assert!(!encoded.contains("Not Found\""));
    }

    #[test]
    fn rejects_http_10_response() {
        let response = Response::builder().version(Version::HTTP_10).body(Bytes::new()).unwrap();

        let mut dst = BytesMut::new();
        let result = ResponseEncoder::new().encode(response, &mut dst);
        assert!(matches!(result, Err(SendError::UnsupportedVersion(Version::HTTP_10))));
    }
}
