//! JSON body parsing middleware.
//!
//! [`json()`] builds a [`JsonBodyParser`]. It always leaves a body on the request (an empty
//! object when nothing was parsed), and parses the raw body when the request declares
//! `Content-Type: application/json` and carries at least one byte.
//!
//! A body that is larger than the configured limit is answered with `413`; a body that is not
//! valid JSON, or in strict mode is neither an object nor an array, is answered with `400`.
//! In both cases the chain stops there.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::middleware::{Middleware, Next};
use crate::response::write_error;
use crate::{Request, Response};

/// Default maximum body size accepted by [`JsonBodyParser`], 100 KiB.
pub const DEFAULT_LIMIT: usize = 100 * 1024;

#[derive(Debug, Clone)]
pub struct JsonBodyParser {
    limit: usize,
    strict: bool,
}

/// Creates a JSON body parser with the default limit in strict mode.
///
/// ```
/// use relay_web::App;
/// use relay_web::middleware::json;
///
/// let mut app = App::new();
/// app.use_middleware(json().limit(1024).strict(false));
/// ```
pub fn json() -> JsonBodyParser {
    JsonBodyParser::default()
}

impl JsonBodyParser {
    /// Sets the largest body, in bytes, the parser accepts.
    pub fn limit(mut self, bytes: usize) -> Self {
        self.limit = bytes;
        self
    }

    /// When strict, only a top-level object or array is accepted.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn parse(&self, raw: &[u8]) -> Result<Value, Rejection> {
        if raw.len() > self.limit {
            return Err(Rejection::TooLarge { length: raw.len() });
        }

        if self.strict && !starts_with_object_or_array(raw) {
            return Err(Rejection::Invalid("JSON body must be an object or an array in strict mode".to_owned()));
        }

        serde_json::from_slice(raw).map_err(|e| Rejection::Invalid(e.to_string()))
    }
}

impl Default for JsonBodyParser {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, strict: true }
    }
}

impl Middleware for JsonBodyParser {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        if req.body().is_none() {
            req.set_body(Value::Object(Map::new()));
        }

        if req.raw_body().is_empty() || !is_json(req.headers()) {
            return next.run(req, res);
        }

        match self.parse(req.raw_body()) {
            Ok(body) => {
                req.set_body(body);
                next.run(req, res)
            }
            Err(Rejection::TooLarge { length }) => {
                warn!(length, limit = self.limit, "json body exceeds limit");
                write_error(res, StatusCode::PAYLOAD_TOO_LARGE, "request entity too large");
            }
            Err(Rejection::Invalid(message)) => {
                debug!(cause = message.as_str(), "rejecting invalid json body");
                write_error(res, StatusCode::BAD_REQUEST, &message);
            }
        }
    }
}

enum Rejection {
    TooLarge { length: usize },
    Invalid(String),
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|parsed| parsed.essence_str() == mime::APPLICATION_JSON.essence_str())
}

fn starts_with_object_or_array(raw: &[u8]) -> bool {
    matches!(raw.iter().find(|byte| !byte.is_ascii_whitespace()), Some(b'{' | b'['))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewareChain;
    use bytes::Bytes;
    use serde_json::json;

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(Bytes::from_static(body.as_bytes())).unwrap().into()
    }

    /// Runs `parser` and returns whether the chain continued.
    fn run(parser: JsonBodyParser, req: &mut Request, res: &mut Response) -> bool {
        let mut chain = MiddlewareChain::new();
        chain.push(parser);

        let mut continued = false;
        chain.execute(req, res, &mut |_req: &mut Request, _res: &mut Response| continued = true);
        continued
    }

    fn body_text(res: &Response) -> &str {
        std::str::from_utf8(res.body().unwrap()).unwrap()
    }

    #[test]
    fn parses_json_body() {
        let mut req = request(Some("application/json; charset=utf-8"), r#"{"name":"relay"}"#);
        let mut res = Response::new();

        assert!(run(json(), &mut req, &mut res));
        assert_eq!(req.body(), Some(&json!({"name": "relay"})));
        assert!(!res.is_finished());
    }

    #[test]
    fn defaults_to_empty_object() {
        let mut req = request(None, "plain text");
        let mut res = Response::new();

        assert!(run(json(), &mut req, &mut res));
        assert_eq!(req.body(), Some(&json!({})));
    }

    #[test]
    fn empty_json_body_is_empty_object() {
        let mut req = request(Some("application/json"), "");
        let mut res = Response::new();

        assert!(run(json(), &mut req, &mut res));
        assert_eq!(req.body(), Some(&json!({})));
    }

    #[test]
    fn invalid_json_is_bad_request() {
        let mut req = request(Some("application/json"), "{not json");
        let mut res = Response::new();

        assert!(!run(json(), &mut req, &mut res));
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(body_text(&res).starts_with(r#"{"statusCode":400,"message":"#));
        assert!(body_text(&res).ends_with(r#","error":"Bad Request"}"#));
    }

    #[test]
    fn strict_rejects_scalars() {
        let mut req = request(Some("application/json"), r#""hello""#);
        let mut res = Response::new();

        assert!(!run(json(), &mut req, &mut res));
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn lenient_accepts_scalars() {
        let mut req = request(Some("application/json"), " 42 ");
        let mut res = Response::new();

        assert!(run(json().strict(false), &mut req, &mut res));
        assert_eq!(req.body(), Some(&json!(42)));
    }

    #[test]
    fn over_limit_is_payload_too_large() {
        let mut req = request(Some("application/json"), r#"{"a":"0123456789"}"#);
        let mut res = Response::new();

        assert!(!run(json().limit(8), &mut req, &mut res));
        assert_eq!(res.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_text(&res),
            r#"{"statusCode":413,"message":"request entity too large","error":"Payload Too Large"}"#
        );
    }

    #[test]
    fn keeps_body_set_by_earlier_middleware() {
        let mut req = request(None, "");
        req.set_body(json!([1]));
        let mut res = Response::new();

        assert!(run(json(), &mut req, &mut res));
        assert_eq!(req.body(), Some(&json!([1])));
    }
}
