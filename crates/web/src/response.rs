//! The response under construction.
//!
//! A [`Response`] starts with status `200` and no body. Middleware and handlers adjust its
//! head, then terminate it exactly once with [`Response::send`], [`Response::json`] or
//! [`Response::end`]. A response that is never terminated produces nothing on the wire.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

/// The response being built for one request.
#[derive(Debug)]
pub struct Response {
    head: http::Response<()>,
    body: Option<Bytes>,
}

impl Response {
    /// Creates an unterminated `200 OK` response with no headers.
    pub fn new() -> Self {
        Self::augment(http::Response::new(()))
    }

    /// Wraps an existing response head, keeping its status and headers.
    pub fn augment(head: http::Response<()>) -> Self {
        Self { head, body: None }
    }

    /// Sets the status code, for chaining into a terminal write.
    ///
    /// ```
    /// use http::StatusCode;
    /// use relay_web::Response;
    ///
    /// let mut res = Response::new();
    /// res.status(StatusCode::CREATED).send(&serde_json::json!({"id": 1}));
    /// assert_eq!(res.status_code(), StatusCode::CREATED);
    /// assert!(res.is_finished());
    /// ```
    ///
    /// The head is frozen once the response is terminated; later calls are logged and dropped.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if self.is_finished() {
            warn!(current = %self.status_code(), ignored = %status, "response already terminated, ignoring status change");
            return self;
        }
        *self.head.status_mut() = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.head.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.head.headers_mut()
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        if self.is_finished() {
            warn!(%name, "response already terminated, ignoring header");
            return self;
        }
        self.head.headers_mut().insert(name, value);
        self
    }

    /// Serializes `data` as JSON and terminates the response with it.
    ///
    /// No `Content-Type` is added; use [`Response::json`] for that.
    pub fn send<T: Serialize + ?Sized>(&mut self, data: &T) {
        match serde_json::to_vec(data) {
            Ok(bytes) => self.end(bytes),
            Err(e) => self.fail_serialization(&e),
        }
    }

    /// Like [`Response::send`], but also sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) {
        if self.is_finished() {
            warn!("response already terminated, ignoring json write");
            return;
        }
        self.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.send(data);
    }

    /// Terminates the response with a raw body.
    ///
    /// Only the first terminal write counts; later ones are logged and dropped.
    pub fn end(&mut self, body: impl Into<Bytes>) {
        if self.body.is_some() {
            warn!(status = %self.status_code(), "response already terminated, ignoring another write");
            return;
        }
        self.body = Some(body.into());
    }

    /// Returns true once a terminal write has happened.
    pub fn is_finished(&self) -> bool {
        self.body.is_some()
    }

    /// Returns the body written by the terminal write, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Converts into the response the transport writes, or `None` if it was never terminated.
    pub fn into_http(self) -> Option<http::Response<Bytes>> {
        let body = self.body?;
        let (parts, ()) = self.head.into_parts();
        Some(http::Response::from_parts(parts, body))
    }

    fn fail_serialization(&mut self, e: &serde_json::Error) {
        error!(cause = %e, "can't serialize response payload, answering 500");
        self.status(StatusCode::INTERNAL_SERVER_ERROR);
        self.head.headers_mut().remove(CONTENT_TYPE);
        self.end(Bytes::new());
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// The JSON body of error responses produced by the framework itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody<'a> {
    status_code: u16,
    message: &'a str,
    error: &'a str,
}

/// Terminates `res` with `status` and a structured JSON error body.
pub(crate) fn write_error(res: &mut Response, status: StatusCode, message: &str) {
    let body = ErrorBody {
        status_code: status.as_u16(),
        message,
        error: status.canonical_reason().unwrap_or("Error"),
    };
    res.status(status).json(&body);
}
