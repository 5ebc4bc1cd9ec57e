//! The request as middleware and handlers see it.
//!
//! A [`Request`] owns the parsed head of an HTTP request and its buffered body, plus the state
//! dispatch attaches to it on the way through:
//! - `query`: decoded query parameters, set right before routing
//! - `params`: path parameters bound by the route that matched
//! - `body`: a parsed body, usually set by the [`json`](crate::middleware::json) body parser

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri, Version};
use relay_http::protocol::RequestHeader;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::query::QueryParams;

/// An incoming request flowing through the middleware chain and into a handler.
#[derive(Debug)]
pub struct Request {
    header: RequestHeader,
    raw_body: Bytes,
    params: PathParams,
    query: QueryParams,
    body: Option<Value>,
}

impl Request {
    pub fn new(header: RequestHeader, raw_body: Bytes) -> Self {
        Self { header, raw_body, params: PathParams::empty(), query: QueryParams::empty(), body: None }
    }

    /// Returns the parsed request head.
    pub fn request_header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn method(&self) -> &Method {
        self.header.method()
    }

    /// Returns the request target as received, query included.
    pub fn uri(&self) -> &Uri {
        self.header.uri()
    }

    /// Returns the path of the request target without its query string.
    ///
    /// Routing and path-scoped middleware both compare against this value.
    pub fn path(&self) -> &str {
        self.uri().path()
    }

    pub fn version(&self) -> Version {
        self.header.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    /// Typed storage middleware can use to hand values to later middleware and handlers.
    pub fn extensions(&self) -> &Extensions {
        self.header.as_ref().extensions()
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.header.as_mut().extensions_mut()
    }

    /// Returns the body bytes exactly as they were received.
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Returns the path parameters bound by the matched route.
    ///
    /// Empty until routing has matched, and always empty inside middleware.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Returns the decoded query parameters.
    ///
    /// Empty until dispatch reaches routing; middleware sees an empty set.
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the parsed body, if a body parser has set one.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Deserializes the parsed body into `T`.
    ///
    /// Falls back to parsing the raw bytes as JSON when no body parser ran.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.body {
            Some(body) => T::deserialize(body),
            None => serde_json::from_slice(&self.raw_body),
        }
    }

    /// Deserializes the query string into `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_qs::Error> {
        serde_qs::from_str(self.uri().query().unwrap_or_default())
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    pub(crate) fn set_query(&mut self, query: QueryParams) {
        self.query = query;
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(RequestHeader::from(parts), body)
    }
}

/// Named values captured from the request path by a `:name` pattern segment.
///
/// Values are the raw path segments; they are not percent-decoded. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        self.inner.get(name.as_ref()).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(name.into(), value.into());
    }
}
