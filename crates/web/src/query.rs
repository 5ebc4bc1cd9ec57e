//! Query string parsing.
//!
//! [`parse_query`] turns the text after the first `?` of a request target into
//! [`QueryParams`]. Pairs are separated by `&` and split on their first `=`; keys and values
//! are percent-decoded independently. Only `%XX` escapes are decoded, a `+` stays a `+`.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

/// Decoded query parameters of one request.
///
/// A key written without `=` (as in `?flag`) is present with an absent value. When a key
/// appears more than once the last occurrence wins. Serializes as a JSON object, absent values
/// become `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams {
    inner: HashMap<String, Option<String>>,
}

impl QueryParams {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the decoded value of `key`, or `None` when the key is missing or has no value.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.inner.get(key.as_ref()).and_then(Option::as_deref)
    }

    /// Returns true if `key` was present in the query string, with or without a value.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.inner.iter().map(|(key, value)| (key.as_str(), value.as_deref()))
    }
}

/// Parses a raw query string (without the leading `?`).
///
/// # Example
/// ```
/// use relay_web::query::parse_query;
///
/// let query = parse_query("name=J%C3%BCrgen&city=S%C3%A3o%20Paulo&flag");
/// assert_eq!(query.get("name"), Some("Jürgen"));
/// assert_eq!(query.get("city"), Some("São Paulo"));
/// assert!(query.contains_key("flag"));
/// assert_eq!(query.get("flag"), None);
/// ```
pub fn parse_query(query: &str) -> QueryParams {
    let mut params = QueryParams::empty();
    if query.is_empty() {
        return params;
    }

    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (pair, None),
        };
        params.inner.insert(decode_component(key), value.map(decode_component));
    }

    params
}

fn decode_component(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!(component = raw, cause = %e, "decoded query component is not utf-8, keeping it raw");
            raw.to_owned()
        }
    }
}
