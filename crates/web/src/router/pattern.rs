//! Route patterns such as `/users/:id`.
//!
//! A pattern and a path are both split on `/`. They match when they have the same number of
//! segments and every pattern segment either equals the path segment byte for byte or starts
//! with `:`, in which case it binds the path segment to the name after the colon.
//!
//! There are no wildcards, optional segments or regular expressions, and no normalization: a
//! trailing slash, a doubled slash and letter case all count.

use crate::request::PathParams;

const PARAM_MARKER: char = ':';

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn accepts(&self, part: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == part,
            Segment::Param(_) => true,
        }
    }
}

impl RoutePattern {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw
            .split('/')
            .map(|segment| match segment.strip_prefix(PARAM_MARKER) {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(segment.to_owned()),
            })
            .collect();
        Self { raw, segments }
    }

    /// Returns the pattern as it was registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the names of the parameters in this pattern, left to right.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        for segment in &self.segments {
            match parts.next() {
                Some(part) if segment.accepts(part) => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }

    /// Binds each parameter segment to the path segment at the same position.
    ///
    /// Only meaningful for a path this pattern [matches](RoutePattern::matches). When a name
    /// repeats, the rightmost binding wins.
    pub fn extract(&self, path: &str) -> PathParams {
        let mut params = PathParams::empty();
        for (segment, part) in self.segments.iter().zip(path.split('/')) {
            if let Segment::Param(name) = segment {
                params.insert(name.as_str(), part);
            }
        }
        params
    }

    /// Matches and extracts in one step.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        self.matches(path).then(|| self.extract(path))
    }
}

/// Returns true if `path` matches `pattern`.
///
/// ```
/// use relay_web::router::pattern::matches;
///
/// assert!(matches("/users/:id", "/users/42"));
/// assert!(!matches("/users/:id", "/users/42/posts"));
/// assert!(!matches("/users/:id", "/users/"));
/// ```
pub fn matches(pattern: &str, path: &str) -> bool {
    RoutePattern::parse(pattern).matches(path)
}

/// Extracts the parameters `pattern` binds in `path`.
pub fn extract(pattern: &str, path: &str) -> PathParams {
    RoutePattern::parse(pattern).extract(path)
}
