//! Per-method route table.
//!
//! Routes are kept in one bucket per HTTP method, in registration order. Lookup searches only
//! the request method's bucket and returns the first pattern that matches; there is no
//! literal-over-parameter precedence, so `/a/:id` registered before `/a/b` shadows it.

pub mod pattern;

use std::collections::HashMap;
use std::fmt;

use http::Method;
use tracing::debug;

use crate::handler::Handler;
use crate::request::PathParams;
pub use pattern::RoutePattern;

/// Maps (method, pattern) to handlers.
#[derive(Default)]
pub struct Router {
    buckets: HashMap<Method, Vec<Route>>,
}

struct Route {
    pattern: RoutePattern,
    handler: Box<dyn Handler>,
}

/// A successful lookup: the handler to invoke and the parameters its pattern bound.
pub struct RouteMatch<'router> {
    pattern: &'router RoutePattern,
    handler: &'router dyn Handler,
    params: PathParams,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// Registering the same pattern string again for the same method replaces the earlier
    /// handler but keeps its position in lookup order.
    pub fn register<H>(&mut self, method: Method, pattern: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        let pattern = RoutePattern::parse(pattern);
        let handler: Box<dyn Handler> = Box::new(handler);
        let routes = self.buckets.entry(method.clone()).or_default();

        match routes.iter_mut().find(|route| route.pattern == pattern) {
            Some(route) => {
                debug!(%method, pattern = pattern.as_str(), "replacing previously registered handler");
                route.handler = handler;
            }
            None => routes.push(Route { pattern, handler }),
        }
    }

    /// Finds the first route registered for `method` whose pattern matches `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.buckets.get(method)?.iter().find_map(|route| {
            route.pattern.captures(path).map(|params| RouteMatch {
                pattern: &route.pattern,
                handler: route.handler.as_ref(),
                params,
            })
        })
    }

    /// Returns the patterns registered for `method`, in lookup order.
    pub fn patterns(&self, method: &Method) -> impl Iterator<Item = &str> {
        self.buckets.get(method).into_iter().flatten().map(|route| route.pattern.as_str())
    }

    /// Returns the number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (method, routes) in &self.buckets {
            map.entry(method, &routes.iter().map(|route| route.pattern.as_str()).collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl<'router> RouteMatch<'router> {
    pub fn pattern(&self) -> &'router RoutePattern {
        self.pattern
    }

    pub fn handler(&self) -> &'router dyn Handler {
        self.handler
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_parts(self) -> (&'router dyn Handler, PathParams) {
        (self.handler, self.params)
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch").field("pattern", &self.pattern.as_str()).field("params", &self.params).finish()
    }
}
