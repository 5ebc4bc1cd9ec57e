//! The middleware chain.
//!
//! Middleware runs strictly in registration order before routing. Each unit receives the
//! request, the response and a [`Next`] continuation; the chain only advances when the unit
//! calls [`Next::run`]. A unit that returns without calling it halts dispatch, so the request
//! is answered only if that unit wrote a response.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use relay_web::middleware::{Next, middleware_fn};
//! use relay_web::{App, Outcome, Request, Response};
//!
//! let mut app = App::new();
//! app.use_middleware(middleware_fn(|req: &mut Request, res: &mut Response, next: Next<'_>| {
//!     if req.headers().contains_key("x-api-key") {
//!         next.run(req, res);
//!     } else {
//!         res.status(StatusCode::UNAUTHORIZED).send("missing api key");
//!     }
//! }));
//!
//! let mut req: Request = http::Request::new(bytes::Bytes::new()).into();
//! let mut res = Response::new();
//! assert_eq!(app.handle(&mut req, &mut res), Outcome::Halted);
//! assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
//! ```

pub mod json;

use std::fmt;

use tracing::{error, trace};

use crate::{Request, Response};
pub use json::{JsonBodyParser, json};

/// A unit of the middleware chain.
///
/// Any `Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync` closure is middleware.
pub trait Middleware: Send + Sync {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>);
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) {
        (self)(req, res, next)
    }
}

/// Pins a closure to the middleware signature.
pub fn middleware_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync,
{
    f
}

/// The rest of the chain, as seen by one middleware unit.
///
/// Calling [`Next::run`] consumes the continuation, so a unit can advance the chain at most
/// once. Dropping it without running halts dispatch.
pub struct Next<'a> {
    entries: &'a [Entry],
    cursor: usize,
    on_complete: &'a mut dyn FnMut(&mut Request, &mut Response),
}

impl Next<'_> {
    /// Runs the remaining middleware, then routing once the last unit continues.
    pub fn run(self, req: &mut Request, res: &mut Response) {
        let Next { entries, cursor, on_complete } = self;

        let Some(entry) = entries.get(cursor) else {
            trace!(units = entries.len(), "middleware chain completed");
            on_complete(req, res);
            return;
        };

        let next = Next { entries, cursor: cursor + 1, on_complete };
        entry.invoke(cursor, req, res, next);
    }

    /// Returns how many units are left after the current one.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("cursor", &self.cursor).field("remaining", &self.remaining()).finish()
    }
}

enum Entry {
    Global(Box<dyn Middleware>),
    Scoped { path: String, middleware: Box<dyn Middleware> },
    /// A registration that never produced a runnable unit.
    Faulty { reason: String },
}

impl Entry {
    fn invoke(&self, position: usize, req: &mut Request, res: &mut Response, next: Next<'_>) {
        match self {
            Entry::Global(middleware) => middleware.handle(req, res, next),
            Entry::Scoped { path, middleware } if req.path() == path => middleware.handle(req, res, next),
            Entry::Scoped { .. } => next.run(req, res),
            Entry::Faulty { reason } => {
                error!(position, reason = reason.as_str(), "middleware is not invocable, skipping it");
                next.run(req, res)
            }
        }
    }
}

/// The ordered middleware list of an app.
#[derive(Default)]
pub struct MiddlewareChain {
    entries: Vec<Entry>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit that runs for every request.
    pub fn push<M: Middleware + 'static>(&mut self, middleware: M) {
        self.entries.push(Entry::Global(Box::new(middleware)));
    }

    /// Appends a unit that runs only when the request path is exactly `path`.
    pub fn push_scoped<M: Middleware + 'static>(&mut self, path: impl Into<String>, middleware: M) {
        self.entries.push(Entry::Scoped { path: path.into(), middleware: Box::new(middleware) });
    }

    /// Appends a placeholder for a registration that failed; it is reported and skipped
    /// every time the chain passes over it.
    pub fn push_faulty(&mut self, reason: impl Into<String>) {
        self.entries.push(Entry::Faulty { reason: reason.into() });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the chain over one request.
    ///
    /// `on_complete` runs exactly once if every unit continues (immediately for an empty chain),
    /// and never if a unit halts.
    pub fn execute(&self, req: &mut Request, res: &mut Response, on_complete: &mut dyn FnMut(&mut Request, &mut Response)) {
        Next { entries: &self.entries, cursor: 0, on_complete }.run(req, res)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain").field("len", &self.entries.len()).finish()
    }
}
