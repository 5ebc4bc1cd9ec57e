//! Per-request dispatch.
//!
//! Every request walks the same states:
//!
//! ```text
//! Idle -> RunningMiddleware -> Routing -> Handling -> Terminal
//!                                     \-> NotFound -> Terminal
//! ```
//!
//! A middleware unit that never continues leaves dispatch in `RunningMiddleware`, reported as
//! [`Outcome::Halted`].

use http::StatusCode;
use tracing::{debug, trace};

use crate::middleware::MiddlewareChain;
use crate::query::parse_query;
use crate::response::write_error;
use crate::router::Router;
use crate::{Request, Response};

/// The terminal state a request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A route matched and its handler ran.
    Handled,
    /// No route matched; a `404` was written unless the response was already terminated.
    NotFound,
    /// A middleware unit did not continue; routing never happened.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    RunningMiddleware,
    Routing,
    Handling,
    NotFound,
    Terminal,
}

struct Dispatch {
    state: State,
}

impl Dispatch {
    fn new() -> Self {
        Self { state: State::Idle }
    }

    fn transition(&mut self, to: State) {
        trace!(from = ?self.state, ?to, "dispatch state");
        self.state = to;
    }
}

pub(crate) fn dispatch(chain: &MiddlewareChain, router: &Router, req: &mut Request, res: &mut Response) -> Outcome {
    let mut dispatch = Dispatch::new();
    dispatch.transition(State::RunningMiddleware);

    chain.execute(req, res, &mut |req: &mut Request, res: &mut Response| {
        dispatch.transition(State::Routing);

        let query = parse_query(req.uri().query().unwrap_or_default());
        req.set_query(query);

        match router.lookup(req.method(), req.path()) {
            Some(route) => {
                dispatch.transition(State::Handling);
                let (handler, params) = route.into_parts();
                req.set_params(params);
                handler.call(req, res);
            }
            None => {
                dispatch.transition(State::NotFound);
                not_found(req, res);
            }
        }
    });

    let outcome = match dispatch.state {
        State::Handling => Outcome::Handled,
        State::NotFound => Outcome::NotFound,
        _ => {
            debug!(method = %req.method(), path = req.path(), "middleware chain halted before routing");
            return Outcome::Halted;
        }
    };

    dispatch.transition(State::Terminal);
    outcome
}

fn not_found(req: &Request, res: &mut Response) {
    if res.is_finished() {
        debug!(method = %req.method(), uri = %req.uri(), status = %res.status_code(), "no route matched, keeping the response already written");
        return;
    }
    debug!(method = %req.method(), uri = %req.uri(), "no route matched");
    let message = format!("Cannot {} {}", req.method(), req.uri());
    write_error(res, StatusCode::NOT_FOUND, &message);
}
