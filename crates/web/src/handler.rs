//! Route handlers.
//!
//! A [`Handler`] is the last stop of dispatch: it sees the fully enriched request (path
//! params, query, parsed body) and is expected to terminate the response. Handlers run
//! synchronously on the connection's task.
//!
//! Any `Fn(&Request, &mut Response) + Send + Sync` closure is a handler. Use [`handler_fn`]
//! when the closure's argument types can't be inferred from the call site.

use crate::{Request, Response};

pub trait Handler: Send + Sync {
    fn call(&self, req: &Request, res: &mut Response);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) + Send + Sync,
{
    fn call(&self, req: &Request, res: &mut Response) {
        (self)(req, res)
    }
}

/// Pins a closure to the handler signature.
///
/// ```
/// use relay_web::handler::handler_fn;
/// use relay_web::App;
///
/// let mut app = App::new();
/// let hello = handler_fn(|_req, res| res.send("hello"));
/// app.get("/", hello);
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Request, &mut Response) + Send + Sync,
{
    f
}
