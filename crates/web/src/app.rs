//! The application: middleware and routes registered during setup, shared read-only while
//! serving.

use std::fmt::{self, Display};
use std::net::{SocketAddr, ToSocketAddrs};

use http::Method;

use crate::dispatch::{Outcome, dispatch};
use crate::handler::Handler;
use crate::middleware::{Middleware, MiddlewareChain};
use crate::router::Router;
use crate::server::{Server, ServerError};
use crate::{Request, Response};

/// An HTTP application.
///
/// Registration takes `&mut self`; once the app is handed to a [`Server`] it is frozen behind
/// an `Arc` and every connection dispatches against the same routes and middleware.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use relay_web::middleware::json;
/// use relay_web::{App, Outcome, Request, Response};
///
/// let mut app = App::new();
/// app.use_middleware(json())
///     .get("/:id", |req: &Request, res: &mut Response| {
///         res.status(StatusCode::OK).json(&serde_json::json!({"params": req.params(), "query": req.query()}));
///     });
///
/// let mut req: Request = http::Request::get("/7?x=1").body(bytes::Bytes::new()).unwrap().into();
/// let mut res = Response::new();
/// assert_eq!(app.handle(&mut req, &mut res), Outcome::Handled);
/// assert_eq!(req.params().get("id"), Some("7"));
/// assert_eq!(req.query().get("x"), Some("1"));
/// ```
#[derive(Default)]
pub struct App {
    router: Router,
    chain: MiddlewareChain,
}

macro_rules! method_registrations {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<H>(&mut self, pattern: impl Into<String>, handler: H) -> &mut Self
            where
                H: Handler + 'static,
            {
                self.route($method, pattern, handler)
            }
        )*
    };
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends middleware that runs for every request.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.chain.push(middleware);
        self
    }

    /// Appends middleware that runs only when the request path is exactly `path`.
    ///
    /// The comparison is on the path without its query string, with no prefix matching.
    pub fn use_at<M: Middleware + 'static>(&mut self, path: impl Into<String>, middleware: M) -> &mut Self {
        self.chain.push_scoped(path, middleware);
        self
    }

    /// Appends middleware produced by a fallible constructor.
    ///
    /// An `Err` still takes a position in the chain; at that position every request logs the
    /// error and moves on to the next unit.
    pub fn try_use<M, E>(&mut self, middleware: Result<M, E>) -> &mut Self
    where
        M: Middleware + 'static,
        E: Display,
    {
        match middleware {
            Ok(middleware) => self.chain.push(middleware),
            Err(e) => self.chain.push_faulty(e.to_string()),
        }
        self
    }

    /// Registers `handler` for `method` requests whose path matches `pattern`.
    pub fn route<H>(&mut self, method: Method, pattern: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.router.register(method, pattern, handler);
        self
    }

    method_registrations! {
        get => Method::GET;
        post => Method::POST;
        put => Method::PUT;
        delete => Method::DELETE;
        patch => Method::PATCH;
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Dispatches one request: middleware, then routing, then the handler or a `404`.
    pub fn handle(&self, req: &mut Request, res: &mut Response) -> Outcome {
        dispatch(&self.chain, &self.router, req, res)
    }

    /// Serves this app on `address`, calling `on_bound` with the bound address once listening.
    ///
    /// Only returns on a setup failure.
    pub async fn listen<A, F>(self, address: A, on_bound: F) -> Result<(), ServerError>
    where
        A: ToSocketAddrs,
        F: FnOnce(SocketAddr),
    {
        Server::builder().app(self).address(address).build()?.start(on_bound).await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").field("router", &self.router).field("middleware", &self.chain).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Next, json, middleware_fn};
    use bytes::Bytes;
    use http::StatusCode;
    use http::header::CONTENT_TYPE;
    use mockall::mock;
    use mockall::predicate::{always, function};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Handler {}

        impl Handler for Handler {
            fn call(&self, req: &Request, res: &mut Response);
        }
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
            .into()
    }

    fn handle(app: &App, method: Method, uri: &str) -> (Outcome, Request, Response) {
        let mut req = request(method, uri, "");
        let mut res = Response::new();
        let outcome = app.handle(&mut req, &mut res);
        (outcome, req, res)
    }

    fn body_json(res: &Response) -> Value {
        serde_json::from_slice(res.body().unwrap()).unwrap()
    }

    fn counting(counter: &Arc<AtomicUsize>, expected_position: usize) -> impl Middleware + use<> {
        let counter = counter.clone();
        middleware_fn(move |req: &mut Request, res: &mut Response, next: Next<'_>| {
            assert_eq!(counter.fetch_add(1, Ordering::SeqCst), expected_position);
            next.run(req, res)
        })
    }

    #[test]
    fn literal_route_invokes_handler_with_empty_params() {
        let mut handler = MockHandler::new();
        handler
            .expect_call()
            .with(function(|req: &Request| req.params().is_empty()), always())
            .times(1)
            .returning(|_req, res| res.send("ok"));

        let mut app = App::new();
        app.get("/health", handler);

        let (outcome, _req, res) = handle(&app, Method::GET, "/health");
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(res.body().unwrap().as_ref(), br#""ok""#);
    }

    #[test]
    fn handler_for_other_method_is_not_invoked() {
        let mut handler = MockHandler::new();
        handler.expect_call().never();

        let mut app = App::new();
        app.post("/health", handler);

        let (outcome, _req, res) = handle(&app, Method::GET, "/health");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_found_body_is_exact() {
        let app = App::new();

        let (outcome, _req, res) = handle(&app, Method::GET, "/nope");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            res.body().unwrap().as_ref(),
            br#"{"statusCode":404,"message":"Cannot GET /nope","error":"Not Found"}"#
        );
    }

    #[test]
    fn not_found_message_keeps_query() {
        let app = App::new();

        let (_outcome, req, res) = handle(&app, Method::DELETE, "/gone?force=1");
        assert_eq!(body_json(&res)["message"], "Cannot DELETE /gone?force=1");
        assert_eq!(req.query().get("force"), Some("1"));
    }

    #[test]
    fn params_and_query_are_bound() {
        let mut app = App::new();
        app.get("/:id", |req: &Request, res: &mut Response| {
            res.status(StatusCode::INTERNAL_SERVER_ERROR).json(&json!({
                "params": req.params(),
                "query": req.query(),
                "message": "hello",
            }));
        });

        let (outcome, req, res) = handle(&app, Method::GET, "/7?x=1");
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(req.params().get("id"), Some("7"));
        assert_eq!(req.query().get("x"), Some("1"));
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&res), json!({"params": {"id": "7"}, "query": {"x": "1"}, "message": "hello"}));
    }

    #[test]
    fn users_pattern_matches_exact_depth_only() {
        let mut app = App::new();
        app.get("/users/:id", |req: &Request, res: &mut Response| res.send(req.params()));

        let (outcome, _req, res) = handle(&app, Method::GET, "/users/42");
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(body_json(&res), json!({"id": "42"}));

        let (outcome, _req, _res) = handle(&app, Method::GET, "/users/42/extra");
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[test]
    fn middleware_runs_in_order_before_routing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen_by_handler = counter.clone();

        let mut app = App::new();
        app.use_middleware(counting(&counter, 0))
            .use_middleware(counting(&counter, 1))
            .use_middleware(counting(&counter, 2))
            .get("/", move |_req: &Request, res: &mut Response| {
                assert_eq!(seen_by_handler.load(Ordering::SeqCst), 3);
                res.send("done");
            });

        let (outcome, _req, _res) = handle(&app, Method::GET, "/");
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn middleware_sees_no_query_or_params() {
        let mut app = App::new();
        app.use_middleware(middleware_fn(|req: &mut Request, res: &mut Response, next: Next<'_>| {
            assert!(req.query().is_empty());
            assert!(req.params().is_empty());
            next.run(req, res)
        }))
        .get("/:id", |_req: &Request, res: &mut Response| res.send("ok"));

        let (outcome, _req, _res) = handle(&app, Method::GET, "/1?a=b");
        assert_eq!(outcome, Outcome::Handled);
    }

    #[test]
    fn scoped_middleware_only_for_its_path() {
        let counter = Arc::new(AtomicUsize::new(0));

        let mut app = App::new();
        app.use_at("/only", counting(&counter, 0));

        let (outcome, _req, _res) = handle(&app, Method::GET, "/other");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let (outcome, _req, _res) = handle(&app, Method::GET, "/only");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn halting_middleware_skips_routing() {
        let mut handler = MockHandler::new();
        handler.expect_call().never();

        let mut app = App::new();
        app.use_middleware(middleware_fn(|_req: &mut Request, res: &mut Response, _next: Next<'_>| {
            res.status(StatusCode::FORBIDDEN).send("denied");
        }))
        .get("/", handler);

        let (outcome, req, res) = handle(&app, Method::GET, "/?q=1");
        assert_eq!(outcome, Outcome::Halted);
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert!(req.query().is_empty());
    }

    #[test]
    fn not_found_keeps_response_written_by_middleware() {
        let mut app = App::new();
        app.use_middleware(middleware_fn(|req: &mut Request, res: &mut Response, next: Next<'_>| {
            res.status(StatusCode::FORBIDDEN).send("denied");
            next.run(req, res)
        }));

        let (outcome, _req, res) = handle(&app, Method::GET, "/x");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(res.body().unwrap().as_ref(), br#""denied""#);
        assert!(res.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn silent_halt_leaves_response_unterminated() {
        let mut app = App::new();
        app.use_middleware(middleware_fn(|_req: &mut Request, _res: &mut Response, _next: Next<'_>| {}));

        let (outcome, _req, res) = handle(&app, Method::GET, "/");
        assert_eq!(outcome, Outcome::Halted);
        assert!(res.into_http().is_none());
    }

    #[test]
    fn failed_middleware_registration_is_skipped() {
        let mut app = App::new();
        app.try_use(Err::<fn(&mut Request, &mut Response, Next<'_>), _>("config missing"))
            .get("/", |_req: &Request, res: &mut Response| res.send("reached"));

        let (outcome, _req, res) = handle(&app, Method::GET, "/");
        assert_eq!(app.middleware().len(), 1);
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(res.body().unwrap().as_ref(), br#""reached""#);
    }

    #[test]
    fn json_body_reaches_handler() {
        let mut app = App::new();
        app.use_middleware(json()).post("/", |req: &Request, res: &mut Response| {
            let body: Value = req.body_as().unwrap();
            res.json(&body["name"]);
        });

        let mut req = request(Method::POST, "/", r#"{"name":"relay"}"#);
        let mut res = Response::new();
        assert_eq!(app.handle(&mut req, &mut res), Outcome::Handled);
        assert_eq!(res.body().unwrap().as_ref(), br#""relay""#);
    }

    #[test]
    fn invalid_json_body_never_reaches_handler() {
        let mut handler = MockHandler::new();
        handler.expect_call().never();

        let mut app = App::new();
        app.use_middleware(json()).post("/", handler);

        let mut req = request(Method::POST, "/", "{oops");
        let mut res = Response::new();
        assert_eq!(app.handle(&mut req, &mut res), Outcome::Halted);
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn patch_and_generic_route_registration() {
        let mut app = App::new();
        app.patch("/item", |_req: &Request, res: &mut Response| res.send("patched"))
            .route(Method::OPTIONS, "/item", |_req: &Request, res: &mut Response| res.send("options"));

        let (_outcome, _req, res) = handle(&app, Method::PATCH, "/item");
        assert_eq!(res.body().unwrap().as_ref(), br#""patched""#);

        let (_outcome, _req, res) = handle(&app, Method::OPTIONS, "/item");
        assert_eq!(res.body().unwrap().as_ref(), br#""options""#);
        assert_eq!(app.router().len(), 2);
    }

    #[test]
    fn apps_are_independent() {
        let mut first = App::new();
        first.get("/", |_req: &Request, res: &mut Response| res.send(&1));
        let second = App::new();

        assert_eq!(handle(&first, Method::GET, "/").0, Outcome::Handled);
        assert_eq!(handle(&second, Method::GET, "/").0, Outcome::NotFound);
    }
}
