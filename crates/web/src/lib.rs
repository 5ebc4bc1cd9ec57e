//! An Express-style dispatch engine on top of `relay-http`.
//!
//! Requests go through an ordered middleware chain, then get routed by method and path
//! pattern (`/users/:id`) to a handler, which writes JSON through the [`Response`] wrapper.
//! Requests that match no route get a structured `404`.
//!
//! ```no_run
//! use http::StatusCode;
//! use relay_web::middleware::json;
//! use relay_web::{App, Request, Response};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = App::new();
//!     app.use_middleware(json())
//!         .get("/users/:id", |req: &Request, res: &mut Response| {
//!             res.status(StatusCode::OK).json(&serde_json::json!({"id": req.params().get("id")}));
//!         })
//!         .post("/", |_req: &Request, res: &mut Response| res.send("hello"));
//!
//!     if let Err(e) = app.listen("127.0.0.1:3000", |addr| println!("listening on {addr}")).await {
//!         eprintln!("server error: {e}");
//!     }
//! }
//! ```

mod app;
mod dispatch;
mod request;
mod response;
mod server;

pub mod handler;
pub mod middleware;
pub mod query;
pub mod router;

pub use app::App;
pub use dispatch::Outcome;
pub use handler::{Handler, handler_fn};
pub use middleware::{Middleware, Next, middleware_fn};
pub use query::QueryParams;
pub use request::{PathParams, Request};
pub use response::Response;
pub use router::Router;
pub use server::{Server, ServerBuildError, ServerBuilder, ServerError};
