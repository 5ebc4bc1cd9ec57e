//! A small demo app.
//!
//! ```text
//! curl -v 'http://127.0.0.1:3000/7?x=1'
//! curl -v -H 'Content-Type: application/json' -d '{"name":"relay"}' http://127.0.0.1:3000/
//! curl -v -X PUT http://127.0.0.1:3000/
//! curl -v -X DELETE http://127.0.0.1:3000/
//! ```

use http::StatusCode;
use relay_web::middleware::json;
use relay_web::{App, Request, Response};
use serde_json::json;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut app = App::new();
    app.use_middleware(json())
        .get("/:id", show)
        .post("/", |req: &Request, res: &mut Response| {
            info!(body = ?req.body(), "received body");
            res.send("hello");
        })
        .put("/", |_req: &Request, res: &mut Response| {
            res.status(StatusCode::OK).json(&json!({"message": "User updated successfully"}));
        })
        .delete("/", |_req: &Request, res: &mut Response| {
            res.status(StatusCode::OK).json(&json!({"message": "User deleted successfully"}));
        });

    if let Err(e) = app.listen("127.0.0.1:3000", |addr| info!(%addr, "listening")).await {
        error!(cause = %e, "server stopped");
    }
}

fn show(req: &Request, res: &mut Response) {
    info!(headers = ?req.headers(), "received request");
    res.status(StatusCode::INTERNAL_SERVER_ERROR).json(&json!({
        "params": req.params(),
        "query": req.query(),
        "message": "hello",
    }));
}
