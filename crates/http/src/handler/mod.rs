//! The seam between the transport and whatever answers requests.
//!
//! A [`Handler`] receives one complete request and returns the response to write. Returning
//! `None` means nothing was ever written for this request: the connection then stays open,
//! unanswered, until the peer hangs up.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: Request<Bytes>) -> Option<Response<Bytes>>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Response<Bytes>>> + Send,
{
    async fn call(&self, req: Request<Bytes>) -> Option<Response<Bytes>> {
        (self.f)(req).await
    }
}

pub fn make_handler<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request<Bytes>) -> Fut,
    Fut: Future<Output = Option<Response<Bytes>>>,
{
    HandlerFn { f }
}
