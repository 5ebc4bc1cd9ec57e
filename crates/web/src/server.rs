//! TCP serving for an [`App`].
//!
//! [`Server`] binds a listener, spawns one task per accepted connection and lets the
//! transport feed each request to the app. The app is frozen behind an `Arc` and shared by
//! every connection task.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use relay_http::connection::HttpConnection;
use relay_http::handler::Handler as ConnectionHandler;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, trace, warn};

use crate::{App, Request, Response};

#[derive(Debug)]
pub struct ServerBuilder {
    app: Option<App>,
    address: Option<io::Result<Vec<SocketAddr>>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { app: None, address: None }
    }

    /// Sets the address to listen on. Resolution errors surface from [`ServerBuilder::build`].
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn app(mut self, app: App) -> Self {
        self.app = Some(app);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let app = self.app.ok_or(ServerBuildError::MissingApp)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::invalid_address)?;
        Ok(Server { app: Arc::new(app), address })
    }
}

#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    address: Vec<SocketAddr>,
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("app must be set")]
    MissingApp,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
}

impl ServerBuildError {
    fn invalid_address(source: io::Error) -> Self {
        Self::InvalidAddress { source }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Build(#[from] ServerBuildError),
    #[error("bind server error: {source}")]
    Bind { source: io::Error },
    #[error("can't read bound address: {source}")]
    LocalAddress { source: io::Error },
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the listener, reports the bound address to `on_bound`, then serves forever.
    ///
    /// Returns only if binding fails.
    pub async fn start<F>(self, on_bound: F) -> Result<(), ServerError>
    where
        F: FnOnce(SocketAddr),
    {
        info!("start listening at {:?}", self.address);
        let tcp_listener =
            TcpListener::bind(self.address.as_slice()).await.map_err(|source| ServerError::Bind { source })?;
        let local_addr = tcp_listener.local_addr().map_err(|source| ServerError::LocalAddress { source })?;

        on_bound(local_addr);
        self.serve(tcp_listener).await;
        Ok(())
    }

    async fn serve(self, tcp_listener: TcpListener) {
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let app = self.app.clone();
            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                match HttpConnection::new(reader, writer).process(app).await {
                    Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, "service has error, cause {}, connection shutdown", e),
                }
            });
        }
    }
}

#[async_trait]
impl ConnectionHandler for App {
    async fn call(&self, req: http::Request<Bytes>) -> Option<http::Response<Bytes>> {
        let mut request = Request::from(req);
        let mut response = Response::new();

        let outcome = self.handle(&mut request, &mut response);
        trace!(?outcome, status = %response.status_code(), "request dispatched");
        response.into_http()
    }
}
