use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{HeaderValue, Method, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, warn};

use crate::codec::{HeadOnly, RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, Message, ParseError, RequestHeader, SendError};

const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// An HTTP connection that feeds complete requests to a [`Handler`] and writes its responses
///
/// Requests are served one at a time in arrival order. The connection stays open while the
/// client keeps it alive, and closes after answering a request that asked to close.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::ExpectContinue)) => {
                    self.send_continue().await?;
                }

                Some(Ok(Message::Request(request))) => {
                    let (parts, body) = request.into_parts();
                    let header = RequestHeader::from(parts);
                    let keep_alive = header.is_keep_alive();
                    let head_only = *header.method() == Method::HEAD;

                    let Some(response) = handler.call(header.body(body)).await else {
                        self.park().await;
                        return Ok(());
                    };

                    self.do_send_response(response, keep_alive, head_only).await?;
                    if !keep_alive {
                        info!("client asked to close, connection shutdown");
                        return Ok(());
                    }
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    self.do_send_response(build_error_response(error_status(&e)), false, false).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    async fn send_continue(&mut self) -> Result<(), HttpError> {
        let writer = self.framed_write.get_mut();
        writer.write_all(CONTINUE_RESPONSE).await.map_err(SendError::io)?;
        writer.flush().await.map_err(SendError::io)?;
        info!("receive expect request header, sent continue response");
        Ok(())
    }

    async fn do_send_response(
        &mut self,
        mut response: Response<Bytes>,
        keep_alive: bool,
        head_only: bool,
    ) -> Result<(), HttpError> {
        if !keep_alive {
            response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
        }
        if head_only {
            self.framed_write.send(HeadOnly(response)).await?;
        } else {
            self.framed_write.send(response).await?;
        }
        Ok(())
    }

    /// Holds a connection whose request was never answered until the peer goes away.
    async fn park(&mut self) {
        warn!("response was never terminated, holding the connection until the peer closes it");
        while let Some(item) = self.framed_read.next().await {
            if let Err(e) = item {
                warn!(cause = %e, "parked connection received an invalid request");
                return;
            }
        }
    }
}

fn error_status(e: &ParseError) -> StatusCode {
    match e {
        ParseError::TooLargeBody { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status_code;
    response
}
