use bytes::Bytes;
use http::Request;

/// An item produced by the request decoder.
///
/// Bodies are buffered whole: the decoder only yields [`Message::Request`] once every
/// `Content-Length` byte has arrived, so handlers never observe a partial body.
#[derive(Debug)]
pub enum Message {
    /// The header announced `Expect: 100-continue` and its body has not been read yet.
    ///
    /// The connection should answer with an interim `100 Continue` before polling again.
    ExpectContinue,
    /// A complete request with its buffered body.
    Request(Request<Bytes>),
}

impl Message {
    /// Converts the message into the request it carries, if any.
    pub fn into_request(self) -> Option<Request<Bytes>> {
        match self {
            Message::ExpectContinue => None,
            Message::Request(request) => Some(request),
        }
    }
}
