use crate::error::StdError;
use crate::stream::{ByteStream, DynByteStream, RemainingLength};

use std::fmt;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body::{Frame, SizeHint};
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use hyper::body::Incoming;
use sync_wrapper::SyncWrapper;

/// The body type of requests flowing through the pipeline
#[derive(Default)]
pub struct Body {
    kind: Kind,
}

#[derive(Default)]
enum Kind {
    #[default]
    Empty,
    Once(Bytes),
    Hyper(Incoming),
    BoxBody(SyncWrapper<UnsyncBoxBody<Bytes, StdError>>),
    DynStream(DynByteStream),
}

#[derive(Debug, thiserror::Error)]
#[error("body size exceeds the limit of {limit} bytes")]
pub struct BodySizeLimitExceeded {
    limit: usize,
}

impl Body {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps any `http_body::Body`, which does not need to be `Sync`.
    pub fn http_body_unsync<B>(body: B) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let inner = body.map_err(|e| Box::new(e) as StdError).boxed_unsync();
        Self {
            kind: Kind::BoxBody(SyncWrapper::new(inner)),
        }
    }

    /// Returns the whole body if it is already in memory.
    #[must_use]
    pub fn bytes(&self) -> Option<Bytes> {
        match &self.kind {
            Kind::Empty => Some(Bytes::new()),
            Kind::Once(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Reads the whole body into memory, failing once more than `limit` bytes arrive.
    ///
    /// The body keeps the bytes and can be read again afterwards.
    pub async fn store_all_limited(&mut self, limit: usize) -> Result<Bytes, StdError> {
        if let Some(bytes) = self.bytes() {
            if bytes.len() > limit {
                return Err(Box::new(BodySizeLimitExceeded { limit }));
            }
            return Ok(bytes);
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(bytes) = self.next().await {
            let bytes = bytes?;
            if buf.len().saturating_add(bytes.len()) > limit {
                return Err(Box::new(BodySizeLimitExceeded { limit }));
            }
            buf.extend_from_slice(&bytes);
        }

        let bytes = Bytes::from(buf);
        self.kind = Kind::Once(bytes.clone());
        Ok(bytes)
    }

    /// Converts the body into a type-erased byte stream.
    #[must_use]
    pub fn into_stream(self) -> DynByteStream {
        match self.kind {
            Kind::DynStream(inner) => inner,
            _ => Box::pin(self),
        }
    }

    fn poll_frame_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, StdError>>> {
        match &mut self.kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Once(bytes) => {
                if bytes.is_empty() {
                    return Poll::Ready(None);
                }
                let bytes = mem::take(bytes);
                Poll::Ready(Some(Ok(Frame::data(bytes))))
            }
            Kind::Hyper(body) => http_body::Body::poll_frame(Pin::new(body), cx)
                .map(|opt| opt.map(|ret| ret.map_err(|e| Box::new(e) as StdError))),
            Kind::BoxBody(body) => http_body::Body::poll_frame(Pin::new(body.get_mut()), cx),
            Kind::DynStream(stream) => stream
                .as_mut()
                .poll_next(cx)
                .map(|opt| opt.map(|ret| ret.map(Frame::data))),
        }
    }
}

impl http_body::Body for Body {
    type Data = Bytes;
    type Error = StdError;

    fn poll_frame(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.poll_frame_inner(cx)
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Once(bytes) => bytes.is_empty(),
            Kind::Hyper(body) => http_body::Body::is_end_stream(body),
            Kind::BoxBody(_) => false,
            Kind::DynStream(stream) => stream.remaining_length().exact() == Some(0),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Empty => SizeHint::with_exact(0),
            Kind::Once(bytes) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Hyper(body) => http_body::Body::size_hint(body),
            Kind::BoxBody(_) => SizeHint::default(),
            Kind::DynStream(stream) => stream.remaining_length().size_hint(),
        }
    }
}

impl Stream for Body {
    type Item = Result<Bytes, StdError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let frame = match futures::ready!(self.poll_frame_inner(cx)) {
                None => return Poll::Ready(None),
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                Some(Ok(frame)) => frame,
            };
            // trailers are not part of the payload
            if let Ok(data) = frame.into_data() {
                return Poll::Ready(Some(Ok(data)));
            }
        }
    }
}

impl ByteStream for Body {
    fn remaining_length(&self) -> RemainingLength {
        let hint = http_body::Body::size_hint(self);
        let lower = usize::try_from(hint.lower()).unwrap_or(usize::MAX);
        let upper = hint.upper().map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        RemainingLength::new(lower, upper.map(|n| n.max(lower)))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self { kind: Kind::Once(bytes) }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl From<Incoming> for Body {
    fn from(body: Incoming) -> Self {
        Self { kind: Kind::Hyper(body) }
    }
}

impl From<DynByteStream> for Body {
    fn from(stream: DynByteStream) -> Self {
        Self {
            kind: Kind::DynStream(stream),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Body");
        match &self.kind {
            Kind::Empty => {}
            Kind::Once(bytes) => {
                d.field("once", bytes);
            }
            Kind::Hyper(body) => {
                d.field("hyper", body);
            }
            Kind::BoxBody(_) => {
                d.field("body", &"{..}");
            }
            Kind::DynStream(stream) => {
                d.field("dyn_stream", &stream.remaining_length());
            }
        }
        d.finish()
    }
}
