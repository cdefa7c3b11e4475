//! Byte streams flowing through the pipeline

use crate::error::{S3Error, StdError};

use std::fmt;
use std::ops::DerefMut;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

pub trait ByteStream: Stream {
    fn remaining_length(&self) -> RemainingLength {
        RemainingLength::unknown()
    }
}

impl<P> ByteStream for Pin<P>
where
    P: DerefMut + Unpin,
    P::Target: ByteStream,
{
    fn remaining_length(&self) -> RemainingLength {
        (**self).remaining_length()
    }
}

pub type DynByteStream = Pin<Box<dyn ByteStream<Item = Result<Bytes, StdError>> + Send + Sync + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingLength {
    lower: usize,
    upper: Option<usize>,
}

impl RemainingLength {
    /// Creates a new `RemainingLength` with the given lower and upper bounds.
    ///
    /// # Panics
    /// This function asserts that `lower <= upper`.
    #[must_use]
    pub fn new(lower: usize, upper: Option<usize>) -> Self {
        if let Some(upper) = upper {
            assert!(lower <= upper);
        }
        Self { lower, upper }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self { lower: 0, upper: None }
    }

    #[must_use]
    pub fn new_exact(n: usize) -> Self {
        Self {
            lower: n,
            upper: Some(n),
        }
    }

    #[must_use]
    pub fn exact(&self) -> Option<usize> {
        self.upper.filter(|&upper| upper == self.lower)
    }

    #[must_use]
    pub fn size_hint(&self) -> http_body::SizeHint {
        let mut sz = http_body::SizeHint::new();
        sz.set_lower(self.lower as u64);
        if let Some(upper) = self.upper {
            sz.set_upper(upper as u64);
        }
        sz
    }
}

impl fmt::Display for RemainingLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) if upper == self.lower => write!(f, "{upper}"),
            Some(upper) => write!(f, "{}..={}", self.lower, upper),
            None => write!(f, "{}..", self.lower),
        }
    }
}

pin_project_lite::pin_project! {
    /// Boxes the errors of an inner stream as [`S3Error`]s.
    pub(crate) struct S3ErrorStream<S> {
        #[pin]
        inner: S,
    }
}

impl<S, E> Stream for S3ErrorStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<S3Error>,
{
    type Item = Result<Bytes, StdError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        this.inner
            .poll_next(cx)
            .map(|item| item.map(|ret| ret.map_err(|e| Box::new(e.into()) as StdError)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S, E> ByteStream for S3ErrorStream<S>
where
    S: ByteStream<Item = Result<Bytes, E>>,
    E: Into<S3Error>,
{
    fn remaining_length(&self) -> RemainingLength {
        self.inner.remaining_length()
    }
}

/// Erases a verifying stream whose errors map onto S3 error codes.
///
/// The errors come out as boxed [`S3Error`]s and can be recovered with [`S3Error::from_body_error`].
pub fn into_dyn<S, E>(s: S) -> DynByteStream
where
    S: ByteStream<Item = Result<Bytes, E>> + Send + Sync + 'static,
    E: Into<S3Error> + 'static,
{
    Box::pin(S3ErrorStream { inner: s })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::S3ErrorCode;

    use futures::StreamExt;

    struct Chunks(futures::stream::Iter<std::vec::IntoIter<Result<Bytes, S3Error>>>);

    impl Stream for Chunks {
        type Item = Result<Bytes, S3Error>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Pin::new(&mut self.0).poll_next(cx)
        }
    }

    impl ByteStream for Chunks {
        fn remaining_length(&self) -> RemainingLength {
            RemainingLength::new_exact(3)
        }
    }

    #[tokio::test]
    async fn errors_are_boxed_s3_errors() {
        let items = vec![Ok(Bytes::from_static(b"abc")), Err(s3_error!(BadDigest))];
        let mut s = into_dyn(Chunks(futures::stream::iter(items)));

        assert_eq!(s.remaining_length().exact(), Some(3));
        assert_eq!(s.next().await.unwrap().unwrap(), "abc");

        let err = s.next().await.unwrap().unwrap_err();
        assert_eq!(S3Error::from_body_error(err).code(), S3ErrorCode::BadDigest);
    }

    #[test]
    fn remaining_length_display() {
        assert_eq!(RemainingLength::new_exact(5).to_string(), "5");
        assert_eq!(RemainingLength::new(1, Some(4)).to_string(), "1..=4");
        assert_eq!(RemainingLength::unknown().to_string(), "0..");
        assert_eq!(RemainingLength::new(1, Some(4)).exact(), None);
    }
}
