//! Content integrity checks
//!
//! [`IntegrityStream`] hashes a body while it streams downstream and
//! compares the digests declared by the client once the body ends.
//! Nothing is buffered: a mismatch surfaces as the final item of the stream.

use crate::crypto::{Checksum, Md5, Sha256, constant_time_eq};
use crate::error::{S3Error, S3Result, StdError};
use crate::stream::{ByteStream, RemainingLength};

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use futures::ready;
use tracing::debug;

/// Parses a `Content-MD5` header value.
///
/// # Errors
/// Returns `InvalidDigest` unless the value is base64 of exactly 16 bytes.
pub fn parse_content_md5(value: &str) -> S3Result<[u8; 16]> {
    let Ok(bytes) = base64_simd::STANDARD.decode_to_vec(value) else {
        return Err(s3_error!(InvalidDigest, "Content-MD5 is not valid base64"));
    };
    <[u8; 16]>::try_from(bytes.as_slice()).map_err(|_| s3_error!(InvalidDigest, "Content-MD5 must be 16 bytes"))
}

/// Parses a declared payload SHA-256 in hex.
///
/// # Errors
/// Returns `XAmzContentSHA256Mismatch` unless the value is 64 hex digits.
pub fn parse_content_sha256(value: &str) -> S3Result<[u8; 32]> {
    let bytes = hex_simd::decode_to_vec(value.as_bytes()).map_err(|_| s3_error!(XAmzContentSHA256Mismatch))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| s3_error!(XAmzContentSHA256Mismatch))
}

/// Expectations a body must meet
#[derive(Debug, Default, Clone)]
pub struct ContentChecks {
    pub md5: Option<[u8; 16]>,
    pub sha256: Option<[u8; 32]>,
    /// Exact length, from `Content-Length` or `x-amz-decoded-content-length`
    pub length: Option<u64>,
    /// Inclusive bounds, from a POST policy `content-length-range`
    pub length_range: Option<(u64, u64)>,
}

impl ContentChecks {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.md5.is_none() && self.sha256.is_none() && self.length.is_none() && self.length_range.is_none()
    }
}

pin_project_lite::pin_project! {
    /// A body wrapper that enforces [`ContentChecks`]
    pub struct IntegrityStream<S> {
        #[pin]
        inner: S,
        md5: Option<(Md5, [u8; 16])>,
        sha256: Option<(Sha256, [u8; 32])>,
        length: Option<u64>,
        length_range: Option<(u64, u64)>,
        consumed: u64,
        done: bool,
    }
}

impl<S> IntegrityStream<S> {
    pub fn new(inner: S, checks: ContentChecks) -> Self {
        Self {
            inner,
            md5: checks.md5.map(|expected| (Md5::new(), expected)),
            sha256: checks.sha256.map(|expected| (Sha256::new(), expected)),
            length: checks.length,
            length_range: checks.length_range,
            consumed: 0,
            done: false,
        }
    }
}

fn check_chunk(consumed: u64, length: Option<u64>, length_range: Option<(u64, u64)>) -> S3Result {
    if let Some(expected) = length {
        if consumed > expected {
            return Err(s3_error!(IncompleteBody, "the body is longer than the declared {expected} bytes"));
        }
    }
    if let Some((_, max)) = length_range {
        if consumed > max {
            return Err(s3_error!(EntityTooLarge, "the body exceeds the maximum of {max} bytes"));
        }
    }
    Ok(())
}

impl<S> IntegrityStream<S> {
    fn finish(self: Pin<&mut Self>) -> S3Result {
        let this = self.project();
        let consumed = *this.consumed;

        if let Some(expected) = *this.length {
            if consumed != expected {
                return Err(s3_error!(
                    IncompleteBody,
                    "received {consumed} bytes, expected {expected} bytes"
                ));
            }
        }
        if let Some((min, _)) = *this.length_range {
            if consumed < min {
                return Err(s3_error!(EntityTooSmall, "the body is smaller than the minimum of {min} bytes"));
            }
        }
        if let Some((hasher, expected)) = this.md5.take() {
            if !constant_time_eq(&hasher.finalize(), &expected) {
                return Err(s3_error!(BadDigest));
            }
        }
        if let Some((hasher, expected)) = this.sha256.take() {
            if !constant_time_eq(&hasher.finalize(), &expected) {
                return Err(s3_error!(XAmzContentSHA256Mismatch));
            }
        }
        Ok(())
    }
}

impl<S> Stream for IntegrityStream<S>
where
    S: Stream<Item = Result<Bytes, StdError>>,
{
    type Item = Result<Bytes, S3Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let this = self.as_mut().project();
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(bytes)) => {
                *this.consumed = this.consumed.saturating_add(bytes.len() as u64);
                if let Err(e) = check_chunk(*this.consumed, *this.length, *this.length_range) {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                if let Some((hasher, _)) = this.md5 {
                    hasher.update(&bytes);
                }
                if let Some((hasher, _)) = this.sha256 {
                    hasher.update(&bytes);
                }
                Poll::Ready(Some(Ok(bytes)))
            }
            Some(Err(e)) => {
                *this.done = true;
                Poll::Ready(Some(Err(S3Error::from_body_error(e))))
            }
            None => {
                *this.done = true;
                match self.finish() {
                    Ok(()) => Poll::Ready(None),
                    Err(e) => {
                        debug!(code = %e.code(), "body integrity check failed");
                        Poll::Ready(Some(Err(e)))
                    }
                }
            }
        }
    }
}

impl<S> ByteStream for IntegrityStream<S>
where
    S: ByteStream<Item = Result<Bytes, StdError>>,
{
    fn remaining_length(&self) -> RemainingLength {
        match self.length {
            Some(length) => {
                let remaining = length.saturating_sub(self.consumed);
                RemainingLength::new_exact(usize::try_from(remaining).unwrap_or(usize::MAX))
            }
            None => self.inner.remaining_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::S3ErrorCode;
    use crate::http::Body;

    use futures::StreamExt;

    fn md5_of(data: &[u8]) -> [u8; 16] {
        Md5::checksum(data)
    }

    async fn drain<S>(mut s: IntegrityStream<S>) -> Result<Vec<u8>, S3Error>
    where
        S: Stream<Item = Result<Bytes, StdError>> + Unpin,
    {
        let mut buf = Vec::new();
        while let Some(ret) = s.next().await {
            buf.extend_from_slice(&ret?);
        }
        Ok(buf)
    }

    #[test]
    fn content_md5_header() {
        let digest = parse_content_md5("XrY7u+Ae7tCTyyK7j1rNww==").unwrap();
        assert_eq!(digest, md5_of(b"hello world"));

        assert_eq!(parse_content_md5("???").unwrap_err().code(), S3ErrorCode::InvalidDigest);
        assert_eq!(parse_content_md5("aGVsbG8=").unwrap_err().code(), S3ErrorCode::InvalidDigest);
    }

    #[test]
    fn content_sha256_header() {
        let hex = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
        assert_eq!(parse_content_sha256(hex).unwrap(), Sha256::checksum(b"hello world"));
        assert_eq!(
            parse_content_sha256("UNSIGNED").unwrap_err().code(),
            S3ErrorCode::XAmzContentSHA256Mismatch
        );
    }

    #[tokio::test]
    async fn matching_digests_pass() {
        let checks = ContentChecks {
            md5: Some(md5_of(b"hello world")),
            sha256: Some(Sha256::checksum(b"hello world")),
            length: Some(11),
            length_range: None,
        };
        let s = IntegrityStream::new(Body::from("hello world"), checks);
        assert_eq!(s.remaining_length().exact(), Some(11));
        assert_eq!(drain(s).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn one_flipped_byte() {
        let checks = ContentChecks {
            md5: Some(md5_of(b"hello world")),
            ..Default::default()
        };
        let err = drain(IntegrityStream::new(Body::from("hello worle"), checks)).await.unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::BadDigest);

        let checks = ContentChecks {
            sha256: Some(Sha256::checksum(b"hello world")),
            ..Default::default()
        };
        let err = drain(IntegrityStream::new(Body::from("hello worle"), checks)).await.unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::XAmzContentSHA256Mismatch);
    }

    #[tokio::test]
    async fn length_mismatch() {
        for length in [10, 12] {
            let checks = ContentChecks {
                length: Some(length),
                ..Default::default()
            };
            let err = drain(IntegrityStream::new(Body::from("hello world"), checks)).await.unwrap_err();
            assert_eq!(err.code(), S3ErrorCode::IncompleteBody);
        }
    }

    #[tokio::test]
    async fn length_range() {
        let checks = |min, max| ContentChecks {
            length_range: Some((min, max)),
            ..Default::default()
        };

        let err = drain(IntegrityStream::new(Body::from("hello world"), checks(0, 5))).await.unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::EntityTooLarge);

        let err = drain(IntegrityStream::new(Body::from("hello world"), checks(20, 50))).await.unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::EntityTooSmall);

        assert!(drain(IntegrityStream::new(Body::from("hello world"), checks(11, 11))).await.is_ok());
    }

    #[tokio::test]
    async fn stream_ends_after_error() {
        let checks = ContentChecks {
            length: Some(1),
            ..Default::default()
        };
        let mut s = IntegrityStream::new(Body::from("hello"), checks);
        assert!(s.next().await.unwrap().is_err());
        assert!(s.next().await.is_none());
    }
}
