//! aws-chunked stream
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html>

use crate::auth::SecretKey;
use crate::crypto::constant_time_eq;
use crate::error::{S3Error, StdError};
use crate::sig_v4;
use crate::sig_v4::AmzDate;
use crate::stream::{ByteStream, DynByteStream, RemainingLength};
use crate::utils::SyncBoxFuture;

use std::fmt::{self, Debug};
use std::pin::Pin;
use std::slice;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{Stream, StreamExt};
use memchr::memchr;
use tracing::{debug, trace};
use transform_stream::{AsyncTryStream, Yielder};

const MAX_CHUNK_META_SIZE: usize = 1024;

/// A chunk is buffered whole before its signature is checked.
const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// A chunk-signed body that only yields verified payload bytes
pub struct AwsChunkedStream {
    inner: AsyncTryStream<Bytes, AwsChunkedStreamError, SyncBoxFuture<'static, Result<(), AwsChunkedStreamError>>>,

    remaining_length: usize,
}

impl Debug for AwsChunkedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsChunkedStream")
            .field("remaining_length", &self.remaining_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct SignatureCtx {
    amz_date: AmzDate,
    region: Box<str>,
    service: Box<str>,
    secret_key: SecretKey,

    /// previous chunk's signature
    prev_signature: Box<str>,
}

#[derive(Debug, thiserror::Error)]
pub enum AwsChunkedStreamError {
    #[error("AwsChunkedStreamError: Underlying: {}", .0)]
    Underlying(StdError),
    #[error("AwsChunkedStreamError: SignatureMismatch")]
    SignatureMismatch,
    #[error("AwsChunkedStreamError: FormatError")]
    FormatError,
    #[error("AwsChunkedStreamError: Incomplete")]
    Incomplete,
    #[error("AwsChunkedStreamError: ChunkMetaTooLarge: size {0} exceeds limit {1}")]
    ChunkMetaTooLarge(usize, usize),
    #[error("AwsChunkedStreamError: ChunkTooLarge: size {0} exceeds limit {1}")]
    ChunkTooLarge(usize, usize),
    #[error("AwsChunkedStreamError: LengthMismatch: decoded {actual} bytes, declared {declared} bytes")]
    LengthMismatch { actual: usize, declared: usize },
}

impl From<AwsChunkedStreamError> for S3Error {
    fn from(e: AwsChunkedStreamError) -> Self {
        match e {
            AwsChunkedStreamError::Underlying(e) => S3Error::from_body_error(e),
            AwsChunkedStreamError::SignatureMismatch => s3_error!(e, SignatureDoesNotMatch),
            AwsChunkedStreamError::FormatError
            | AwsChunkedStreamError::ChunkMetaTooLarge(..)
            | AwsChunkedStreamError::ChunkTooLarge(..) => {
                invalid_request!(e, "malformed aws-chunked body")
            }
            AwsChunkedStreamError::Incomplete | AwsChunkedStreamError::LengthMismatch { .. } => s3_error!(e, IncompleteBody),
        }
    }
}

#[derive(Debug)]
struct ChunkMeta<'a> {
    size: usize,
    signature: &'a [u8],
}

/// Parses `{hex-size};chunk-signature={64 hex}` without its line ending
fn parse_chunk_meta(line: &[u8]) -> Option<ChunkMeta<'_>> {
    use nom::Parser;
    use nom::bytes::complete::{tag, take_while_m_n, take_while1};
    use nom::combinator::{all_consuming, map_res};
    use nom::sequence::separated_pair;

    let size = map_res(take_while1(|c: u8| c.is_ascii_hexdigit()), |hex: &[u8]| {
        std::str::from_utf8(hex).ok().and_then(|s| usize::from_str_radix(s, 16).ok()).ok_or(())
    });
    let signature = take_while_m_n(64, 64, |c: u8| c.is_ascii_hexdigit());

    let result: nom::IResult<&[u8], (usize, &[u8])> =
        all_consuming(separated_pair(size, tag(&b";chunk-signature="[..]), signature)).parse(line);
    let (_, (size, signature)) = result.ok()?;

    Some(ChunkMeta { size, signature })
}

/// Returns the chunk's signature if it matches the one sent by the client
fn verify_chunk(ctx: &SignatureCtx, claimed: &[u8], data: &Bytes) -> Option<Box<str>> {
    let string_to_sign = sig_v4::create_chunk_string_to_sign(
        &ctx.amz_date,
        &ctx.region,
        &ctx.service,
        &ctx.prev_signature,
        slice::from_ref(data),
    );
    let expected = sig_v4::calculate_signature(&string_to_sign, &ctx.secret_key, &ctx.amz_date, &ctx.region, &ctx.service);

    constant_time_eq(expected.as_bytes(), claimed).then(|| expected.into())
}

/// Buffered reader over the encoded body
struct FrameReader<S> {
    body: Pin<Box<S>>,
    buf: BytesMut,
}

impl<S> FrameReader<S>
where
    S: Stream<Item = Result<Bytes, StdError>> + Send + Sync + 'static,
{
    /// Appends the next chunk of the body. Returns `false` at EOF.
    async fn fill(&mut self) -> Result<bool, AwsChunkedStreamError> {
        match self.body.next().await {
            None => Ok(false),
            Some(Err(e)) => Err(AwsChunkedStreamError::Underlying(e)),
            Some(Ok(bytes)) => {
                self.buf.extend_from_slice(&bytes);
                Ok(true)
            }
        }
    }

    /// Reads a line ending with CRLF, which is not included.
    async fn read_line(&mut self) -> Result<Bytes, AwsChunkedStreamError> {
        let mut searched = 0;
        loop {
            if let Some(idx) = memchr(b'\n', &self.buf[searched..]) {
                let end = searched + idx;
                if end > MAX_CHUNK_META_SIZE {
                    return Err(AwsChunkedStreamError::ChunkMetaTooLarge(end, MAX_CHUNK_META_SIZE));
                }
                let mut line = self.buf.split_to(end + 1);
                line.truncate(end);
                if line.last() != Some(&b'\r') {
                    return Err(AwsChunkedStreamError::FormatError);
                }
                line.truncate(end - 1);
                return Ok(line.freeze());
            }

            searched = self.buf.len();
            if searched > MAX_CHUNK_META_SIZE {
                return Err(AwsChunkedStreamError::ChunkMetaTooLarge(searched, MAX_CHUNK_META_SIZE));
            }
            if !self.fill().await? {
                return Err(AwsChunkedStreamError::Incomplete);
            }
        }
    }

    /// Reads exactly `n` bytes followed by CRLF.
    async fn read_data(&mut self, n: usize) -> Result<Bytes, AwsChunkedStreamError> {
        let framed = n.saturating_add(2);
        while self.buf.len() < framed {
            if !self.fill().await? {
                return Err(AwsChunkedStreamError::Incomplete);
            }
        }
        let data = self.buf.split_to(n).freeze();
        if self.buf[..2] != b"\r\n"[..] {
            return Err(AwsChunkedStreamError::FormatError);
        }
        self.buf.advance(2);
        Ok(data)
    }

    /// Accepts what follows the final chunk: nothing, or a single CRLF.
    async fn finish(&mut self) -> Result<(), AwsChunkedStreamError> {
        loop {
            if self.buf.len() > 2 || !b"\r\n".starts_with(&self.buf) {
                return Err(AwsChunkedStreamError::FormatError);
            }
            if !self.fill().await? {
                return Ok(());
            }
        }
    }
}

impl AwsChunkedStream {
    /// Constructs an `AwsChunkedStream` whose chain of chunk signatures starts at `seed_signature`.
    pub fn new<S>(
        body: S,
        seed_signature: Box<str>,
        amz_date: AmzDate,
        region: Box<str>,
        service: Box<str>,
        secret_key: SecretKey,
        decoded_content_length: usize,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, StdError>> + Send + Sync + 'static,
    {
        let ctx = SignatureCtx {
            amz_date,
            region,
            service,
            secret_key,
            prev_signature: seed_signature,
        };
        let reader = FrameReader {
            body: Box::pin(body),
            buf: BytesMut::new(),
        };

        let inner = AsyncTryStream::new(|y| -> SyncBoxFuture<'static, Result<(), AwsChunkedStreamError>> {
            Box::pin(decode_chunks(y, reader, ctx, decoded_content_length))
        });

        Self {
            inner,
            remaining_length: decoded_content_length,
        }
    }

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Bytes, AwsChunkedStreamError>>> {
        let ans = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(Some(Ok(ref bytes))) = ans {
            self.remaining_length = self.remaining_length.saturating_sub(bytes.len());
        }
        ans
    }

    #[must_use]
    pub fn exact_remaining_length(&self) -> usize {
        self.remaining_length
    }

    /// Erases the stream. Its errors come out as boxed [`S3Error`]s.
    #[must_use]
    pub fn into_byte_stream(self) -> DynByteStream {
        crate::stream::into_dyn(self)
    }
}

/// Yields the payload of each chunk once its signature verifies
async fn decode_chunks<S>(
    mut y: Yielder<Result<Bytes, AwsChunkedStreamError>>,
    mut reader: FrameReader<S>,
    mut ctx: SignatureCtx,
    declared: usize,
) -> Result<(), AwsChunkedStreamError>
where
    S: Stream<Item = Result<Bytes, StdError>> + Send + Sync + 'static,
{
    let mut decoded: usize = 0;
    loop {
        let line = reader.read_line().await?;
        let meta = parse_chunk_meta(&line).ok_or(AwsChunkedStreamError::FormatError)?;
        trace!(size = meta.size, "chunk");

        if meta.size > MAX_CHUNK_SIZE {
            return Err(AwsChunkedStreamError::ChunkTooLarge(meta.size, MAX_CHUNK_SIZE));
        }
        decoded = decoded.saturating_add(meta.size);
        if decoded > declared {
            return Err(AwsChunkedStreamError::LengthMismatch { actual: decoded, declared });
        }

        let data = reader.read_data(meta.size).await?;

        let Some(signature) = verify_chunk(&ctx, meta.signature, &data) else {
            debug!(decoded, "chunk signature mismatch");
            return Err(AwsChunkedStreamError::SignatureMismatch);
        };
        ctx.prev_signature = signature;

        if data.is_empty() {
            break;
        }
        y.yield_ok(data).await;
    }

    reader.finish().await?;

    if decoded != declared {
        return Err(AwsChunkedStreamError::LengthMismatch { actual: decoded, declared });
    }
    Ok(())
}

impl Stream for AwsChunkedStream {
    type Item = Result<Bytes, AwsChunkedStreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

impl ByteStream for AwsChunkedStream {
    fn remaining_length(&self) -> RemainingLength {
        RemainingLength::new_exact(self.remaining_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::S3ErrorCode;

    const SEED_SIGNATURE: &str = "4f232c4386841ef735655705268965c44a0e4690baa4adea153f7db9fa80a0a9";
    const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";

    const CHUNK1_META: &[u8] = b"10000;chunk-signature=ad80c730a21e5b8d04586a2213dd63b9a0e99e0e2307b0ade35a65485a288648\r\n";
    const CHUNK2_META: &[u8] = b"400;chunk-signature=0055627c9e194cb4542bae2aa5492e3c1575bbb81b612b7d234b86a503ef5497\r\n";
    const CHUNK3_META: &[u8] = b"0;chunk-signature=b6c6ea8a5354eaf15b3cb7646744f4275b71ea724fed81ceb9323e279d449df9\r\n";

    fn join(bytes: &[&[u8]]) -> Bytes {
        let mut buf = Vec::new();
        for b in bytes {
            buf.extend_from_slice(b);
        }
        buf.into()
    }

    fn chunked_stream(parts: Vec<Bytes>, decoded_content_length: usize) -> AwsChunkedStream {
        let chunk_results: Vec<Result<Bytes, StdError>> = parts.into_iter().map(Ok).collect();
        AwsChunkedStream::new(
            futures::stream::iter(chunk_results),
            SEED_SIGNATURE.into(),
            AmzDate::parse("20130524T000000Z").unwrap(),
            "us-east-1".into(),
            "s3".into(),
            SECRET_ACCESS_KEY.into(),
            decoded_content_length,
        )
    }

    fn example_parts(chunk2_data: &[u8]) -> Vec<Bytes> {
        let chunk1_data = vec![b'a'; 0x10000];
        vec![
            join(&[CHUNK1_META, &chunk1_data, b"\r\n"]),
            join(&[CHUNK2_META, chunk2_data, b"\r\n"]),
            join(&[CHUNK3_META, b"\r\n"]),
        ]
    }

    #[tokio::test]
    async fn example_put_object_chunked_stream() {
        let chunk1_data = vec![b'a'; 0x10000];
        let chunk2_data = vec![b'a'; 1024];
        let mut stream = chunked_stream(example_parts(&chunk2_data), 0x10000 + 1024);
        assert_eq!(stream.remaining_length().exact(), Some(66560));

        let ans1 = stream.next().await.unwrap();
        assert_eq!(ans1.unwrap(), chunk1_data.as_slice());
        assert_eq!(stream.exact_remaining_length(), 1024);

        let ans2 = stream.next().await.unwrap();
        assert_eq!(ans2.unwrap(), chunk2_data.as_slice());

        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn split_frames() {
        let parts = example_parts(&[b'a'; 1024]);
        let whole = join(&[&parts[0], &parts[1], &parts[2]]);
        let pieces: Vec<Bytes> = whole.chunks(1000).map(Bytes::copy_from_slice).collect();

        let mut stream = chunked_stream(pieces, 0x10000 + 1024);
        let mut total = 0;
        while let Some(ret) = stream.next().await {
            total += ret.unwrap().len();
        }
        assert_eq!(total, 0x10000 + 1024);
    }

    #[tokio::test]
    async fn tampered_chunk_is_never_delivered() {
        let mut chunk2_data = vec![b'a'; 1024];
        chunk2_data[512] = b'b';
        let mut stream = chunked_stream(example_parts(&chunk2_data), 0x10000 + 1024);

        let ans1 = stream.next().await.unwrap();
        assert_eq!(ans1.unwrap().len(), 0x10000);

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::SignatureMismatch));
        assert_eq!(S3Error::from(err).code(), S3ErrorCode::SignatureDoesNotMatch);

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn missing_final_chunk() {
        let mut parts = example_parts(&[b'a'; 1024]);
        parts.pop();
        let mut stream = chunked_stream(parts, 0x10000 + 1024);

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::Incomplete));
        assert_eq!(S3Error::from(err).code(), S3ErrorCode::IncompleteBody);
    }

    #[tokio::test]
    async fn decoded_length_mismatch() {
        let mut stream = chunked_stream(example_parts(&[b'a'; 1024]), 70000);

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::LengthMismatch { actual: 66560, declared: 70000 }));

        let mut stream = chunked_stream(example_parts(&[b'a'; 1024]), 1000);
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(S3Error::from(err).code(), S3ErrorCode::IncompleteBody);
    }

    #[tokio::test]
    async fn oversized_chunk_meta() {
        let meta = vec![b'0'; MAX_CHUNK_META_SIZE + 1];
        let mut stream = chunked_stream(vec![Bytes::from(meta)], 0);

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::ChunkMetaTooLarge(..)));
        assert_eq!(S3Error::from(err).code(), S3ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn oversized_chunk() {
        let meta = format!("{:x};chunk-signature={}\r\n", MAX_CHUNK_SIZE + 1, "0".repeat(64));
        let mut stream = chunked_stream(vec![Bytes::from(meta)], usize::MAX);

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::ChunkTooLarge(size, MAX_CHUNK_SIZE) if size == MAX_CHUNK_SIZE + 1));
        assert_eq!(S3Error::from(err).code(), S3ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn unsigned_chunk_is_rejected() {
        let mut stream = chunked_stream(vec![Bytes::from_static(b"3\r\nabc\r\n0\r\n\r\n")], 3);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::FormatError));
    }

    #[tokio::test]
    async fn trailing_garbage() {
        let mut parts = example_parts(&[b'a'; 1024]);
        parts.push(Bytes::from_static(b"x-amz-checksum-crc32:AAAAAA==\r\n"));
        let mut stream = chunked_stream(parts, 0x10000 + 1024);

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, AwsChunkedStreamError::FormatError));
    }

    #[test]
    fn chunk_meta() {
        let line = &CHUNK2_META[..CHUNK2_META.len() - 2];
        let meta = parse_chunk_meta(line).unwrap();
        assert_eq!(meta.size, 1024);
        assert_eq!(meta.signature, &line[20..]);

        assert!(parse_chunk_meta(b"zz;chunk-signature=00").is_none());
        assert!(parse_chunk_meta(CHUNK2_META).is_none());
    }
}
