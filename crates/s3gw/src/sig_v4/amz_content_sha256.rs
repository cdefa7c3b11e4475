//! x-amz-content-sha256
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>

use crate::utils::crypto::is_sha256_checksum;

/// The payload declaration of a V4 request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmzContentSha256<'a> {
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
    MultipleChunks,
    /// A hex SHA-256 of the whole payload
    SingleChunk(&'a str),
    /// `UNSIGNED-PAYLOAD`
    UnsignedPayload,
    /// A streaming variant this gateway does not accept
    UnsupportedStreaming(&'a str),
}

pub const STREAMING_AWS4_HMAC_SHA256_PAYLOAD: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";

pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const UNSUPPORTED_STREAMING: &[&str] = &[
    "STREAMING-AWS4-HMAC-SHA256-PAYLOAD-TRAILER",
    "STREAMING-UNSIGNED-PAYLOAD-TRAILER",
    "STREAMING-AWS4-ECDSA-P256-SHA256-PAYLOAD",
    "STREAMING-AWS4-ECDSA-P256-SHA256-PAYLOAD-TRAILER",
];

/// [`AmzContentSha256`]
#[derive(Debug, thiserror::Error)]
#[error("ParseAmzContentSha256Error")]
pub struct ParseAmzContentSha256Error(());

impl<'a> AmzContentSha256<'a> {
    /// Parses `AmzContentSha256` from `x-amz-content-sha256` header
    ///
    /// # Errors
    /// Returns an error if the header is neither a known sentinel nor a hex digest
    pub fn parse(header: &'a str) -> Result<Self, ParseAmzContentSha256Error> {
        match header {
            UNSIGNED_PAYLOAD => Ok(Self::UnsignedPayload),
            STREAMING_AWS4_HMAC_SHA256_PAYLOAD => Ok(Self::MultipleChunks),
            s if UNSUPPORTED_STREAMING.contains(&s) => Ok(Self::UnsupportedStreaming(s)),
            s if is_sha256_checksum(s) => Ok(Self::SingleChunk(s)),
            _ => Err(ParseAmzContentSha256Error(())),
        }
    }

    /// The payload hash placed in the canonical request
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        match *self {
            Self::MultipleChunks => STREAMING_AWS4_HMAC_SHA256_PAYLOAD,
            Self::SingleChunk(s) | Self::UnsupportedStreaming(s) => s,
            Self::UnsignedPayload => UNSIGNED_PAYLOAD,
        }
    }
}
