use std::fmt;

use hyper::StatusCode;

/// The closed set of error codes the pipeline can produce.
///
/// See <https://docs.aws.amazon.com/AmazonS3/latest/API/ErrorResponses.html#ErrorCodeList>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// Access Denied
    AccessDenied,

    /// The authorization header you provided is invalid.
    AuthorizationHeaderMalformed,

    /// The query parameters of a presigned request are malformed or missing.
    AuthorizationQueryParametersError,

    /// The Content-MD5 you specified did not match what was received.
    BadDigest,

    /// Your proposed upload exceeds the maximum allowed object size.
    EntityTooLarge,

    /// Your proposed upload is smaller than the minimum allowed object size.
    EntityTooSmall,

    /// The provided token has expired.
    ExpiredToken,

    /// You did not provide the number of bytes specified by the Content-Length HTTP header.
    IncompleteBody,

    /// We encountered an internal error. Please try again.
    InternalError,

    /// The AWS access key ID you provided does not exist in our records.
    InvalidAccessKeyId,

    /// The Content-MD5 you specified is not valid.
    InvalidDigest,

    /// Invalid Request
    InvalidRequest,

    /// The provided token is malformed or otherwise invalid.
    InvalidToken,

    /// Couldn't parse the specified URI.
    InvalidURI,

    /// The body of your POST request is not well-formed multipart/form-data.
    MalformedPOSTRequest,

    /// You must provide the Content-Length HTTP header.
    MissingContentLength,

    /// A header you provided implies functionality that is not implemented.
    NotImplemented,

    /// The difference between the request time and the server's time is too large.
    RequestTimeTooSkewed,

    /// Service is unable to handle request.
    ServiceUnavailable,

    /// The request signature we calculated does not match the signature you provided.
    SignatureDoesNotMatch,

    /// The request signature version is not supported.
    SignatureVersionNotSupported,

    /// The provided `x-amz-content-sha256` header does not match what was computed.
    XAmzContentSHA256Mismatch,
}

impl S3ErrorCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::AuthorizationHeaderMalformed => "AuthorizationHeaderMalformed",
            Self::AuthorizationQueryParametersError => "AuthorizationQueryParametersError",
            Self::BadDigest => "BadDigest",
            Self::EntityTooLarge => "EntityTooLarge",
            Self::EntityTooSmall => "EntityTooSmall",
            Self::ExpiredToken => "ExpiredToken",
            Self::IncompleteBody => "IncompleteBody",
            Self::InternalError => "InternalError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::InvalidDigest => "InvalidDigest",
            Self::InvalidRequest => "InvalidRequest",
            Self::InvalidToken => "InvalidToken",
            Self::InvalidURI => "InvalidURI",
            Self::MalformedPOSTRequest => "MalformedPOSTRequest",
            Self::MissingContentLength => "MissingContentLength",
            Self::NotImplemented => "NotImplemented",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Self::SignatureVersionNotSupported => "SignatureVersionNotSupported",
            Self::XAmzContentSHA256Mismatch => "XAmzContentSHA256Mismatch",
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied
            | Self::InvalidAccessKeyId
            | Self::RequestTimeTooSkewed
            | Self::SignatureDoesNotMatch => StatusCode::FORBIDDEN,
            Self::AuthorizationHeaderMalformed
            | Self::AuthorizationQueryParametersError
            | Self::BadDigest
            | Self::EntityTooLarge
            | Self::EntityTooSmall
            | Self::ExpiredToken
            | Self::IncompleteBody
            | Self::InvalidDigest
            | Self::InvalidRequest
            | Self::InvalidToken
            | Self::InvalidURI
            | Self::MalformedPOSTRequest
            | Self::SignatureVersionNotSupported
            | Self::XAmzContentSHA256Mismatch => StatusCode::BAD_REQUEST,
            Self::MissingContentLength => StatusCode::LENGTH_REQUIRED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Parses a code from its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|code| code.as_str() == name)
    }
}

const ALL: &[S3ErrorCode] = &[
    S3ErrorCode::AccessDenied,
    S3ErrorCode::AuthorizationHeaderMalformed,
    S3ErrorCode::AuthorizationQueryParametersError,
    S3ErrorCode::BadDigest,
    S3ErrorCode::EntityTooLarge,
    S3ErrorCode::EntityTooSmall,
    S3ErrorCode::ExpiredToken,
    S3ErrorCode::IncompleteBody,
    S3ErrorCode::InternalError,
    S3ErrorCode::InvalidAccessKeyId,
    S3ErrorCode::InvalidDigest,
    S3ErrorCode::InvalidRequest,
    S3ErrorCode::InvalidToken,
    S3ErrorCode::InvalidURI,
    S3ErrorCode::MalformedPOSTRequest,
    S3ErrorCode::MissingContentLength,
    S3ErrorCode::NotImplemented,
    S3ErrorCode::RequestTimeTooSkewed,
    S3ErrorCode::ServiceUnavailable,
    S3ErrorCode::SignatureDoesNotMatch,
    S3ErrorCode::SignatureVersionNotSupported,
    S3ErrorCode::XAmzContentSHA256Mismatch,
];

impl fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(S3ErrorCode::MissingContentLength.status_code(), StatusCode::LENGTH_REQUIRED);
        assert_eq!(S3ErrorCode::ServiceUnavailable.status_code().as_u16(), 503);
        assert_eq!(S3ErrorCode::RequestTimeTooSkewed.status_code().as_u16(), 403);
        assert_eq!(S3ErrorCode::ExpiredToken.status_code().as_u16(), 400);
        assert_eq!(S3ErrorCode::NotImplemented.status_code().as_u16(), 501);
    }

    #[test]
    fn names_roundtrip() {
        for &code in ALL {
            assert_eq!(S3ErrorCode::from_name(code.as_str()), Some(code));
        }
        assert_eq!(S3ErrorCode::from_name("NoSuchBucket"), None);
    }
}
