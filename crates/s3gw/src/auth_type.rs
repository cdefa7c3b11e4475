//! Classification of request signing schemes

use crate::http::{OrderedHeaders, OrderedQs};
use crate::sig_v4::{AWS4_HMAC_SHA256, STREAMING_AWS4_HMAC_SHA256_PAYLOAD};

use hyper::Method;

/// The signing scheme of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    Unknown,
    Anonymous,
    /// Signature version 4 in the `Authorization` header
    Signed,
    /// Signature version 2 in the `Authorization` header
    SignedV2,
    /// Signature version 4 in the query
    Presigned,
    /// Signature version 2 in the query
    PresignedV2,
    /// Browser-based upload with a signed policy document
    PostPolicy,
    /// Signature version 4 with a chunk-signed body
    StreamingSigned,
    /// An STS call authenticated by a web identity token
    FederatedToken,
}

impl AuthType {
    #[must_use]
    pub fn is_supported(self) -> bool {
        match self {
            Self::Anonymous
            | Self::Signed
            | Self::SignedV2
            | Self::Presigned
            | Self::PresignedV2
            | Self::PostPolicy
            | Self::StreamingSigned
            | Self::FederatedToken => true,
            Self::Unknown => false,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Anonymous => "Anonymous",
            Self::Signed => "Signed",
            Self::SignedV2 => "SignedV2",
            Self::Presigned => "Presigned",
            Self::PresignedV2 => "PresignedV2",
            Self::PostPolicy => "PostPolicy",
            Self::StreamingSigned => "StreamingSigned",
            Self::FederatedToken => "FederatedToken",
        }
    }
}

/// Decides which signing scheme a request uses. The first matching rule wins.
#[must_use]
pub fn classify(method: &Method, hs: &OrderedHeaders<'_>, qs: Option<&OrderedQs>) -> AuthType {
    let authorization = hs.get_unique("authorization");
    let has_query = |name: &str| qs.is_some_and(|qs| qs.has(name));

    if authorization.is_some_and(|a| !a.starts_with(AWS4_HMAC_SHA256) && a.starts_with("AWS")) {
        return AuthType::SignedV2;
    }
    if has_query("AWSAccessKeyId") {
        return AuthType::PresignedV2;
    }
    if hs.get_unique("x-amz-content-sha256") == Some(STREAMING_AWS4_HMAC_SHA256_PAYLOAD) && *method == Method::PUT {
        return AuthType::StreamingSigned;
    }
    if authorization.is_some_and(|a| a.starts_with(AWS4_HMAC_SHA256)) {
        return AuthType::Signed;
    }
    if has_query("X-Amz-Credential") {
        return AuthType::Presigned;
    }
    let is_form = hs.get_unique("content-type").is_some_and(|ct| ct.contains("multipart/form-data"));
    if is_form && *method == Method::POST {
        return AuthType::PostPolicy;
    }
    if has_query("Action") {
        return AuthType::FederatedToken;
    }
    if !hs.contains("authorization") {
        return AuthType::Anonymous;
    }
    AuthType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(method: Method, headers: &[(&str, &str)], query: &str) -> AuthType {
        let hs = OrderedHeaders::from_slice_unchecked(headers);
        let qs = if query.is_empty() { None } else { Some(OrderedQs::parse(query).unwrap()) };
        classify(&method, &hs, qs.as_ref())
    }

    const V4: &str = "AWS4-HMAC-SHA256 Credential=AK/20130524/us-east-1/s3/aws4_request, SignedHeaders=host, Signature=x";

    #[test]
    fn each_type() {
        assert_eq!(run(Method::GET, &[("authorization", "AWS AK:sig")], ""), AuthType::SignedV2);
        assert_eq!(run(Method::GET, &[("authorization", "AWSAK:sig")], ""), AuthType::SignedV2);
        assert_eq!(
            run(Method::GET, &[], "AWSAccessKeyId=AK&Expires=1&Signature=s"),
            AuthType::PresignedV2
        );
        assert_eq!(
            run(
                Method::PUT,
                &[("authorization", V4), ("x-amz-content-sha256", "STREAMING-AWS4-HMAC-SHA256-PAYLOAD")],
                ""
            ),
            AuthType::StreamingSigned
        );
        assert_eq!(run(Method::GET, &[("authorization", V4)], ""), AuthType::Signed);
        assert_eq!(run(Method::GET, &[], "X-Amz-Credential=AK%2F20130524"), AuthType::Presigned);
        assert_eq!(
            run(Method::POST, &[("content-type", "multipart/form-data; boundary=xyz")], ""),
            AuthType::PostPolicy
        );
        assert_eq!(
            run(Method::POST, &[], "Action=AssumeRoleWithWebIdentity&WebIdentityToken=t"),
            AuthType::FederatedToken
        );
        assert_eq!(run(Method::GET, &[], ""), AuthType::Anonymous);
        assert_eq!(run(Method::GET, &[("authorization", "Bearer token")], ""), AuthType::Unknown);
    }

    #[test]
    fn precedence() {
        // the streaming sentinel outside of PUT falls through to header auth
        assert_eq!(
            run(
                Method::POST,
                &[("authorization", V4), ("x-amz-content-sha256", "STREAMING-AWS4-HMAC-SHA256-PAYLOAD")],
                ""
            ),
            AuthType::Signed
        );
        // V2 header wins over a V4 query
        assert_eq!(
            run(Method::GET, &[("authorization", "AWS AK:sig")], "X-Amz-Credential=x"),
            AuthType::SignedV2
        );
        // a form POST with a V4 header is header-signed
        assert_eq!(
            run(Method::POST, &[("authorization", V4), ("content-type", "multipart/form-data; boundary=b")], ""),
            AuthType::Signed
        );
        // a form PUT is not a POST policy upload
        assert_eq!(run(Method::PUT, &[("content-type", "multipart/form-data; boundary=b")], ""), AuthType::Anonymous);
    }

    #[test]
    fn supported() {
        assert!(!AuthType::Unknown.is_supported());
        for t in [
            AuthType::Anonymous,
            AuthType::Signed,
            AuthType::SignedV2,
            AuthType::Presigned,
            AuthType::PresignedV2,
            AuthType::PostPolicy,
            AuthType::StreamingSigned,
            AuthType::FederatedToken,
        ] {
            assert!(t.is_supported(), "{}", t.as_str());
        }
    }
}
