//! AWS Signature Version 2
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/userguide/RESTAuthentication.html#ConstructingTheAuthenticationHeader>

use crate::auth::SecretKey;
use crate::http::{OrderedHeaders, OrderedQs};
use crate::utils::crypto::hmac_sha1;

use hyper::Method;

/// Sub-resources and response overrides that belong to the canonical resource
const INCLUDED_QUERY: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// Creates the string to sign
///
/// + `uri_path` is the path as received
/// + `date` is the `Date` header, `Expires` for presigned urls, or empty when `x-amz-date` is present
/// + `vh_bucket` is the bucket taken from a virtual-hosted-style host name
#[must_use]
pub fn create_string_to_sign(
    method: &Method,
    uri_path: &str,
    qs: Option<&OrderedQs>,
    hs: &OrderedHeaders<'_>,
    date: &str,
    vh_bucket: Option<&str>,
) -> String {
    let mut ans = String::with_capacity(256);

    ans.push_str(method.as_str());
    ans.push('\n');

    ans.push_str(hs.get_unique("content-md5").unwrap_or_default());
    ans.push('\n');

    ans.push_str(hs.get_unique("content-type").unwrap_or_default());
    ans.push('\n');

    ans.push_str(date);
    ans.push('\n');

    let mut prev: Option<&str> = None;
    for (name, value) in hs.iter_pairs() {
        if !name.starts_with("x-amz-") {
            continue;
        }
        if prev == Some(name) {
            ans.push(',');
        } else {
            if prev.is_some() {
                ans.push('\n');
            }
            ans.push_str(name);
            ans.push(':');
            prev = Some(name);
        }
        ans.push_str(value.trim());
    }
    if prev.is_some() {
        ans.push('\n');
    }

    if let Some(bucket) = vh_bucket {
        ans.push('/');
        ans.push_str(bucket);
    }
    ans.push_str(uri_path);

    if let Some(qs) = qs {
        let mut first = true;
        for (name, value) in qs.as_ref() {
            if INCLUDED_QUERY.binary_search(&name.as_str()).is_err() {
                continue;
            }
            ans.push(if first { '?' } else { '&' });
            first = false;
            ans.push_str(name);
            if !value.is_empty() {
                ans.push('=');
                ans.push_str(value);
            }
        }
    }

    ans
}

/// Calculates `base64(HMAC-SHA1(secret, string_to_sign))`
#[must_use]
pub fn calculate_signature(secret_key: &SecretKey, string_to_sign: &str) -> String {
    let mac = hmac_sha1(secret_key.expose(), string_to_sign);
    base64_simd::STANDARD.encode_to_string(mac)
}
