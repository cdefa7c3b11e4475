//! AWS Signature Version 4
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>

use super::AmzDate;

use crate::auth::SecretKey;
use crate::http::OrderedHeaders;
use crate::utils::crypto::{EMPTY_STRING_SHA256_HASH, hex, hex_sha256, hex_sha256_chunk, hmac_sha256};

use bytes::Bytes;
use hyper::Method;

/// `UriEncode` with the AWS character table
///
/// Unreserved characters are kept. `/` is kept unless `encode_slash` is set.
/// Everything else becomes `%XX` with upper-case hex digits.
pub fn uri_encode(output: &mut String, input: &str, encode_slash: bool) {
    /// hex digits
    const HEX_UPPERCASE: &[u8; 16] = b"0123456789ABCDEF";

    for &byte in input.as_bytes() {
        let keep = byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') || (byte == b'/' && !encode_slash);
        if keep {
            output.push(char::from(byte));
        } else {
            output.push('%');
            output.push(char::from(HEX_UPPERCASE[usize::from(byte >> 4)]));
            output.push(char::from(HEX_UPPERCASE[usize::from(byte & 15)]));
        }
    }
}

fn uri_encode_string(input: &str, encode_slash: bool) -> String {
    let mut s = String::with_capacity(input.len());
    uri_encode(&mut s, input, encode_slash);
    s
}

/// Trims a header value and collapses its inner whitespace runs into single spaces.
fn push_canonical_value(output: &mut String, value: &str) {
    for (i, word) in value.split_ascii_whitespace().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        output.push_str(word);
    }
}

/// Builds the canonical query string: both sides encoded, sorted, `=` always present.
fn canonical_query_string<'a>(query_strings: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut encoded: Vec<(String, String)> = query_strings
        .map(|(name, value)| (uri_encode_string(name, true), uri_encode_string(value, true)))
        .collect();
    encoded.sort();

    let mut ans = String::new();
    for (i, (name, value)) in encoded.iter().enumerate() {
        if i > 0 {
            ans.push('&');
        }
        ans.push_str(name);
        ans.push('=');
        ans.push_str(value);
    }
    ans
}

/// Builds the canonical headers block and the signed headers list.
///
/// `signed_headers` must be sorted by name. Repeated headers are joined with commas.
fn canonical_headers(signed_headers: &OrderedHeaders<'_>) -> (String, String) {
    let mut headers = String::new();
    let mut names = String::new();

    let mut prev: Option<&str> = None;
    for (name, value) in signed_headers.iter_pairs() {
        if prev == Some(name) {
            headers.push(',');
        } else {
            if prev.is_some() {
                headers.push('\n');
                names.push(';');
            }
            headers.push_str(name);
            headers.push(':');
            names.push_str(name);
            prev = Some(name);
        }
        push_canonical_value(&mut headers, value);
    }
    if prev.is_some() {
        headers.push('\n');
    }

    (headers, names)
}

/// Creates the canonical request of a header-signed request
///
/// `uri_path` is the decoded path.
/// `payload` is the declared payload hash or one of the payload sentinels.
#[must_use]
pub fn create_canonical_request(
    method: &Method,
    uri_path: &str,
    query_strings: &[(impl AsRef<str>, impl AsRef<str>)],
    signed_headers: &OrderedHeaders<'_>,
    payload: &str,
) -> String {
    let qs = query_strings.iter().map(|(n, v)| (n.as_ref(), v.as_ref()));
    build_canonical_request(method, uri_path, canonical_query_string(qs), signed_headers, payload)
}

/// Creates the canonical request of a presigned url, which omits `X-Amz-Signature`.
#[must_use]
pub fn create_presigned_canonical_request(
    method: &Method,
    uri_path: &str,
    query_strings: &[(impl AsRef<str>, impl AsRef<str>)],
    signed_headers: &OrderedHeaders<'_>,
    payload: &str,
) -> String {
    let qs = query_strings
        .iter()
        .map(|(n, v)| (n.as_ref(), v.as_ref()))
        .filter(|&(n, _)| n != "X-Amz-Signature");
    build_canonical_request(method, uri_path, canonical_query_string(qs), signed_headers, payload)
}

fn build_canonical_request(
    method: &Method,
    uri_path: &str,
    query_string: String,
    signed_headers: &OrderedHeaders<'_>,
    payload: &str,
) -> String {
    let (headers, names) = canonical_headers(signed_headers);

    let mut ans = String::with_capacity(256);
    ans.push_str(method.as_str());
    ans.push('\n');
    uri_encode(&mut ans, uri_path, false);
    ans.push('\n');
    ans.push_str(&query_string);
    ans.push('\n');
    ans.push_str(&headers);
    ans.push('\n');
    ans.push_str(&names);
    ans.push('\n');
    ans.push_str(payload);
    ans
}

/// Creates the string to sign
#[must_use]
pub fn create_string_to_sign(canonical_request: &str, amz_date: &AmzDate, region: &str, service: &str) -> String {
    format!(
        "AWS4-HMAC-SHA256\n{}\n{}/{region}/{service}/aws4_request\n{}",
        amz_date.fmt_iso8601(),
        amz_date.fmt_date(),
        hex_sha256(canonical_request.as_bytes()),
    )
}

/// Creates the string to sign of one chunk of a `STREAMING-AWS4-HMAC-SHA256-PAYLOAD` body
#[must_use]
pub fn create_chunk_string_to_sign(
    amz_date: &AmzDate,
    region: &str,
    service: &str,
    prev_signature: &str,
    chunk_data: &[Bytes],
) -> String {
    format!(
        "AWS4-HMAC-SHA256-PAYLOAD\n{}\n{}/{region}/{service}/aws4_request\n{prev_signature}\n{EMPTY_STRING_SHA256_HASH}\n{}",
        amz_date.fmt_iso8601(),
        amz_date.fmt_date(),
        hex_sha256_chunk(chunk_data),
    )
}

/// Derives the signing key: `AWS4{secret}` → date → region → service → `aws4_request`.
fn signing_key(secret_key: &SecretKey, date: &str, region: &str, service: &str) -> [u8; 32] {
    let secret = secret_key.expose();
    let mut key = Vec::with_capacity(secret.len() + 4);
    key.extend_from_slice(b"AWS4");
    key.extend_from_slice(secret.as_bytes());

    let k_date = hmac_sha256(&key, date);
    zeroize::Zeroize::zeroize(&mut key);

    let k_region = hmac_sha256(k_date, region);
    let k_service = hmac_sha256(k_region, service);
    hmac_sha256(k_service, "aws4_request")
}

/// Calculates the hex signature of a string to sign
#[must_use]
pub fn calculate_signature(string_to_sign: &str, secret_key: &SecretKey, amz_date: &AmzDate, region: &str, service: &str) -> String {
    let key = signing_key(secret_key, &amz_date.fmt_date(), region, service);
    hex(hmac_sha256(key, string_to_sign))
}
