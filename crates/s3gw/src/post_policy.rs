//! POST policy documents of browser-based uploads
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html>

use crate::error::{S3Error, S3ErrorCode, S3Result};
use crate::expiry::{ExpiryInput, parse_expiry};

use serde::Deserialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::debug;

/// A decoded POST policy
#[derive(Debug, Clone, Deserialize)]
pub struct PostPolicy {
    /// RFC 3339 instant
    pub expiration: String,
    pub conditions: Vec<Condition>,
}

/// One entry of `conditions`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// `{"field": "value"}`
    ExactMatch(Map<String, Value>),
    /// `["eq", "$field", "value"]`, `["starts-with", "$field", "prefix"]` or `["content-length-range", min, max]`
    ArrayForm(Vec<Value>),
}

/// Bounds on the size of the uploaded file
pub type ContentLengthRange = (u64, u64);

fn malformed(msg: &'static str) -> S3Error {
    S3Error::with_message(S3ErrorCode::MalformedPOSTRequest, msg)
}

fn condition_failed(what: &str) -> S3Error {
    s3_error!(AccessDenied, "Invalid according to Policy: Policy Condition failed: {what}")
}

/// `$Key` names the form field `key`. Form field names are compared in lowercase.
fn field_name(s: &str) -> String {
    s.strip_prefix('$').unwrap_or(s).to_ascii_lowercase()
}

impl PostPolicy {
    /// Decodes the base64 `policy` form field.
    ///
    /// # Errors
    /// Returns `MalformedPOSTRequest` if the policy is not base64-encoded JSON
    pub fn from_base64(policy: &str) -> S3Result<Self> {
        let bytes = base64_simd::STANDARD
            .decode_to_vec(policy)
            .map_err(|_| malformed("policy is not valid base64"))?;
        serde_json::from_slice(&bytes).map_err(|e| s3_error!(e, MalformedPOSTRequest, "policy is not valid JSON"))
    }

    /// Rejects expired policies.
    ///
    /// # Errors
    /// Returns `AccessDenied` if the policy has expired
    pub fn check_expiration(&self, now: OffsetDateTime) -> S3Result {
        let remaining = parse_expiry(ExpiryInput::Iso8601(&self.expiration), now)
            .map_err(|e| s3_error!(e, MalformedPOSTRequest, "policy expiration is invalid"))?;
        if remaining.is_negative() {
            debug!(expiration = %self.expiration, "policy expired");
            return Err(s3_error!(AccessDenied, "Invalid according to Policy: Policy expired"));
        }
        Ok(())
    }

    /// Evaluates the conditions against the form fields and the bucket.
    ///
    /// Returns the `content-length-range` condition, which can only be checked against the file stream.
    ///
    /// # Errors
    /// Returns `AccessDenied` if a condition fails,
    /// or `MalformedPOSTRequest` if a condition cannot be understood
    pub fn check_conditions(&self, fields: &[(String, String)], bucket: &str) -> S3Result<Option<ContentLengthRange>> {
        let lookup = |name: &str| -> Option<&str> {
            if name == "bucket" {
                return Some(bucket);
            }
            fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
        };

        let mut range = None;

        for condition in &self.conditions {
            match condition {
                Condition::ExactMatch(map) => {
                    for (name, expected) in map {
                        let expected = expected.as_str().ok_or_else(|| malformed("condition value must be a string"))?;
                        check_eq(lookup(&field_name(name)), expected, name)?;
                    }
                }
                Condition::ArrayForm(arr) => match arr.as_slice() {
                    [op, name, value] if op.as_str() == Some("eq") => {
                        let name = name.as_str().ok_or_else(|| malformed("condition field must be a string"))?;
                        let value = value.as_str().ok_or_else(|| malformed("condition value must be a string"))?;
                        check_eq(lookup(&field_name(name)), value, name)?;
                    }
                    [op, name, prefix] if op.as_str() == Some("starts-with") => {
                        let name = name.as_str().ok_or_else(|| malformed("condition field must be a string"))?;
                        let prefix = prefix.as_str().ok_or_else(|| malformed("condition value must be a string"))?;
                        match lookup(&field_name(name)) {
                            Some(actual) if actual.starts_with(prefix) => {}
                            _ => return Err(condition_failed(&format!("[\"starts-with\", \"{name}\", \"{prefix}\"]"))),
                        }
                    }
                    [op, min, max] if op.as_str() == Some("content-length-range") => {
                        let min = min.as_u64().ok_or_else(|| malformed("content-length-range bounds must be numbers"))?;
                        let max = max.as_u64().ok_or_else(|| malformed("content-length-range bounds must be numbers"))?;
                        if min > max {
                            return Err(malformed("content-length-range is empty"));
                        }
                        range = Some((min, max));
                    }
                    _ => return Err(malformed("unknown policy condition")),
                },
            }
        }

        Ok(range)
    }
}

fn check_eq(actual: Option<&str>, expected: &str, name: &str) -> S3Result {
    if actual == Some(expected) {
        return Ok(());
    }
    Err(condition_failed(&format!("[\"eq\", \"{name}\", \"{expected}\"]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

    fn policy(json: &str) -> PostPolicy {
        PostPolicy::from_base64(&base64_simd::STANDARD.encode_to_string(json)).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|&(n, v)| (n.to_owned(), v.to_owned())).collect()
    }

    const POLICY: &str = r#"{
        "expiration": "2024-06-01T12:30:00.000Z",
        "conditions": [
            {"bucket": "examplebucket"},
            ["eq", "$key", "user/alice/photo.jpg"],
            ["starts-with", "$Content-Type", "image/"],
            ["content-length-range", 1, 1048576]
        ]
    }"#;

    #[test]
    fn decode() {
        let p = policy(POLICY);
        assert_eq!(p.conditions.len(), 4);

        assert_eq!(PostPolicy::from_base64("!!!").unwrap_err().code(), S3ErrorCode::MalformedPOSTRequest);
        let not_json = base64_simd::STANDARD.encode_to_string("{");
        assert_eq!(PostPolicy::from_base64(&not_json).unwrap_err().code(), S3ErrorCode::MalformedPOSTRequest);
    }

    #[test]
    fn expiration() {
        let p = policy(POLICY);
        assert!(p.check_expiration(NOW).is_ok());
        assert!(p.check_expiration(datetime!(2024-06-01 12:30:00 UTC)).is_ok());

        let err = p.check_expiration(datetime!(2024-06-01 12:30:01 UTC)).unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::AccessDenied);
        assert_eq!(err.message(), Some("Invalid according to Policy: Policy expired"));
    }

    #[test]
    fn conditions_pass() {
        let p = policy(POLICY);
        let form = fields(&[("key", "user/alice/photo.jpg"), ("content-type", "image/jpeg")]);
        let range = p.check_conditions(&form, "examplebucket").unwrap();
        assert_eq!(range, Some((1, 1_048_576)));
    }

    #[test]
    fn conditions_fail() {
        let p = policy(POLICY);

        let form = fields(&[("key", "user/alice/photo.jpg"), ("content-type", "image/jpeg")]);
        let err = p.check_conditions(&form, "otherbucket").unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::AccessDenied);

        let form = fields(&[("key", "user/bob/photo.jpg"), ("content-type", "image/jpeg")]);
        assert_eq!(p.check_conditions(&form, "examplebucket").unwrap_err().code(), S3ErrorCode::AccessDenied);

        let form = fields(&[("key", "user/alice/photo.jpg"), ("content-type", "text/plain")]);
        assert_eq!(p.check_conditions(&form, "examplebucket").unwrap_err().code(), S3ErrorCode::AccessDenied);

        let form = fields(&[("key", "user/alice/photo.jpg")]);
        assert_eq!(p.check_conditions(&form, "examplebucket").unwrap_err().code(), S3ErrorCode::AccessDenied);
    }

    #[test]
    fn unknown_operator() {
        let p = policy(r#"{"expiration": "2024-06-01T12:30:00Z", "conditions": [["matches", "$key", ".*"]]}"#);
        let err = p.check_conditions(&[], "b").unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::MalformedPOSTRequest);
    }
}
