//! presigned url information of signature version 2
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/userguide/RESTAuthentication.html#RESTAuthenticationQueryStringAuth>

use crate::http::OrderedQs;

/// Presigned url information
#[derive(Debug)]
pub struct PresignedUrlV2<'a> {
    pub access_key: &'a str,
    pub signature: &'a str,
    /// The raw `Expires` value, which takes the place of `Date` in the string to sign
    pub expires_str: &'a str,
    /// Seconds since the unix epoch
    pub expires: i64,
}

/// [`PresignedUrlV2`]
#[derive(Debug, thiserror::Error)]
pub enum ParsePresignedUrlV2Error {
    #[error("missing or repeated query parameter: {0}")]
    MissingField(&'static str),
    #[error("malformed query parameter: {0}")]
    Malformed(&'static str),
}

impl<'a> PresignedUrlV2<'a> {
    /// Parses `PresignedUrlV2` from query
    ///
    /// # Errors
    /// Returns an error if a field is missing or malformed
    pub fn parse(qs: &'a OrderedQs) -> Result<Self, ParsePresignedUrlV2Error> {
        use ParsePresignedUrlV2Error as E;

        let get = |name: &'static str| qs.get_unique(name).ok_or(E::MissingField(name));

        let access_key = get("AWSAccessKeyId")?;
        let signature = get("Signature")?;
        let expires_str = get("Expires")?;

        if access_key.is_empty() {
            return Err(E::Malformed("AWSAccessKeyId"));
        }
        if signature.is_empty() {
            return Err(E::Malformed("Signature"));
        }
        if expires_str.is_empty() || !expires_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::Malformed("Expires"));
        }
        let expires = atoi::atoi::<i64>(expires_str.as_bytes()).ok_or(E::Malformed("Expires"))?;

        Ok(Self {
            access_key,
            signature,
            expires_str,
            expires,
        })
    }
}
