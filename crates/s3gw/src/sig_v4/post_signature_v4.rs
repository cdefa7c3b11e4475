//! POST signature version 4
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html>

use super::AmzDate;
use super::authorization_v4::{AWS4_HMAC_SHA256, CredentialV4, is_signature};

use crate::http::Multipart;

/// The signing fields of a POST form signed with signature version 4
#[derive(Debug)]
pub struct PostSignatureV4<'a> {
    pub policy: &'a str,
    pub credential: CredentialV4<'a>,
    pub amz_date: AmzDate,
    pub signature: &'a str,
}

/// [`PostSignatureV4`]
#[derive(Debug, thiserror::Error)]
pub enum ParsePostSignatureV4Error {
    #[error("missing form field: {0}")]
    MissingField(&'static str),
    #[error("malformed form field: {0}")]
    Malformed(&'static str),
}

impl<'a> PostSignatureV4<'a> {
    /// Is this form signed with signature version 4?
    #[must_use]
    pub fn is_v4(m: &Multipart) -> bool {
        m.find_field_value("x-amz-algorithm").is_some()
    }

    /// Extracts the signing fields of a form.
    ///
    /// # Errors
    /// Returns an error if a field is missing or malformed
    pub fn extract(m: &'a Multipart) -> Result<Self, ParsePostSignatureV4Error> {
        use ParsePostSignatureV4Error as E;

        let get = |name: &'static str| m.find_field_value(name).ok_or(E::MissingField(name));

        if get("x-amz-algorithm")? != AWS4_HMAC_SHA256 {
            return Err(E::Malformed("x-amz-algorithm"));
        }

        let policy = get("policy")?;
        let credential = CredentialV4::parse(get("x-amz-credential")?).map_err(|_| E::Malformed("x-amz-credential"))?;
        let amz_date = AmzDate::parse(get("x-amz-date")?).map_err(|_| E::Malformed("x-amz-date"))?;

        let signature = get("x-amz-signature")?;
        if !is_signature(signature) {
            return Err(E::Malformed("x-amz-signature"));
        }

        Ok(Self {
            policy,
            credential,
            amz_date,
            signature,
        })
    }
}
