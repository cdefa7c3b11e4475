//! POST signature version 2
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/userguide/HTTPPOSTForms.html>

use crate::http::Multipart;

/// The signing fields of a POST form signed with signature version 2
#[derive(Debug)]
pub struct PostSignatureV2<'a> {
    pub policy: &'a str,
    pub access_key_id: &'a str,
    pub signature: &'a str,
}

/// [`PostSignatureV2`]
#[derive(Debug, thiserror::Error)]
#[error("missing form field: {0}")]
pub struct ParsePostSignatureV2Error(&'static str);

impl<'a> PostSignatureV2<'a> {
    /// Extracts the signing fields of a form.
    ///
    /// # Errors
    /// Returns an error if a field is missing
    pub fn extract(m: &'a Multipart) -> Result<Self, ParsePostSignatureV2Error> {
        let get = |name: &'static str| m.find_field_value(name).ok_or(ParsePostSignatureV2Error(name));
        Ok(Self {
            policy: get("policy")?,
            access_key_id: get("awsaccesskeyid")?,
            signature: get("signature")?,
        })
    }
}
