//! Authorization header of signature version 2
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/userguide/RESTAuthentication.html>

/// `AWS {access_key}:{signature}`
#[derive(Debug)]
pub struct AuthorizationV2<'a> {
    pub access_key: &'a str,
    pub signature: &'a str,
}

/// [`AuthorizationV2`]
#[derive(Debug, thiserror::Error)]
#[error("ParseAuthorizationV2Error")]
pub struct ParseAuthorizationV2Error(());

impl<'a> AuthorizationV2<'a> {
    /// Parses `AuthorizationV2` from `Authorization` header
    ///
    /// # Errors
    /// Returns an error if the header is invalid
    pub fn parse(input: &'a str) -> Result<Self, ParseAuthorizationV2Error> {
        let err = || ParseAuthorizationV2Error(());

        let rest = input.strip_prefix("AWS ").ok_or_else(err)?;
        let (access_key, signature) = rest.rsplit_once(':').ok_or_else(err)?;
        if access_key.is_empty() || signature.is_empty() {
            return Err(err());
        }
        Ok(Self { access_key, signature })
    }
}
