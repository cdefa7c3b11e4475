use super::SecretKey;

use crate::crypto::constant_time_eq;

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Minimum length of an access key
pub const ACCESS_KEY_MIN_LEN: usize = 3;

/// Minimum length of a secret key
pub const SECRET_KEY_MIN_LEN: usize = 8;

/// Whether an account may sign requests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("access key must be at least 3 characters")]
    InvalidAccessKeyLength,
    #[error("secret key must be at least 8 characters")]
    InvalidSecretKeyLength,
}

/// The credentials of an account
///
/// An expiration at the unix epoch, or no expiration at all, means the credentials never expire.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: SecretKey,
    session_token: Option<String>,
    expiration: Option<OffsetDateTime>,
    status: AccountStatus,
    parent_user: Option<String>,
    groups: Vec<String>,
}

impl Credentials {
    /// Creates long-term credentials.
    ///
    /// # Errors
    /// Returns an error if a key is too short.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<SecretKey>) -> Result<Self, CredentialsError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.len() < ACCESS_KEY_MIN_LEN {
            return Err(CredentialsError::InvalidAccessKeyLength);
        }
        if secret_key.len() < SECRET_KEY_MIN_LEN {
            return Err(CredentialsError::InvalidSecretKeyLength);
        }
        Ok(Self {
            access_key,
            secret_key,
            session_token: None,
            expiration: Some(OffsetDateTime::UNIX_EPOCH),
            status: AccountStatus::On,
            parent_user: None,
            groups: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_expiration(mut self, expiration: OffsetDateTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_parent_user(mut self, parent_user: impl Into<String>) -> Self {
        self.parent_user = Some(parent_user.into());
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    #[must_use]
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref().filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn expiration(&self) -> Option<OffsetDateTime> {
        self.expiration.filter(|&t| t != OffsetDateTime::UNIX_EPOCH)
    }

    #[must_use]
    pub fn status(&self) -> AccountStatus {
        self.status
    }

    #[must_use]
    pub fn parent_user(&self) -> Option<&str> {
        self.parent_user.as_deref().filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Temporary credentials carry a session token and a real expiration.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.session_token().is_some() && self.expiration().is_some()
    }

    /// Service accounts have a parent user and never expire.
    #[must_use]
    pub fn is_service_account(&self) -> bool {
        self.parent_user().is_some() && self.expiration().is_none()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expiration().is_some_and(|t| t < now)
    }

    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        self.status != AccountStatus::Off
            && self.access_key.len() >= ACCESS_KEY_MIN_LEN
            && self.secret_key.len() >= SECRET_KEY_MIN_LEN
            && !self.is_expired_at(now)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }

    /// Do `other` and `self` name the same valid credentials?
    ///
    /// Secrets are compared in constant time.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let token = |c: &Self| c.session_token().unwrap_or_default().as_bytes().to_owned();
        other.is_valid()
            && self.access_key == other.access_key
            && self.secret_key == other.secret_key
            && constant_time_eq(&token(self), &token(other))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key)
            .field("session_token", &self.session_token.as_ref().map(|_| "[SENSITIVE-SESSION-TOKEN]"))
            .field("expiration", &self.expiration)
            .field("status", &self.status)
            .field("parent_user", &self.parent_user)
            .finish_non_exhaustive()
    }
}
