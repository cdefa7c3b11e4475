//! Credential lookup
//!
//! The pipeline resolves the access key of a signed request through a [`CredentialStore`]
//! and verifies the signature with the secret key it returns.
//!
//! - [`CredentialStore`]: Trait for credential providers
//! - [`StaticCredentialStore`]: In-memory store for tests and single-tenant deployments
//! - [`Credentials`]: The resolved account
//! - [`SecretKey`]: A secret key that never shows up in logs
//!
//! # Example
//!
//! ```
//! use s3gw::auth::{CredentialError, CredentialStore, Credentials};
//!
//! struct DatabaseStore {
//!     // Your database connection
//! }
//!
//! #[async_trait::async_trait]
//! impl CredentialStore for DatabaseStore {
//!     async fn lookup(&self, access_key: &str) -> Result<Credentials, CredentialError> {
//!         // Query your database for the account.
//!         // Return `CredentialError::Unavailable` when the database cannot be reached.
//! #       let _ = access_key;
//!         Err(CredentialError::NotFound)
//!     }
//! }
//! ```

mod secret_key;
pub use self::secret_key::SecretKey;

mod credentials;
pub use self::credentials::*;

mod static_store;
pub use self::static_store::StaticCredentialStore;

use crate::error::{S3Error, StdError};

/// The outcome of a failed lookup
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The access key is unknown.
    #[error("access key not found")]
    NotFound,
    /// The store could not be consulted.
    #[error("credential store unavailable: {0}")]
    Unavailable(StdError),
}

impl From<CredentialError> for S3Error {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NotFound => s3_error!(InvalidAccessKeyId),
            CredentialError::Unavailable(source) => {
                let mut err = s3_error!(ServiceUnavailable, "credential store is unavailable");
                err.set_source(source);
                err
            }
        }
    }
}

/// A source of credentials
///
/// Implementations are shared by all requests and must not hold per-request state.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Finds the credentials of an access key.
    ///
    /// # Errors
    ///
    /// + [`CredentialError::NotFound`] if the access key is unknown
    /// + [`CredentialError::Unavailable`] if the backing store cannot be reached
    async fn lookup(&self, access_key: &str) -> Result<Credentials, CredentialError>;

    /// Does `cred` belong to the owner of the deployment?
    ///
    /// The owner bypasses policy evaluation.
    fn is_owner(&self, cred: &Credentials) -> bool {
        let _ = cred;
        false
    }
}
