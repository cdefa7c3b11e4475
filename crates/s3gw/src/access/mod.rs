//! Access control and authorization
//!
//! After a request is authenticated, the [`AuthorizationGate`] decides whether it may proceed.
//! The owner of the deployment is always allowed. Every other request, anonymous ones included,
//! is handed to a [`PolicyEvaluator`].
//!
//! # Example
//!
//! ```
//! use s3gw::access::{Action, PolicyEvaluator, PolicyRequest};
//!
//! /// Allows anonymous reads of one public bucket
//! struct PublicBucket;
//!
//! #[async_trait::async_trait]
//! impl PolicyEvaluator for PublicBucket {
//!     async fn is_allowed(&self, req: &PolicyRequest<'_>) -> bool {
//!         if req.credentials.is_some() {
//!             return true;
//!         }
//!         req.bucket == Some("public") && matches!(req.action, Action::GetObject | Action::HeadObject)
//!     }
//! }
//! ```

mod action;
pub use self::action::Action;

use crate::auth::Credentials;
use crate::auth_type::AuthType;
use crate::context::RequestAuthContext;
use crate::error::S3Result;

use std::sync::Arc;

use tracing::debug;

/// The input of a policy decision
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    /// `None` for anonymous requests
    pub credentials: Option<&'a Credentials>,
    pub auth_type: AuthType,
    pub action: Action,
    pub bucket: Option<&'a str>,
    pub object: Option<&'a str>,
}

/// Decides requests that do not come from the owner
#[async_trait::async_trait]
pub trait PolicyEvaluator: Send + Sync + 'static {
    async fn is_allowed(&self, req: &PolicyRequest<'_>) -> bool;
}

/// Allows every authenticated request and denies anonymous ones
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAuthenticated;

#[async_trait::async_trait]
impl PolicyEvaluator for AllowAuthenticated {
    async fn is_allowed(&self, req: &PolicyRequest<'_>) -> bool {
        req.credentials.is_some()
    }
}

/// Denies everything. Only the owner gets through the gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnerOnly;

#[async_trait::async_trait]
impl PolicyEvaluator for OwnerOnly {
    async fn is_allowed(&self, _: &PolicyRequest<'_>) -> bool {
        false
    }
}

/// The final authorization step of the pipeline
#[derive(Clone)]
pub struct AuthorizationGate {
    evaluator: Arc<dyn PolicyEvaluator>,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Allows or denies an authenticated request.
    ///
    /// # Errors
    /// Returns `AccessDenied` when the policy evaluator denies the request
    pub async fn authorize(&self, cx: &RequestAuthContext) -> S3Result {
        if cx.is_owner() {
            return Ok(());
        }

        let target = cx.target();
        let req = PolicyRequest {
            credentials: cx.credentials(),
            auth_type: cx.auth_type(),
            action: target.action,
            bucket: target.bucket.as_deref(),
            object: target.object.as_deref(),
        };

        if self.evaluator.is_allowed(&req).await {
            return Ok(());
        }

        debug!(action = %req.action, anonymous = req.credentials.is_none(), "access denied by policy");
        Err(s3_error!(AccessDenied))
    }
}
