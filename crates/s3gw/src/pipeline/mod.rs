//! The request authentication pipeline
//!
//! [`AuthPipeline`] classifies a request, verifies its signature, wraps its body in
//! verifying streams and finally asks the [`AuthorizationGate`] whether the resolved
//! identity may perform the requested action.
//!
//! Body verification is lazy: integrity failures surface as errors of the body stream
//! while the downstream handler reads it.

mod signature;
use self::signature::SignatureContext;

use crate::access::{AuthorizationGate, PolicyEvaluator};
use crate::auth::CredentialStore;
use crate::auth_type::{self, AuthType};
use crate::config::AuthConfigProvider;
use crate::context::{RequestAuthContext, S3Target};
use crate::error::*;
use crate::http::{Body, OrderedHeaders, OrderedQs};
use crate::integrity::{ContentChecks, IntegrityStream};
use crate::stream::into_dyn;
use crate::time::Clock;

use std::mem;
use std::sync::Arc;

use ::http::request::Parts;
use hyper::Request;
use tracing::debug;

/// Authenticates and authorizes requests
///
/// All collaborators are shared. One pipeline serves any number of concurrent requests.
#[derive(Clone)]
pub struct AuthPipeline {
    config: Arc<dyn AuthConfigProvider>,
    store: Arc<dyn CredentialStore>,
    gate: AuthorizationGate,
    clock: Arc<dyn Clock>,
}

impl AuthPipeline {
    #[must_use]
    pub fn new(
        config_provider: Arc<dyn AuthConfigProvider>,
        store: Arc<dyn CredentialStore>,
        evaluator: Arc<dyn PolicyEvaluator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: config_provider,
            store,
            gate: AuthorizationGate::new(evaluator),
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Arc<dyn AuthConfigProvider> {
        &self.config
    }

    /// Verifies the signature of a request.
    ///
    /// On success the request body is replaced by a stream that yields only verified bytes.
    /// On failure the body is dropped.
    ///
    /// # Errors
    /// Returns the first check that failed
    #[tracing::instrument(skip_all, fields(method = %req.method(), uri = %req.uri()))]
    pub async fn authenticate(&self, req: &mut Request<Body>, target: S3Target) -> S3Result<RequestAuthContext> {
        let (parts, body) = mem::take(req).into_parts();
        let result = self.verify(&parts, body, target).await;
        match result {
            Ok((cx, body)) => {
                *req = Request::from_parts(parts, body);
                Ok(cx)
            }
            Err(err) => {
                debug!(code = %err.code(), message = ?err.message(), "authentication failed");
                *req = Request::from_parts(parts, Body::empty());
                Err(err)
            }
        }
    }

    /// Decides whether an authenticated request may proceed.
    ///
    /// # Errors
    /// Returns `AccessDenied` if the request is not allowed
    pub async fn authorize(&self, cx: &RequestAuthContext) -> S3Result {
        self.gate.authorize(cx).await
    }

    /// Authenticates and then authorizes a request.
    ///
    /// # Errors
    /// Returns the first check that failed
    pub async fn check(&self, req: &mut Request<Body>, target: S3Target) -> S3Result<RequestAuthContext> {
        let cx = self.authenticate(req, target).await?;
        self.authorize(&cx).await?;
        Ok(cx)
    }

    async fn verify(&self, parts: &Parts, body: Body, target: S3Target) -> S3Result<(RequestAuthContext, Body)> {
        let config = self.config.snapshot();
        let now = self.clock.now();

        let hs = OrderedHeaders::from_headers(&parts.headers).map_err(|e| invalid_request!(e, "invalid header value"))?;
        let qs = match parts.uri.query() {
            Some(query) => Some(OrderedQs::parse(query).map_err(|e| s3_error!(e, InvalidURI, "invalid query"))?),
            None => None,
        };

        let auth_type = auth_type::classify(&parts.method, &hs, qs.as_ref());
        debug!(?auth_type);
        if !auth_type.is_supported() {
            return Err(s3_error!(SignatureVersionNotSupported));
        }

        let decoded_uri_path = urlencoding::decode(parts.uri.path())
            .map_err(|e| s3_error!(e, InvalidURI, "invalid path"))?
            .into_owned();

        let (verified, checks, form_fields, body) = {
            let mut scx = SignatureContext {
                config: &config,
                store: &*self.store,
                now,
                req_method: &parts.method,
                req_uri: &parts.uri,
                req_body: body,
                qs: qs.as_ref(),
                hs,
                decoded_uri_path,
                action: target.action,
                bucket: target.bucket.as_deref(),
                vh_bucket: target.vh_bucket(),
                checks: ContentChecks::default(),
                aws_chunked: false,
                form_fields: None,
            };
            let verified = scx.check(auth_type).await?;
            (verified, scx.checks, scx.form_fields, scx.req_body)
        };

        let body = if checks.is_empty() {
            body
        } else {
            Body::from(into_dyn(IntegrityStream::new(body, checks)))
        };

        let mut cx = RequestAuthContext::new(auth_type, target);
        if let Some(verified) = verified {
            cx.is_owner = self.store.is_owner(&verified.credentials);
            cx.credentials = Some(verified.credentials);
            cx.region = verified.region;
        }
        cx.form_fields = form_fields;

        if auth_type == AuthType::FederatedToken {
            debug!("federated token request passes through unauthenticated");
        }

        Ok((cx, body))
    }
}
