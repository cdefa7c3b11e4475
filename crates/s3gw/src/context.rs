//! Per-request authentication results

use crate::access::Action;
use crate::auth::Credentials;
use crate::auth_type::AuthType;

/// What a request operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Target {
    pub action: Action,
    pub bucket: Option<String>,
    pub object: Option<String>,
    /// Was the bucket taken from the `Host` header?
    pub virtual_hosted: bool,
}

impl S3Target {
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            bucket: None,
            object: None,
            virtual_hosted: false,
        }
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    #[must_use]
    pub fn with_virtual_host(mut self) -> Self {
        self.virtual_hosted = true;
        self
    }

    /// The bucket name when it came from the `Host` header
    #[must_use]
    pub fn vh_bucket(&self) -> Option<&str> {
        if self.virtual_hosted { self.bucket.as_deref() } else { None }
    }
}

/// The outcome of authenticating one request
///
/// It is created by [`AuthPipeline::authenticate`](crate::pipeline::AuthPipeline::authenticate)
/// and travels with the request until the response is sent.
#[derive(Debug)]
pub struct RequestAuthContext {
    pub(crate) auth_type: AuthType,
    pub(crate) target: S3Target,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) is_owner: bool,
    pub(crate) region: Option<String>,
    pub(crate) form_fields: Option<Vec<(String, String)>>,
}

impl RequestAuthContext {
    pub(crate) fn new(auth_type: AuthType, target: S3Target) -> Self {
        Self {
            auth_type,
            target,
            credentials: None,
            is_owner: false,
            region: None,
            form_fields: None,
        }
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    #[must_use]
    pub fn target(&self) -> &S3Target {
        &self.target
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.target.action
    }

    /// The verified credentials. `None` for anonymous requests.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// The region of the credential scope
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// The fields of a verified POST policy form, with lowercase names
    #[must_use]
    pub fn form_fields(&self) -> Option<&[(String, String)]> {
        self.form_fields.as_deref()
    }

    /// Finds a field of a verified POST policy form by its lowercase name
    #[must_use]
    pub fn form_field(&self, name: &str) -> Option<&str> {
        let fields = self.form_fields.as_deref()?;
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target() {
        let target = S3Target::new(Action::GetObject).with_bucket("examplebucket").with_object("test.txt");
        assert_eq!(target.vh_bucket(), None);
        assert_eq!(target.clone().with_virtual_host().vh_bucket(), Some("examplebucket"));
    }

    #[test]
    fn anonymous_context() {
        let mut cx = RequestAuthContext::new(AuthType::PostPolicy, S3Target::new(Action::PostObject));
        assert!(cx.is_anonymous());
        assert!(!cx.is_owner());
        assert_eq!(cx.form_field("key"), None);

        cx.form_fields = Some(vec![("key".to_owned(), "photos/a.jpg".to_owned())]);
        assert_eq!(cx.form_field("key"), Some("photos/a.jpg"));
    }
}
