//! Pipeline configuration
//!
//! The pipeline reads its settings through an [`AuthConfigProvider`].
//! Each request takes one snapshot, so all of its checks see the same values.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use s3gw::config::{AuthConfig, AuthConfigProvider, HotReloadConfigProvider, StaticConfigProvider};
//!
//! let mut config = AuthConfig::default();
//! config.region = "eu-west-1".into();
//!
//! let static_provider = StaticConfigProvider::new(Arc::new(config.clone()));
//! assert_eq!(static_provider.snapshot().region, "eu-west-1");
//!
//! let hot_reload_provider = HotReloadConfigProvider::default();
//! assert_eq!(hot_reload_provider.snapshot().region, "us-east-1");
//!
//! hot_reload_provider.update(Arc::new(config));
//! assert_eq!(hot_reload_provider.snapshot().region, "eu-west-1");
//! ```

use crate::http::MultipartLimits;

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Supplies configuration snapshots to the pipeline.
///
/// Built-in providers:
/// - [`StaticConfigProvider`] - Immutable configuration
/// - [`HotReloadConfigProvider`] - Runtime-updatable configuration
pub trait AuthConfigProvider: Send + Sync + 'static {
    /// Returns a snapshot of the current configuration.
    ///
    /// The snapshot does not change even if the underlying configuration is updated.
    fn snapshot(&self) -> Arc<AuthConfig>;
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct AuthConfig {
    /// The region credential scopes must name.
    ///
    /// An empty region disables the check.
    ///
    /// Default: `us-east-1`
    pub region: String,

    /// Maximum allowed difference between `X-Amz-Date` and the server clock, in seconds.
    ///
    /// Default: 900 (15 minutes)
    pub max_skew_time_secs: u32,

    /// Maximum `X-Amz-Expires` of presigned URLs, in seconds.
    ///
    /// Default: 604800 (7 days)
    pub max_presigned_expires_secs: u32,

    /// Maximum size of an STS request body, which is read into memory to be hashed.
    ///
    /// Default: 10 MB (10 * 1024 * 1024)
    pub max_sts_body_size: usize,

    /// Maximum size per form field in bytes.
    ///
    /// Default: 1 MB (1024 * 1024)
    pub max_form_field_size: usize,

    /// Maximum total size for all form fields combined in bytes.
    ///
    /// Default: 20 MB (20 * 1024 * 1024)
    pub max_form_fields_size: usize,

    /// Maximum number of parts in a multipart form.
    ///
    /// Default: 1000
    pub max_form_parts: usize,

    /// Answer anonymous browser requests that are denied with a redirect instead of an error.
    ///
    /// Default: true
    pub browser_redirect: bool,

    /// The value of `HostId` in error responses.
    ///
    /// Default: `-`
    pub host_id: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_owned(),
            max_skew_time_secs: 900,                  // 15 minutes
            max_presigned_expires_secs: 7 * 24 * 3600, // 7 days
            max_sts_body_size: 10 * 1024 * 1024,      // 10 MB
            max_form_field_size: 1024 * 1024,         // 1 MB
            max_form_fields_size: 20 * 1024 * 1024,   // 20 MB
            max_form_parts: 1000,
            browser_redirect: true,
            host_id: "-".to_owned(),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn multipart_limits(&self) -> MultipartLimits {
        MultipartLimits {
            max_field_size: self.max_form_field_size,
            max_fields_size: self.max_form_fields_size,
            max_parts: self.max_form_parts,
        }
    }
}

/// Static configuration provider.
#[derive(Debug)]
pub struct StaticConfigProvider {
    inner: Arc<AuthConfig>,
}

impl StaticConfigProvider {
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { inner: config }
    }
}

impl Default for StaticConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(AuthConfig::default()))
    }
}

impl AuthConfigProvider for StaticConfigProvider {
    fn snapshot(&self) -> Arc<AuthConfig> {
        Arc::clone(&self.inner)
    }
}

/// Hot-reload configuration provider.
///
/// Reads are lock-free and updates swap the whole configuration atomically.
#[derive(Debug)]
pub struct HotReloadConfigProvider {
    inner: ArcSwap<AuthConfig>,
}

impl HotReloadConfigProvider {
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self {
            inner: ArcSwap::from(config),
        }
    }

    pub fn update(&self, config: Arc<AuthConfig>) {
        self.inner.store(config);
    }
}

impl Default for HotReloadConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(AuthConfig::default()))
    }
}

impl AuthConfigProvider for HotReloadConfigProvider {
    fn snapshot(&self) -> Arc<AuthConfig> {
        self.inner.load_full()
    }
}
