//! S3 error type

mod code;
pub use self::code::S3ErrorCode;

use std::borrow::Cow;
use std::fmt;

use hyper::HeaderMap;
use hyper::StatusCode;

pub type StdError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type S3Result<T = (), E = S3Error> = std::result::Result<T, E>;

/// An error rendered as an S3 error response
pub struct S3Error(Box<Inner>);

#[derive(Debug)]
struct Inner {
    code: S3ErrorCode,
    message: Option<Cow<'static, str>>,
    resource: Option<String>,
    request_id: Option<String>,
    status_code: Option<StatusCode>,
    source: Option<StdError>,
    headers: Option<HeaderMap>,
}

/// Creates an [`S3Error`] from an error code, an optional source and an optional message.
#[macro_export]
macro_rules! s3_error {
    ($code:ident) => {
        $crate::S3Error::new($crate::S3ErrorCode::$code)
    };
    ($code:ident, $msg:literal $(,)?) => {
        $crate::S3Error::with_message($crate::S3ErrorCode::$code, ::std::format!($msg))
    };
    ($code:ident, $fmt:literal, $($arg:tt)+) => {
        $crate::S3Error::with_message($crate::S3ErrorCode::$code, ::std::format!($fmt, $($arg)+))
    };
    ($source:expr, $code:ident) => {{
        let mut err = $crate::S3Error::new($crate::S3ErrorCode::$code);
        err.set_source(::std::boxed::Box::new($source));
        err
    }};
    ($source:expr, $code:ident, $msg:literal $(,)?) => {{
        let mut err = $crate::S3Error::with_message($crate::S3ErrorCode::$code, ::std::format!($msg));
        err.set_source(::std::boxed::Box::new($source));
        err
    }};
    ($source:expr, $code:ident, $fmt:literal, $($arg:tt)+) => {{
        let mut err = $crate::S3Error::with_message($crate::S3ErrorCode::$code, ::std::format!($fmt, $($arg)+));
        err.set_source(::std::boxed::Box::new($source));
        err
    }};
}

macro_rules! invalid_request {
    ($msg:literal $(,)?) => {
        $crate::s3_error!(InvalidRequest, $msg)
    };
    ($fmt:literal, $($arg:tt)+) => {
        $crate::s3_error!(InvalidRequest, $fmt, $($arg)+)
    };
    ($source:expr, $msg:literal $(,)?) => {
        $crate::s3_error!($source, InvalidRequest, $msg)
    };
    ($source:expr, $fmt:literal, $($arg:tt)+) => {
        $crate::s3_error!($source, InvalidRequest, $fmt, $($arg)+)
    };
}

impl S3Error {
    #[must_use]
    pub fn new(code: S3ErrorCode) -> Self {
        Self(Box::new(Inner {
            code,
            message: None,
            resource: None,
            request_id: None,
            status_code: None,
            source: None,
            headers: None,
        }))
    }

    #[must_use]
    pub fn with_message(code: S3ErrorCode, msg: impl Into<Cow<'static, str>>) -> Self {
        let mut this = Self::new(code);
        this.0.message = Some(msg.into());
        this
    }

    #[must_use]
    pub fn with_source(code: S3ErrorCode, source: StdError) -> Self {
        let mut this = Self::new(code);
        this.0.source = Some(source);
        this
    }

    /// Recovers an [`S3Error`] from an error produced while reading a request body.
    ///
    /// Verifying body wrappers fail with a boxed `S3Error`.
    /// Any other error means the body was cut short.
    #[must_use]
    pub fn from_body_error(err: StdError) -> Self {
        match err.downcast::<S3Error>() {
            Ok(e) => *e,
            Err(source) => Self::with_source(S3ErrorCode::IncompleteBody, source),
        }
    }

    pub fn set_code(&mut self, code: S3ErrorCode) {
        self.0.code = code;
    }

    pub fn set_message(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.0.message = Some(msg.into());
    }

    pub fn set_resource(&mut self, resource: impl Into<String>) {
        self.0.resource = Some(resource.into());
    }

    pub fn set_request_id(&mut self, request_id: impl Into<String>) {
        self.0.request_id = Some(request_id.into());
    }

    pub fn set_source(&mut self, source: StdError) {
        self.0.source = Some(source);
    }

    pub fn set_status_code(&mut self, status_code: StatusCode) {
        self.0.status_code = Some(status_code);
    }

    pub fn set_headers(&mut self, headers: HeaderMap) {
        self.0.headers = Some(headers);
    }

    #[must_use]
    pub fn code(&self) -> S3ErrorCode {
        self.0.code
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.0.message.as_deref()
    }

    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.0.resource.as_deref()
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.0.request_id.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.0.source.as_deref()
    }

    /// Returns the HTTP status of this error.
    /// An explicit status set with [`S3Error::set_status_code`] takes precedence over the code's status.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.0.status_code.unwrap_or_else(|| self.0.code.status_code())
    }

    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.0.headers.as_ref()
    }

    pub(crate) fn take_headers(&mut self) -> Option<HeaderMap> {
        self.0.headers.take()
    }
}

impl From<S3ErrorCode> for S3Error {
    fn from(code: S3ErrorCode) -> Self {
        Self::new(code)
    }
}

impl fmt::Debug for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("S3Error");
        d.field("code", &self.0.code);
        if let Some(ref message) = self.0.message {
            d.field("message", message);
        }
        if let Some(ref source) = self.0.source {
            d.field("source", source);
        }
        if let Some(ref status_code) = self.0.status_code {
            d.field("status_code", status_code);
        }
        d.finish_non_exhaustive()
    }
}

impl fmt::Display for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S3Error: code: {}", self.0.code)?;
        if let Some(ref message) = self.0.message {
            write!(f, ", message: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for S3Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = self.0.source.as_deref()?;
        Some(source)
    }
}
