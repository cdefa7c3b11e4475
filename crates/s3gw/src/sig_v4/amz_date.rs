//! x-amz-date

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// A timestamp in the `YYYYMMDD'T'HHMMSS'Z'` format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AmzDate {
    inner: OffsetDateTime,
}

/// [`AmzDate`]
#[derive(Debug, thiserror::Error)]
#[error("ParseAmzDateError")]
pub struct ParseAmzDateError(());

const ISO8601_BASIC: &[FormatItem<'static>] = format_description!("[year][month][day]T[hour][minute][second]Z");

const DATE: &[FormatItem<'static>] = format_description!("[year][month][day]");

/// RFC 1123, the form of the `Date` header
const HTTP_DATE: &[FormatItem<'static>] =
    format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");

impl AmzDate {
    /// Parses `AmzDate` from header
    /// # Errors
    /// Returns an error if the header is invalid
    pub fn parse(header: &str) -> Result<Self, ParseAmzDateError> {
        if header.len() != 16 {
            return Err(ParseAmzDateError(()));
        }
        let t = PrimitiveDateTime::parse(header, ISO8601_BASIC).map_err(|_| ParseAmzDateError(()))?;
        Ok(Self { inner: t.assume_utc() })
    }

    /// Parses an HTTP `Date` header such as `Fri, 24 May 2013 00:00:00 GMT`
    /// # Errors
    /// Returns an error if the header is invalid
    pub fn parse_http_date(header: &str) -> Result<Self, ParseAmzDateError> {
        let t = PrimitiveDateTime::parse(header, HTTP_DATE).map_err(|_| ParseAmzDateError(()))?;
        Ok(Self { inner: t.assume_utc() })
    }

    #[must_use]
    pub fn from_time(t: OffsetDateTime) -> Self {
        let t = t.to_offset(time::UtcOffset::UTC).replace_nanosecond(0).unwrap_or(t);
        Self { inner: t }
    }

    /// `{YYYY}{MM}{DD}T{HH}{MM}{SS}Z`
    #[must_use]
    pub fn fmt_iso8601(&self) -> String {
        self.inner.format(ISO8601_BASIC).unwrap_or_default()
    }

    /// `{YYYY}{MM}{DD}`
    #[must_use]
    pub fn fmt_date(&self) -> String {
        self.inner.format(DATE).unwrap_or_default()
    }

    #[must_use]
    pub fn to_time(&self) -> OffsetDateTime {
        self.inner
    }
}
