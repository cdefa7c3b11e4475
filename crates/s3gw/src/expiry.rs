//! Expiry parsing
//!
//! Expiries arrive in several shapes: relative seconds (`X-Amz-Expires`),
//! absolute unix timestamps (presigned V2 `Expires`), RFC 3339 instants
//! (POST policy `expiration`) or durations built in code.
//! All of them are validated into one [`Duration`] measured from an anchor instant.

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// An expiry in one of its accepted representations
#[derive(Debug, Clone, Copy)]
pub enum ExpiryInput<'a> {
    /// Seconds after the anchor
    Seconds(i64),
    /// Decimal text of seconds after the anchor
    Text(&'a str),
    /// Seconds since the unix epoch
    UnixTime(i64),
    /// An RFC 3339 instant
    Iso8601(&'a str),
    /// A duration after the anchor
    Duration(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpiryError {
    #[error("expiry is negative")]
    Negative,
    #[error("expiry is malformed: {0:?}")]
    Malformed(String),
    #[error("expiry is out of range")]
    OutOfRange,
}

/// Parses an expiry into the time remaining after `anchor`.
///
/// Relative inputs must not be negative.
/// Absolute inputs may lie before `anchor`, which yields a negative duration.
///
/// # Errors
/// Returns [`ExpiryError`] when the input is negative, malformed or not representable.
pub fn parse_expiry(input: ExpiryInput<'_>, anchor: OffsetDateTime) -> Result<Duration, ExpiryError> {
    match input {
        ExpiryInput::Seconds(secs) => {
            if secs < 0 {
                return Err(ExpiryError::Negative);
            }
            Ok(Duration::seconds(secs))
        }
        ExpiryInput::Text(s) => {
            let secs = parse_decimal(s)?;
            parse_expiry(ExpiryInput::Seconds(secs), anchor)
        }
        ExpiryInput::UnixTime(ts) => {
            if ts < 0 {
                return Err(ExpiryError::Negative);
            }
            let at = OffsetDateTime::from_unix_timestamp(ts).map_err(|_| ExpiryError::OutOfRange)?;
            Ok(at - anchor)
        }
        ExpiryInput::Iso8601(s) => {
            let at = OffsetDateTime::parse(s, &Rfc3339).map_err(|_| ExpiryError::Malformed(s.to_owned()))?;
            Ok(at - anchor)
        }
        ExpiryInput::Duration(d) => {
            if d.is_negative() {
                return Err(ExpiryError::Negative);
            }
            Ok(d)
        }
    }
}

fn parse_decimal(s: &str) -> Result<i64, ExpiryError> {
    let malformed = || ExpiryError::Malformed(s.to_owned());
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let value = atoi::atoi::<i64>(s.as_bytes()).ok_or(ExpiryError::OutOfRange)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use time::macros::datetime;

    const ANCHOR: OffsetDateTime = datetime!(2013-05-24 00:00:00 UTC);

    #[test]
    fn relative() {
        assert_eq!(parse_expiry(ExpiryInput::Seconds(60), ANCHOR), Ok(Duration::seconds(60)));
        assert_eq!(parse_expiry(ExpiryInput::Text("86400"), ANCHOR), Ok(Duration::days(1)));
        assert_eq!(parse_expiry(ExpiryInput::Duration(Duration::minutes(5)), ANCHOR), Ok(Duration::seconds(300)));
    }

    #[test]
    fn absolute() {
        let ts = ANCHOR.unix_timestamp() + 3600;
        assert_eq!(parse_expiry(ExpiryInput::UnixTime(ts), ANCHOR), Ok(Duration::hours(1)));

        let past = parse_expiry(ExpiryInput::Iso8601("2013-05-23T23:59:00Z"), ANCHOR).unwrap();
        assert_eq!(past, Duration::seconds(-60));
    }

    #[test]
    fn rejected() {
        assert_eq!(parse_expiry(ExpiryInput::Seconds(-1), ANCHOR), Err(ExpiryError::Negative));
        assert_eq!(parse_expiry(ExpiryInput::Text("-5"), ANCHOR), Err(ExpiryError::Negative));
        assert_eq!(parse_expiry(ExpiryInput::UnixTime(-1), ANCHOR), Err(ExpiryError::Negative));
        assert_eq!(
            parse_expiry(ExpiryInput::Duration(Duration::seconds(-1)), ANCHOR),
            Err(ExpiryError::Negative)
        );
        assert!(matches!(parse_expiry(ExpiryInput::Text("1h"), ANCHOR), Err(ExpiryError::Malformed(_))));
        assert!(matches!(parse_expiry(ExpiryInput::Text(""), ANCHOR), Err(ExpiryError::Malformed(_))));
        assert_eq!(
            parse_expiry(ExpiryInput::Text("99999999999999999999"), ANCHOR),
            Err(ExpiryError::OutOfRange)
        );
        assert_eq!(parse_expiry(ExpiryInput::UnixTime(i64::MAX), ANCHOR), Err(ExpiryError::OutOfRange));
        assert!(matches!(
            parse_expiry(ExpiryInput::Iso8601("tomorrow"), ANCHOR),
            Err(ExpiryError::Malformed(_))
        ));
    }
}
