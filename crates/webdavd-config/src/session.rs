//! Session lifetime parsing.

use std::time::Duration;

use thiserror::Error;

/// Why a session-timeout value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionTimeoutError {
    /// More than three `:`-separated fields.
    #[error("expected at most three `:`-separated fields")]
    TooManyFields,
    /// A field is empty or contains something other than ASCII digits.
    #[error("field `{field}` is not a non-negative integer")]
    InvalidField {
        /// The offending field.
        field: String,
    },
    /// The total does not fit in a duration.
    #[error("value overflows")]
    Overflow,
}

/// Parses `H:MM:SS`, `M:SS`, or bare seconds.
///
/// Fields are plain decimal digits and may exceed their usual range, so
/// `"0:90"` is ninety seconds.
pub fn parse_session_timeout(text: &str) -> Result<Duration, SessionTimeoutError> {
    let fields: Vec<&str> = text.trim().split(':').collect();
    if fields.len() > 3 {
        return Err(SessionTimeoutError::TooManyFields);
    }

    let mut seconds: u64 = 0;
    for field in fields {
        let value = parse_field(field)?;
        seconds = seconds
            .checked_mul(60)
            .and_then(|total| total.checked_add(value))
            .ok_or(SessionTimeoutError::Overflow)?;
    }
    Ok(Duration::from_secs(seconds))
}

fn parse_field(field: &str) -> Result<u64, SessionTimeoutError> {
    let invalid = || SessionTimeoutError::InvalidField {
        field: field.to_owned(),
    };
    if field.is_empty() || !field.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    field.parse().map_err(|_| SessionTimeoutError::Overflow)
}
