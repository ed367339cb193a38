//! RFC 7231 `IMF-fixdate` formatting.

use std::time::SystemTime;

use time::OffsetDateTime;
use time::macros::format_description;

/// Formats `at` for `Date` and `Last-Modified` headers.
pub(crate) fn http_date(at: SystemTime) -> Option<String> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    OffsetDateTime::from(at).format(format).ok()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use rstest::rstest;

    use super::http_date;

    #[rstest]
    #[case(0, "Thu, 01 Jan 1970 00:00:00 GMT")]
    #[case(784_111_777, "Sun, 06 Nov 1994 08:49:37 GMT")]
    fn formats_imf_fixdate(#[case] seconds: u64, #[case] expected: &str) {
        let at = UNIX_EPOCH + Duration::from_secs(seconds);
        assert_eq!(http_date(at).as_deref(), Some(expected));
    }
}
