//! `Authorization: Basic` decoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use webdavd_protocol::Credentials;

use super::RequestHead;

/// Extracts Basic credentials from the request, if any are present and
/// well formed.
pub(crate) fn basic_credentials(head: &RequestHead) -> Option<Credentials> {
    let value = head.header("Authorization")?.trim();
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, secret) = decoded.split_once(':')?;
    if user.is_empty() {
        return None;
    }
    Some(Credentials::new(user, secret))
}
