//! Method mapping and path resolution.

use camino::Utf8Path;
use percent_encoding::percent_decode_str;
use webdavd_protocol::Opcode;

/// RAP operation for an HTTP method. Methods outside the table are refused
/// with `406` before any RAP is started.
pub(crate) fn operation_for(method: &str) -> Option<Opcode> {
    match method {
        "GET" => Some(Opcode::ReadFile),
        "PUT" => Some(Opcode::Put),
        _ => None,
    }
}

/// Joins the percent-decoded request path onto `home`.
///
/// Returns `None` when the path does not decode to UTF-8.
pub(crate) fn resolve_path(home: &Utf8Path, request_path: &str) -> Option<String> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let home = home.as_str().trim_end_matches('/');
    if decoded.starts_with('/') {
        Some(format!("{home}{decoded}"))
    } else {
        Some(format!("{home}/{decoded}"))
    }
}
