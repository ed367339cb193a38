use std::time::Duration;

use camino::Utf8PathBuf;

/// Configuration file read when neither `--config` nor `WEBDAVD_CONFIG` is
/// given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/webdavd/webdavd.toml";

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Concurrent connections allowed from one client address.
pub const DEFAULT_MAX_IP_CONNECTIONS: u32 = 20;

/// Lifetime of an authenticated session.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How long the listener waits for a RAP reply.
pub const DEFAULT_RAP_TIMEOUT: Duration = Duration::from_secs(120);

/// System MIME table.
pub const DEFAULT_MIME_FILE: &str = "/etc/mime.types";

/// RAP executable spawned per request.
pub const DEFAULT_RAP_BINARY: &str = "/usr/sbin/webdav-rap";

/// Authentication service name handed to the RAP environment.
pub const DEFAULT_AUTH_SERVICE: &str = "webdav";

/// Directory holding the `HTTP_*.html` response pages.
pub const DEFAULT_STATIC_RESPONSE_DIR: &str = "/usr/share/webdav";

/// Owned log filter value used where allocation is required.
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
pub fn default_log_format() -> crate::cli::LogFormat {
    crate::cli::LogFormat::Json
}

pub(crate) fn default_mime_file() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_MIME_FILE)
}

pub(crate) fn default_rap_binary() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_RAP_BINARY)
}

pub(crate) fn default_static_response_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_STATIC_RESPONSE_DIR)
}
