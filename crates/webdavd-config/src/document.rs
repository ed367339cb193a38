//! Raw TOML schema. Values here are unvalidated; see [`crate::Config`].

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::listen::Encryption;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Document {
    #[serde(default)]
    pub(crate) server: Vec<ServerDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct ServerDocument {
    #[serde(default)]
    pub(crate) listen: Vec<ListenDocument>,
    pub(crate) restricted: Option<String>,
    pub(crate) session_timeout: Option<TimeoutValue>,
    pub(crate) max_ip_connections: Option<u32>,
    pub(crate) rap_timeout: Option<u32>,
    pub(crate) mime_file: Option<Utf8PathBuf>,
    pub(crate) rap_binary: Option<Utf8PathBuf>,
    pub(crate) auth_service: Option<String>,
    pub(crate) access_log: Option<Utf8PathBuf>,
    pub(crate) error_log: Option<Utf8PathBuf>,
    pub(crate) static_response_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub(crate) ssl_cert: Vec<CertificateDocument>,
}

/// `session-timeout` may be written as text or as bare seconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TimeoutValue {
    Seconds(u32),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct ListenDocument {
    pub(crate) port: u16,
    pub(crate) host: Option<String>,
    #[serde(default)]
    pub(crate) encryption: Encryption,
    pub(crate) forward_to: Option<ForwardDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ForwardDocument {
    pub(crate) host: Option<String>,
    pub(crate) port: u16,
    pub(crate) encryption: Option<Encryption>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CertificateDocument {
    pub(crate) certificate: Utf8PathBuf,
    pub(crate) key: Utf8PathBuf,
    #[serde(default)]
    pub(crate) chain: Vec<Utf8PathBuf>,
}
