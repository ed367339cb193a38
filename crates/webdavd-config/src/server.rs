//! Validated per-server settings.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use crate::defaults::{
    DEFAULT_AUTH_SERVICE, DEFAULT_MAX_IP_CONNECTIONS, DEFAULT_RAP_TIMEOUT,
    DEFAULT_SESSION_TIMEOUT, default_mime_file, default_rap_binary, default_static_response_dir,
};
use crate::document::{CertificateDocument, ListenDocument, ServerDocument, TimeoutValue};
use crate::listen::{Encryption, ForwardTo, ListenSpec};
use crate::session::parse_session_timeout;
use crate::ConfigError;

/// Certificate, key, and chain files for one TLS identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    certificate: Utf8PathBuf,
    key: Utf8PathBuf,
    chain: Vec<Utf8PathBuf>,
}

impl CertificateBundle {
    /// Certificate file.
    #[must_use]
    pub fn certificate(&self) -> &Utf8Path {
        &self.certificate
    }

    /// Private key file.
    #[must_use]
    pub fn key(&self) -> &Utf8Path {
        &self.key
    }

    /// Intermediate certificates, in order.
    #[must_use]
    pub fn chain(&self) -> &[Utf8PathBuf] {
        &self.chain
    }
}

impl From<CertificateDocument> for CertificateBundle {
    fn from(document: CertificateDocument) -> Self {
        Self {
            certificate: document.certificate,
            key: document.key,
            chain: document.chain,
        }
    }
}

/// Immutable settings of one `[[server]]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    listen: Vec<ListenSpec>,
    restricted_user: Option<String>,
    session_timeout: Duration,
    max_ip_connections: u32,
    rap_timeout: Duration,
    mime_file: Utf8PathBuf,
    rap_binary: Utf8PathBuf,
    auth_service: String,
    access_log: Option<Utf8PathBuf>,
    error_log: Option<Utf8PathBuf>,
    static_response_dir: Utf8PathBuf,
    certificates: Vec<CertificateBundle>,
}

impl ServerConfig {
    pub(crate) fn from_document(
        index: usize,
        document: ServerDocument,
    ) -> Result<Self, ConfigError> {
        if document.listen.is_empty() {
            return Err(ConfigError::NoListen { server: index });
        }

        let certificates: Vec<CertificateBundle> = document
            .ssl_cert
            .into_iter()
            .map(CertificateBundle::from)
            .collect();
        let listen: Vec<ListenSpec> = document.listen.into_iter().map(listen_spec).collect();
        if certificates.is_empty()
            && let Some(tls) = listen
                .iter()
                .find(|spec| spec.encryption() == Encryption::Tls)
        {
            return Err(ConfigError::MissingCertificate {
                server: index,
                port: tls.port(),
            });
        }

        let session_timeout = match document.session_timeout {
            None => DEFAULT_SESSION_TIMEOUT,
            Some(TimeoutValue::Seconds(seconds)) => Duration::from_secs(u64::from(seconds)),
            Some(TimeoutValue::Text(text)) => {
                parse_session_timeout(&text).map_err(|source| ConfigError::SessionTimeout {
                    server: index,
                    value: text.clone(),
                    source,
                })?
            }
        };

        Ok(Self {
            listen,
            restricted_user: document.restricted,
            session_timeout: non_zero_or(session_timeout, DEFAULT_SESSION_TIMEOUT),
            max_ip_connections: match document.max_ip_connections {
                Some(0) | None => DEFAULT_MAX_IP_CONNECTIONS,
                Some(limit) => limit,
            },
            rap_timeout: match document.rap_timeout {
                Some(0) | None => DEFAULT_RAP_TIMEOUT,
                Some(seconds) => Duration::from_secs(u64::from(seconds)),
            },
            mime_file: document.mime_file.unwrap_or_else(default_mime_file),
            rap_binary: document.rap_binary.unwrap_or_else(default_rap_binary),
            auth_service: document
                .auth_service
                .unwrap_or_else(|| DEFAULT_AUTH_SERVICE.to_owned()),
            access_log: document.access_log,
            error_log: document.error_log,
            static_response_dir: document
                .static_response_dir
                .map_or_else(default_static_response_dir, trim_trailing_slash),
            certificates,
        })
    }

    /// Sockets this server listens on.
    #[must_use]
    pub fn listen(&self) -> &[ListenSpec] {
        &self.listen
    }

    /// Account the listener switches to after binding.
    #[must_use]
    pub fn restricted_user(&self) -> Option<&str> {
        self.restricted_user.as_deref()
    }

    /// Lifetime of an authenticated session.
    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Concurrent connections allowed per client address.
    #[must_use]
    pub const fn max_ip_connections(&self) -> u32 {
        self.max_ip_connections
    }

    /// How long to wait for any RAP reply.
    #[must_use]
    pub const fn rap_timeout(&self) -> Duration {
        self.rap_timeout
    }

    /// `mime.types` file used for `Content-Type`.
    #[must_use]
    pub fn mime_file(&self) -> &Utf8Path {
        &self.mime_file
    }

    /// RAP executable.
    #[must_use]
    pub fn rap_binary(&self) -> &Utf8Path {
        &self.rap_binary
    }

    /// Authentication service name the RAP uses.
    #[must_use]
    pub fn auth_service(&self) -> &str {
        &self.auth_service
    }

    /// Access log file, when configured.
    #[must_use]
    pub fn access_log(&self) -> Option<&Utf8Path> {
        self.access_log.as_deref()
    }

    /// Error log file, when configured.
    #[must_use]
    pub fn error_log(&self) -> Option<&Utf8Path> {
        self.error_log.as_deref()
    }

    /// Directory holding the static response pages, without a trailing `/`.
    #[must_use]
    pub fn static_response_dir(&self) -> &Utf8Path {
        &self.static_response_dir
    }

    /// TLS identities.
    #[must_use]
    pub fn certificates(&self) -> &[CertificateBundle] {
        &self.certificates
    }
}

fn listen_spec(document: ListenDocument) -> ListenSpec {
    let spec = ListenSpec::new(document.host, document.port).with_encryption(document.encryption);
    match document.forward_to {
        Some(forward) => spec.with_forward_to(ForwardTo::new(
            forward.host,
            forward.port,
            forward.encryption,
        )),
        None => spec,
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() { fallback } else { value }
}

fn trim_trailing_slash(path: Utf8PathBuf) -> Utf8PathBuf {
    let trimmed = path.as_str().trim_end_matches('/');
    if trimmed.is_empty() {
        path
    } else {
        Utf8PathBuf::from(trimmed)
    }
}
