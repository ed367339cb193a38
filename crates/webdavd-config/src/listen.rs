//! Listen endpoints and redirect targets.

use std::fmt;

use serde::Deserialize;

/// Transport security of a listen socket or redirect target.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    /// Plain HTTP.
    #[default]
    None,
    /// HTTPS. Certificates come from the server's `ssl-cert` entries.
    #[serde(alias = "ssl")]
    Tls,
}

impl Encryption {
    /// URL scheme for this encryption.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::None => "http",
            Self::Tls => "https",
        }
    }

    /// Port implied by the scheme, omitted from redirect URLs.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 80,
            Self::Tls => 443,
        }
    }
}

/// Where a listener redirects every request instead of serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTo {
    host: Option<String>,
    port: u16,
    encryption: Encryption,
}

impl ForwardTo {
    /// Creates a redirect target. Without an explicit encryption, port 443
    /// implies TLS.
    #[must_use]
    pub fn new(host: Option<String>, port: u16, encryption: Option<Encryption>) -> Self {
        let encryption = encryption.unwrap_or(if port == 443 {
            Encryption::Tls
        } else {
            Encryption::None
        });
        Self {
            host,
            port,
            encryption,
        }
    }

    /// Target host. `None` reuses the request's `Host` without its port.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Target port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Target encryption.
    #[must_use]
    pub const fn encryption(&self) -> Encryption {
        self.encryption
    }

    /// Builds the absolute redirect URL for `path`.
    ///
    /// `request_host` is the request's `Host` header; any port it carries is
    /// dropped.
    #[must_use]
    pub fn location(&self, request_host: &str, path: &str) -> String {
        let host = self.host.as_deref().unwrap_or_else(|| strip_port(request_host));
        let scheme = self.encryption.scheme();
        if self.port == self.encryption.default_port() {
            format!("{scheme}://{host}{path}")
        } else {
            format!("{scheme}://{host}:{port}{path}", port = self.port)
        }
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // Bracketed IPv6 literal: keep through the closing bracket.
        return host.find(']').and_then(|end| host.get(..=end)).unwrap_or(host);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

/// One socket the server listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenSpec {
    host: Option<String>,
    port: u16,
    encryption: Encryption,
    forward_to: Option<ForwardTo>,
}

impl ListenSpec {
    /// Creates a plain listen entry.
    #[must_use]
    pub const fn new(host: Option<String>, port: u16) -> Self {
        Self {
            host,
            port,
            encryption: Encryption::None,
            forward_to: None,
        }
    }

    /// Sets the transport encryption.
    #[must_use]
    pub const fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    /// Turns the listener into a redirector.
    #[must_use]
    pub fn with_forward_to(mut self, forward_to: ForwardTo) -> Self {
        self.forward_to = Some(forward_to);
        self
    }

    /// Interface to bind. `None` binds every interface.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Host to hand to the resolver.
    #[must_use]
    pub fn bind_host(&self) -> &str {
        self.host.as_deref().unwrap_or("0.0.0.0")
    }

    /// Port to bind.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Transport encryption.
    #[must_use]
    pub const fn encryption(&self) -> Encryption {
        self.encryption
    }

    /// Redirect target, when this listener only redirects.
    #[must_use]
    pub const fn forward_to(&self) -> Option<&ForwardTo> {
        self.forward_to.as_ref()
    }
}

impl fmt::Display for ListenSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}://{}:{}",
            self.encryption.scheme(),
            self.bind_host(),
            self.port
        )
    }
}
