//! Per-server immutable state shared by every connection handler.

use webdavd_config::ServerConfig;

use crate::content::{ContentError, MimeTypes, Page, StaticPages};
use crate::http::{Body, Response, reason_phrase};

/// Realm advertised in the Basic challenge.
pub(crate) const AUTH_REALM: &str = "webdav";

/// Configuration snapshot plus the content loaded for one `[[server]]`.
#[derive(Debug)]
pub(crate) struct ServerContext {
    server: ServerConfig,
    mime: MimeTypes,
    pages: StaticPages,
}

impl ServerContext {
    /// Loads the MIME table and static pages named by `server`.
    pub(crate) fn load(server: ServerConfig) -> Result<Self, ContentError> {
        let mime = MimeTypes::load(server.mime_file())?;
        let pages = StaticPages::load(server.static_response_dir(), &mime)?;
        Ok(Self::new(server, mime, pages))
    }

    pub(crate) const fn new(server: ServerConfig, mime: MimeTypes, pages: StaticPages) -> Self {
        Self {
            server,
            mime,
            pages,
        }
    }

    pub(crate) const fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub(crate) const fn mime(&self) -> &MimeTypes {
        &self.mime
    }

    pub(crate) fn page(&self, page: Page) -> Response {
        self.pages.response(page)
    }

    /// `401` with the Basic challenge.
    pub(crate) fn unauthorized(&self) -> Response {
        self.page(Page::Unauthorized).header(
            "WWW-Authenticate",
            format!("Basic realm=\"{AUTH_REALM}\""),
        )
    }

    /// Response for `status`, using its static page when one exists and a
    /// plain-text reason otherwise.
    pub(crate) fn status_response(&self, status: u16) -> Response {
        match status {
            401 => self.unauthorized(),
            other => match Page::ALL
                .into_iter()
                .find(|page| *page != Page::UploadComplete && page.status() == other)
            {
                Some(page) => self.page(page),
                None => plain_response(other),
            },
        }
    }
}

/// A status with its reason phrase as a `text/plain` body.
pub(crate) fn plain_response(status: u16) -> Response {
    Response::new(status)
        .header("Content-Type", "text/plain")
        .body(Body::Bytes(format!("{}\n", reason_phrase(status)).into_bytes()))
}
