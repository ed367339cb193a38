//! Static response pages loaded once at startup.

use std::collections::HashMap;
use std::fs;

use camino::Utf8Path;

use super::{ContentError, MimeTypes};
use crate::http::{Body, Response};

/// Pages served for fixed outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Page {
    MethodNotSupported,
    Forbidden,
    NotFound,
    InsufficientStorage,
    UploadComplete,
    VersionNotSupported,
    InternalServerError,
    Unauthorized,
}

impl Page {
    pub(crate) const ALL: [Self; 8] = [
        Self::MethodNotSupported,
        Self::Forbidden,
        Self::NotFound,
        Self::InsufficientStorage,
        Self::UploadComplete,
        Self::VersionNotSupported,
        Self::InternalServerError,
        Self::Unauthorized,
    ];

    pub(crate) const fn file_name(self) -> &'static str {
        match self {
            Self::MethodNotSupported => "HTTP_METHOD_NOT_SUPPORTED.html",
            Self::Forbidden => "HTTP_FORBIDDEN.html",
            Self::NotFound => "HTTP_NOT_FOUND.html",
            Self::InsufficientStorage => "HTTP_INSUFFICIENT_STORAGE.html",
            Self::UploadComplete => "HTTP_UPLOAD_COMPLETE.html",
            Self::VersionNotSupported => "HTTP_VERSION_NOT_SUPPORTED.html",
            Self::InternalServerError => "HTTP_INTERNAL_SERVER_ERROR.html",
            Self::Unauthorized => "HTTP_UNAUTHORIZED.html",
        }
    }

    pub(crate) const fn status(self) -> u16 {
        match self {
            Self::MethodNotSupported => 406,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InsufficientStorage => 507,
            Self::UploadComplete => 200,
            Self::VersionNotSupported => 505,
            Self::InternalServerError => 500,
            Self::Unauthorized => 401,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedPage {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Every [`Page`] read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StaticPages {
    pages: HashMap<Page, LoadedPage>,
}

impl StaticPages {
    /// Loads all pages from `dir`. A missing or empty page is an error.
    pub(crate) fn load(dir: &Utf8Path, mime: &MimeTypes) -> Result<Self, ContentError> {
        let mut pages = HashMap::with_capacity(Page::ALL.len());
        for page in Page::ALL {
            let path = dir.join(page.file_name());
            let bytes = fs::read(&path).map_err(|source| ContentError::Read {
                path: path.clone(),
                source,
            })?;
            if bytes.is_empty() {
                return Err(ContentError::EmptyPage { path });
            }
            let content_type = mime.lookup(path.as_str()).map(str::to_owned);
            pages.insert(
                page,
                LoadedPage {
                    content_type,
                    bytes,
                },
            );
        }
        Ok(Self { pages })
    }

    /// A response carrying `page` with its fixed status.
    pub(crate) fn response(&self, page: Page) -> Response {
        let response = Response::new(page.status());
        let Some(loaded) = self.pages.get(&page) else {
            return response;
        };
        let response = match &loaded.content_type {
            Some(content_type) => response.header("Content-Type", content_type.as_str()),
            None => response,
        };
        response.body(Body::Bytes(loaded.bytes.clone()))
    }
}
