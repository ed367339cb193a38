use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading startup content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A content file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A static response page exists but holds no bytes.
    #[error("static response page {path} is empty")]
    EmptyPage {
        /// Offending page.
        path: Utf8PathBuf,
    },
}
