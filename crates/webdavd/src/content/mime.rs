//! `mime.types` lookups by file extension.

use std::collections::HashMap;
use std::fs;

use camino::Utf8Path;

use super::ContentError;

/// Extension to MIME type table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MimeTypes {
    by_extension: HashMap<String, String>,
}

impl MimeTypes {
    /// Reads a `mime.types` file.
    pub(crate) fn load(path: &Utf8Path) -> Result<Self, ContentError> {
        let text = fs::read_to_string(path).map_err(|source| ContentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Parses `type ext ext ...` lines. Text after `#` is ignored and the
    /// first mapping seen for an extension wins.
    pub(crate) fn parse(text: &str) -> Self {
        let mut by_extension = HashMap::new();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut tokens = line.split_whitespace();
            let Some(mime) = tokens.next() else {
                continue;
            };
            for extension in tokens {
                by_extension
                    .entry(extension.to_owned())
                    .or_insert_with(|| mime.to_owned());
            }
        }
        Self { by_extension }
    }

    /// MIME type for the extension of the last path segment of `path`.
    pub(crate) fn lookup(&self, path: &str) -> Option<&str> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, extension) = name.rsplit_once('.')?;
        self.by_extension.get(extension).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_extension.len()
    }
}
