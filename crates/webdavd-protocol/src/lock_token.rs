//! WebDAV lock tokens in their `<urn:uuid:VALUE>` wire form.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::LockTokenError;

const URN_PREFIX: &str = "urn:uuid:";

/// An opaque 128-bit lock identifier.
///
/// # Example
///
/// ```rust
/// use webdavd_protocol::LockToken;
///
/// let token: LockToken = " <urn:uuid:6ba7b810-9dad-11d1-80b4-00c04fd430c8> "
///     .parse()
///     .expect("token parses");
/// assert_eq!(
///     token.encode(),
///     "<urn:uuid:6ba7b810-9dad-11d1-80b4-00c04fd430c8>"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockToken(Uuid);

impl LockToken {
    /// Creates a random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.0
    }

    /// Renders the bracketed wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("<{URN_PREFIX}{}>", self.0.hyphenated())
    }

    /// Parses `<urn:uuid:VALUE>` or bare `urn:uuid:VALUE`, ignoring
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LockTokenError`] when the prefix, brackets, or UUID are
    /// invalid.
    pub fn decode(text: &str) -> Result<Self, LockTokenError> {
        let trimmed = text.trim();
        let unbracketed = match trimmed.strip_prefix('<') {
            Some(inner) => inner.strip_suffix('>').ok_or_else(|| shape_error(text))?,
            None => trimmed,
        };
        let value = unbracketed
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| shape_error(text))?;
        Uuid::try_parse(value)
            .map(Self)
            .map_err(|source| LockTokenError::Uuid {
                text: text.to_owned(),
                source,
            })
    }
}

fn shape_error(text: &str) -> LockTokenError {
    LockTokenError::Shape {
        text: text.to_owned(),
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for LockToken {
    type Err = LockTokenError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::decode(text)
    }
}
