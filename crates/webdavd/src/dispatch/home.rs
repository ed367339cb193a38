//! Home directory lookup for authenticated users.

use camino::Utf8PathBuf;
use nix::unistd::User;

use super::DispatchError;

/// Resolves the home directory requests are rooted at.
pub trait HomeDirectories: Send + Sync {
    /// Home directory of `user`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownUser`] or
    /// [`DispatchError::HomeLookup`] when the account cannot be resolved.
    fn home_of(&self, user: &str) -> Result<Utf8PathBuf, DispatchError>;
}

/// Looks users up in the system account database.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHomeDirectories;

impl HomeDirectories for SystemHomeDirectories {
    fn home_of(&self, user: &str) -> Result<Utf8PathBuf, DispatchError> {
        let account = User::from_name(user)
            .map_err(|errno| DispatchError::HomeLookup {
                user: user.to_owned(),
                source: errno.into(),
            })?
            .ok_or_else(|| DispatchError::UnknownUser {
                user: user.to_owned(),
            })?;
        Utf8PathBuf::from_path_buf(account.dir).map_err(|_| DispatchError::HomeLookup {
            user: user.to_owned(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "home directory is not valid UTF-8",
            ),
        })
    }
}
