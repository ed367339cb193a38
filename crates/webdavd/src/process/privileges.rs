//! Switching the listener to the restricted account.

use std::ffi::CString;

use nix::unistd::{User, geteuid, getuid, initgroups, setgid, setuid};

use super::LaunchError;

/// Switches group list, group, and user to `user`.
///
/// Returns `false` when the process already runs as that account.
pub(crate) fn drop_privileges(user: &str) -> Result<bool, LaunchError> {
    let failed = |source: nix::Error| LaunchError::Privileges {
        user: user.to_owned(),
        source: source.into(),
    };
    let account = User::from_name(user)
        .map_err(failed)?
        .ok_or_else(|| LaunchError::UnknownRestrictedUser {
            user: user.to_owned(),
        })?;
    if getuid() == account.uid && geteuid() == account.uid {
        return Ok(false);
    }
    let name = CString::new(user).map_err(|_| LaunchError::UnknownRestrictedUser {
        user: user.to_owned(),
    })?;
    initgroups(&name, account.gid).map_err(failed)?;
    setgid(account.gid).map_err(failed)?;
    setuid(account.uid).map_err(failed)?;
    Ok(true)
}
