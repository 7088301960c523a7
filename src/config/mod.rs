pub mod credentials;
pub mod profile;
pub mod store;

use std::path::{Path, PathBuf};

use dirs::home_dir;
use eyre::{eyre, Result};

/// Every file the tool touches, resolved once and passed through explicitly.
#[derive(Clone, Debug)]
pub struct Paths {
    /// `{home}/.config/awsure/config.yml`
    pub config: PathBuf,
    /// `{home}/.config/awsure/jump-role-credentials.yml`
    pub jump_role_cache: PathBuf,
    /// `{home}/.aws/credentials`
    pub aws_credentials: PathBuf,
}

impl Paths {
    pub fn resolve() -> Result<Self> {
        home_dir()
            .map(|home| Self::under(&home))
            .ok_or_else(|| eyre!("failed to determine home directory"))
    }

    #[must_use]
    pub fn under(home: &Path) -> Self {
        let awsure = home.join(".config").join("awsure");

        Self {
            config: awsure.join("config.yml"),
            jump_role_cache: awsure.join("jump-role-credentials.yml"),
            aws_credentials: home.join(".aws").join("credentials"),
        }
    }
}

/// Create the parent directory of `path` (mode 0700 on unix) and write
/// `contents` to it (mode 0600 on unix). Credential-bearing files never get
/// group or world bits.
pub(crate) fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::fs::Permissions;
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, Permissions::from_mode(0o700))?;
            }
        }
    }

    std::fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_under_home() {
        let paths = Paths::under(Path::new("/home/someone"));

        assert_eq!(
            paths.config,
            PathBuf::from("/home/someone/.config/awsure/config.yml")
        );
        assert_eq!(
            paths.jump_role_cache,
            PathBuf::from("/home/someone/.config/awsure/jump-role-credentials.yml")
        );
        assert_eq!(
            paths.aws_credentials,
            PathBuf::from("/home/someone/.aws/credentials")
        );
    }
}
