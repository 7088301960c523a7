use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::profile::ProfileConfig;
use crate::config::{write_private, Paths};
use crate::error::Error;

const CONFIG_FILE_VERSION: &str = "1.0.0";

#[derive(Debug, Deserialize, Serialize)]
struct ConfigFile {
    version: String,
    #[serde(default)]
    configs: BTreeMap<String, ProfileConfig>,
}

/// The profile map backed by `config.yml`.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    pub configs: BTreeMap<String, ProfileConfig>,
}

impl Store {
    /// Load the configuration document. A missing file is
    /// [`Error::ConfigMissing`]; an unreadable or unparseable one is an I/O
    /// or parse failure.
    #[instrument(skip_all, fields(path = %paths.config.display()))]
    pub fn load(paths: &Paths) -> Result<Self, Error> {
        Self::load_from(&paths.config)
    }

    fn load_from(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::ConfigMissing);
        }

        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_yaml::from_str(&contents)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        Ok(Self {
            path: path.to_path_buf(),
            configs: file.configs,
        })
    }

    /// An empty store that will save to the configured location.
    #[must_use]
    pub fn empty(paths: &Paths) -> Self {
        Self {
            path: paths.config.clone(),
            configs: BTreeMap::new(),
        }
    }

    pub fn get(&self, profile: &str) -> Result<&ProfileConfig, Error> {
        self.configs
            .get(profile)
            .ok_or_else(|| Error::ProfileUnknown(profile.to_owned()))
    }

    pub fn save(&self) -> Result<(), Error> {
        let file = ConfigFile {
            version: CONFIG_FILE_VERSION.to_owned(),
            configs: self.configs.clone(),
        };

        let contents = serde_yaml::to_string(&file)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        write_private(&self.path, &contents).map_err(Error::Io)
    }

    /// Replace the whole document with the one at `file`.
    pub fn import(paths: &Paths, file: &Path) -> Result<(), Error> {
        let imported = Self::load_from(file).map_err(|e| match e {
            Error::ConfigMissing => Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", file.display()),
            )),
            other => other,
        })?;

        let store = Self {
            path: paths.config.clone(),
            configs: imported.configs,
        };
        store.save()
    }

    /// Copy the whole document out to `file`.
    pub fn export(paths: &Paths, file: &Path) -> Result<(), Error> {
        let store = Self::load(paths)?;

        let exported = Self {
            path: file.to_path_buf(),
            configs: store.configs,
        };
        exported.save()
    }

    /// Drop one profile from the document.
    pub fn remove(paths: &Paths, profile: &str) -> Result<(), Error> {
        let mut store = Self::load(paths)?;

        if store.configs.remove(profile).is_none() {
            return Err(Error::ProfileUnknown(profile.to_owned()));
        }

        store.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_config_missing() {
        let home = tempfile::tempdir().unwrap();
        let paths = Paths::under(home.path());

        assert!(matches!(Store::load(&paths), Err(Error::ConfigMissing)));
    }

    #[test]
    fn round_trip() {
        let home = tempfile::tempdir().unwrap();
        let paths = Paths::under(home.path());

        let mut store = Store::empty(&paths);
        store.configs.insert(
            String::from("dev"),
            ProfileConfig {
                azure_tenant_id: String::from("tenant"),
                default_duration_hours: 4,
                ..ProfileConfig::default()
            },
        );
        store.save().unwrap();

        let loaded = Store::load(&paths).unwrap();
        assert_eq!(loaded.configs["dev"].azure_tenant_id, "tenant");
        assert_eq!(loaded.configs["dev"].default_duration_hours, 4);
    }

    #[test]
    fn version_header_is_written() {
        let home = tempfile::tempdir().unwrap();
        let paths = Paths::under(home.path());

        Store::empty(&paths).save().unwrap();

        let raw = std::fs::read_to_string(&paths.config).unwrap();
        assert!(raw.contains("version: 1.0.0"));
    }

    #[test]
    fn unknown_profile() {
        let home = tempfile::tempdir().unwrap();
        let paths = Paths::under(home.path());

        let store = Store::empty(&paths);
        assert!(matches!(
            store.get("nope"),
            Err(Error::ProfileUnknown(name)) if name == "nope"
        ));
    }
}
