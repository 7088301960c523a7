use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{write_private, Paths};
use crate::error::Error;

const CACHE_FILE_VERSION: &str = "1.0.0";

/// STS credentials for a jump role, persisted between runs so a fresh entry
/// can skip the whole browser login.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct JumpRoleCredentials {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_session_token: String,
    pub aws_expiration: DateTime<Utc>,
}

impl JumpRoleCredentials {
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.aws_expiration > now
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct CacheFile {
    version: String,
    #[serde(default)]
    credentials: BTreeMap<String, JumpRoleCredentials>,
}

/// Jump-role credentials keyed by role ARN, backed by
/// `jump-role-credentials.yml`.
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    credentials: BTreeMap<String, JumpRoleCredentials>,
}

impl Cache {
    /// Load the cache; a missing file is an empty cache.
    pub fn load(paths: &Paths) -> Result<Self, Error> {
        let path = paths.jump_role_cache.clone();

        if !path.exists() {
            debug!("no jump role credentials cached at {}", path.display());
            return Ok(Self {
                path,
                credentials: BTreeMap::new(),
            });
        }

        let contents = std::fs::read_to_string(&path)?;
        let file: CacheFile = serde_yaml::from_str(&contents)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        Ok(Self {
            path,
            credentials: file.credentials,
        })
    }

    pub fn save(&self) -> Result<(), Error> {
        let file = CacheFile {
            version: CACHE_FILE_VERSION.to_owned(),
            credentials: self.credentials.clone(),
        };

        let contents = serde_yaml::to_string(&file)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

        write_private(&self.path, &contents).map_err(Error::Io)
    }

    /// The cached entry for `role_arn`, provided it has not expired.
    #[must_use]
    pub fn fresh(&self, role_arn: &str, now: DateTime<Utc>) -> Option<&JumpRoleCredentials> {
        self.credentials
            .get(role_arn)
            .filter(|credentials| credentials.is_fresh_at(now))
    }

    pub fn insert(&mut self, role_arn: String, credentials: JumpRoleCredentials) {
        self.credentials.insert(role_arn, credentials);
    }
}
