//! The AWS shared-credentials file, parsed and rewritten whole.
//! Adapted from the profile parsing in rusoto's credential crate.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::SecondsFormat;
use lazy_static::lazy_static;
use regex::Regex;

use crate::aws::sts::DestinationCredentials;
use crate::config::{write_private, Paths};
use crate::error::Error;

lazy_static! {
    static ref PROFILE_REGEX: Regex = Regex::new(r"^\[([^\]]+)\]$").expect("hardcoded regex");
}

/// One `[profile]` section. Keys we do not manage are preserved verbatim.
type Section = BTreeMap<String, String>;

pub struct CredentialsFile {
    path: PathBuf,
    profiles: BTreeMap<String, Section>,
}

impl CredentialsFile {
    /// Load the shared-credentials file; a missing file starts empty and is
    /// created on save.
    pub fn load(paths: &Paths) -> Result<Self, Error> {
        let path = paths.aws_credentials.clone();

        let profiles = if path.exists() {
            std::fs::read_to_string(&path)?.parse::<Profiles>()?.0
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, profiles })
    }

    /// Upsert the section for `profile` with the keys the tool manages.
    pub fn set_profile(&mut self, profile: &str, credentials: &DestinationCredentials, region: &str) {
        let section = self.profiles.entry(profile.to_owned()).or_default();

        section.insert(
            String::from("aws_access_key_id"),
            credentials.access_key_id.clone(),
        );
        section.insert(
            String::from("aws_secret_access_key"),
            credentials.secret_access_key.clone(),
        );
        section.insert(
            String::from("aws_session_token"),
            credentials.session_token.clone(),
        );
        section.insert(String::from("region"), region.to_owned());
        section.insert(String::from("output"), String::from("json"));
        section.insert(
            String::from("aws_expiration"),
            credentials
                .expiration
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
    }

    pub fn save(&self) -> Result<(), Error> {
        write_private(&self.path, &Profiles(self.profiles.clone()).to_string()).map_err(Error::Io)
    }
}

struct Profiles(BTreeMap<String, Section>);

impl FromStr for Profiles {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut profiles: BTreeMap<String, Section> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in s.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(captures) = PROFILE_REGEX.captures(line) {
                let name = captures[1].to_owned();
                profiles.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            if let (Some(name), Some((key, value))) = (&current, line.split_once('=')) {
                profiles
                    .entry(name.clone())
                    .or_default()
                    .insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }

        Ok(Self(profiles))
    }
}

impl fmt::Display for Profiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, section) in &self.0 {
            writeln!(f, "[{name}]")?;
            for (key, value) in section {
                writeln!(f, "{key}={value}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
