//! The login orchestrator: one SAML acquisition per IdP identity, two STS
//! exchanges per profile, credentials written to the AWS shared file.

use std::collections::BTreeMap;

use chrono::Utc;
use eyre::eyre;
use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::aws;
use crate::aws::credentials::CredentialsFile;
use crate::aws::role::select_jump_role;
use crate::aws::sts;
use crate::browser::Engine;
use crate::config::credentials::{Cache, JumpRoleCredentials};
use crate::config::profile::{clamp_duration_hours, ProfileConfig};
use crate::config::store::Store;
use crate::config::Paths;
use crate::configure;
use crate::error::Error;
use crate::saml;
use crate::saml::response::Response;

/// SAML acquisitions already performed this invocation, keyed by identity
/// fingerprint. Profiles sharing a fingerprint receive identical assertions,
/// so one browser login serves all of them.
type Sessions = BTreeMap<String, String>;

/// Log in with a single profile. A missing config file drops into the
/// interactive configure flow first.
#[instrument(skip(paths))]
pub async fn login_profile(paths: &Paths, profile: &str) -> Result<(), Error> {
    let mut store = match Store::load(paths) {
        Err(Error::ConfigMissing) => {
            println!("We couldn't find any config files. Let's take care of that first");
            configure::configure_profile(paths, profile)?;
            Store::load(paths)?
        }
        other => other?,
    };

    let mut cache = Cache::load(paths)?;
    let mut sessions = Sessions::new();

    run_profile(paths, &mut store, &mut cache, &mut sessions, profile).await
}

/// Log in with every configured profile. Profiles are grouped by identity
/// fingerprint so N profiles over K identities cost at most K browser
/// logins; per-profile failures are collected, not fatal.
#[instrument(skip(paths))]
pub async fn login_all(paths: &Paths) -> eyre::Result<()> {
    let mut store = match Store::load(paths) {
        Err(Error::ConfigMissing) => {
            return Err(eyre!("no profile is configured"));
        }
        other => other?,
    };

    let groups = group_by_fingerprint(&store.configs);
    info!(
        "{} profile(s) across {} identity group(s)",
        store.configs.len(),
        groups.len()
    );

    let mut cache = Cache::load(paths)?;
    let mut sessions = Sessions::new();

    let profiles: Vec<String> = store.configs.keys().cloned().collect();
    let mut failures = Vec::new();

    for profile in profiles {
        if let Err(error) = run_profile(paths, &mut store, &mut cache, &mut sessions, &profile).await
        {
            failures.push(format!("{profile}: {error}"));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(eyre!(failures.iter().join("\n")))
    }
}

/// Profile names per identity fingerprint, in stable order.
#[must_use]
pub fn group_by_fingerprint(
    configs: &BTreeMap<String, ProfileConfig>,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, config) in configs {
        groups
            .entry(config.identity_fingerprint())
            .or_default()
            .push(name.clone());
    }

    groups
}

async fn run_profile(
    paths: &Paths,
    store: &mut Store,
    cache: &mut Cache,
    sessions: &mut Sessions,
    profile: &str,
) -> Result<(), Error> {
    let config = store.get(profile)?.clone();

    println!("Logging in with profile {profile}");

    let jump = jump_role_credentials(store, cache, sessions, profile, &config).await?;

    let client = aws::sts_client_with_credentials(&config.region, &jump);
    let destination = sts::assume_destination_role(
        &client,
        &config.destination_account_id,
        &config.destination_role_name,
        profile,
    )
    .await?;

    let mut credentials_file = CredentialsFile::load(paths)?;
    credentials_file.set_profile(profile, &destination, &config.region);
    credentials_file.save()?;

    println!("Credentials expire at: {}", destination.expiration);

    Ok(())
}

/// Jump-role credentials from the cache when still fresh, otherwise through
/// a full SAML acquisition and `AssumeRoleWithSAML`.
async fn jump_role_credentials(
    store: &mut Store,
    cache: &mut Cache,
    sessions: &mut Sessions,
    profile: &str,
    config: &ProfileConfig,
) -> Result<JumpRoleCredentials, Error> {
    if !config.default_jump_role.is_empty() {
        if let Some(cached) = cache.fresh(&config.default_jump_role, Utc::now()) {
            debug!("reusing cached credentials for {}", config.default_jump_role);
            return Ok(cached.clone());
        }
    }

    let fingerprint = config.identity_fingerprint();

    let raw = match sessions.get(&fingerprint) {
        Some(raw) => raw.clone(),
        None => {
            let raw = acquire_saml(config).await?;
            sessions.insert(fingerprint, raw.clone());
            raw
        }
    };

    let response = Response::try_from(raw)?;
    let roles = response.roles()?;
    let role = select_jump_role(roles, config)?;

    let client = aws::sts_client(&config.region).await;
    let duration = clamp_duration_hours(config.default_duration_hours);
    let credentials = sts::assume_jump_role(&client, &role, &response.raw, duration).await?;

    cache.insert(role.role_arn.clone(), credentials.clone());
    cache.save()?;

    // The user picked a different jump role than the stored default;
    // remember it for next time.
    if role.role_arn != config.default_jump_role {
        if let Some(stored) = store.configs.get_mut(profile) {
            stored.default_jump_role.clone_from(&role.role_arn);
        }
        store.save()?;
    }

    Ok(credentials)
}

/// One browser session: build the AuthnRequest URL, walk the IdP pages,
/// capture the SAML POST. The browser is torn down on every path.
async fn acquire_saml(config: &ProfileConfig) -> Result<String, Error> {
    let url = saml::request::login_url(
        &config.azure_app_id_uri,
        &config.azure_tenant_id,
        saml::AWS_SAML_ENDPOINT,
    )?;

    let mut engine = Engine::launch().await?;
    let result = engine.acquire(&url, config).await;
    engine.close().await;

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(azure_username: &str) -> ProfileConfig {
        ProfileConfig {
            azure_tenant_id: String::from("tenant"),
            azure_app_id_uri: String::from("https://app/"),
            azure_username: azure_username.to_owned(),
            ..ProfileConfig::default()
        }
    }

    #[test]
    fn shared_identities_collapse_into_one_group() {
        let mut configs = BTreeMap::new();
        configs.insert(String::from("dev"), profile("user@example.com"));
        configs.insert(String::from("stage"), profile("user@example.com"));
        configs.insert(String::from("prod"), profile("user@example.com"));

        let groups = group_by_fingerprint(&configs);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.values().next().unwrap(),
            &vec![
                String::from("dev"),
                String::from("prod"),
                String::from("stage"),
            ]
        );
    }

    #[test]
    fn distinct_identities_stay_apart() {
        let mut configs = BTreeMap::new();
        configs.insert(String::from("dev"), profile("user@example.com"));
        configs.insert(String::from("admin"), profile("admin@example.com"));

        let groups = group_by_fingerprint(&configs);

        assert_eq!(groups.len(), 2);
    }
}
