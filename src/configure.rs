//! Interactive profile configuration, for first runs and for edits.

use eyre::eyre;

use crate::config::profile::{clamp_duration_hours, ProfileConfig, DURATION_UNCHANGED};
use crate::config::store::Store;
use crate::config::Paths;
use crate::error::Error;
use crate::prompt;

pub fn configure(paths: &Paths, profile: &str, all_profiles: bool) -> eyre::Result<()> {
    if all_profiles {
        configure_all(paths)
    } else {
        configure_profile(paths, profile).map_err(Into::into)
    }
}

/// Prompt for every field of one profile, with current values as defaults.
pub fn configure_profile(paths: &Paths, profile: &str) -> Result<(), Error> {
    let mut store = match Store::load(paths) {
        Err(Error::ConfigMissing) => Store::empty(paths),
        other => other?,
    };

    let mut config = store.configs.get(profile).cloned().unwrap_or_default();

    config.azure_tenant_id = prompt::input_with_default("Azure Tenant Id", &config.azure_tenant_id)?;
    config.azure_app_id_uri =
        prompt::input_with_default("Azure App Id Uri", &config.azure_app_id_uri)?;
    config.azure_username = prompt::input_with_default("Azure Username", &config.azure_username)?;
    config.okta_username = prompt::input_with_default("Okta Username", &config.okta_username)?;
    config.default_jump_role =
        prompt::input_with_default("Default Jump Role Arn", &config.default_jump_role)?;
    config.destination_account_id = prompt::input_with_default(
        "Destination Account Id",
        &config.destination_account_id,
    )?;
    config.destination_role_name =
        prompt::input_with_default("Destination Role Name", &config.destination_role_name)?;
    config.region = prompt::input_with_default("Region", &config.region)?;
    config.remember_me = prompt::confirm("Remember Me", config.remember_me)?;

    let duration = prompt::input_with_default(
        "Default Duration (Hour)",
        &config.default_duration_hours.to_string(),
    )?;
    config.default_duration_hours = parse_duration(&duration);

    store.configs.insert(profile.to_owned(), config);
    store.save()
}

/// Edit every profile at once. Empty answers leave fields unchanged; the
/// duration only applies when it falls in [1, 12].
fn configure_all(paths: &Paths) -> eyre::Result<()> {
    let mut store = match Store::load(paths) {
        Err(Error::ConfigMissing) => {
            return Err(eyre!(
                "cannot configure all profiles when no profile is configured"
            ));
        }
        other => other?,
    };

    println!("Leaving any of the following as empty will keep them unchanged on profiles");

    let template = ProfileConfig {
        azure_tenant_id: prompt::input("Azure Tenant Id")?,
        azure_app_id_uri: prompt::input("Azure App Id Uri")?,
        azure_username: prompt::input("Azure Username")?,
        okta_username: prompt::input("Okta Username")?,
        default_jump_role: prompt::input("Default Jump Role Arn")?,
        destination_account_id: prompt::input("Destination Account Id")?,
        destination_role_name: prompt::input("Destination Role Name")?,
        region: prompt::input("Region")?,
        remember_me: false,
        default_duration_hours: parse_bulk_duration(&prompt::input("Default Duration (Hour)")?),
    };

    for (profile, config) in &mut store.configs {
        println!("Updating {profile} profile");
        config.merge_from(&template);
    }

    store.save()?;

    Ok(())
}

/// Single-profile rule: anything unparseable becomes 1, everything else is
/// clamped into [1, 12].
fn parse_duration(input: &str) -> i64 {
    input.trim().parse::<i64>().map_or_else(
        |_| {
            println!("Not a valid duration was entered. Will set the duration to 1.");
            1
        },
        clamp_duration_hours,
    )
}

/// Bulk rule: empty or unparseable answers keep profiles unchanged; parsed
/// values pass through raw so the merge can reject out-of-range ones.
fn parse_bulk_duration(input: &str) -> i64 {
    if input.trim().is_empty() {
        return DURATION_UNCHANGED;
    }

    input.trim().parse().unwrap_or(DURATION_UNCHANGED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parse_clamps() {
        assert_eq!(parse_duration("4"), 4);
        assert_eq!(parse_duration("0"), 1);
        assert_eq!(parse_duration("20"), 12);
        assert_eq!(parse_duration("not a number"), 1);
        assert_eq!(parse_duration(" 7 "), 7);
    }

    #[test]
    fn bulk_duration_preserves_the_unchanged_sentinel() {
        assert_eq!(parse_bulk_duration(""), DURATION_UNCHANGED);
        assert_eq!(parse_bulk_duration("   "), DURATION_UNCHANGED);
        assert_eq!(parse_bulk_duration("garbage"), DURATION_UNCHANGED);
        // Out-of-range values pass through; the merge drops them.
        assert_eq!(parse_bulk_duration("20"), 20);
        assert_eq!(parse_bulk_duration("4"), 4);
    }
}
