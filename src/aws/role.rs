use tracing::{info, warn};

use crate::config::profile::ProfileConfig;
use crate::error::Error;
use crate::prompt;
use crate::saml::response::SamlRole;

/// Outcome of the non-interactive part of jump-role selection.
#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    Selected(SamlRole),
    NeedsPrompt(Vec<SamlRole>),
}

/// Pick the jump role from the SAML-granted set: the configured default when
/// it is still granted, the only role when there is just one, otherwise an
/// interactive fuzzy pick over the sorted list.
pub fn select_jump_role(roles: Vec<SamlRole>, config: &ProfileConfig) -> Result<SamlRole, Error> {
    match resolve(roles, &config.default_jump_role)? {
        Resolution::Selected(role) => Ok(role),
        Resolution::NeedsPrompt(roles) => choose(roles),
    }
}

fn resolve(mut roles: Vec<SamlRole>, default_jump_role: &str) -> Result<Resolution, Error> {
    if roles.is_empty() {
        return Err(Error::NoRoles);
    }

    if !default_jump_role.is_empty() {
        if let Some(role) = roles.iter().find(|role| role.role_arn == default_jump_role) {
            return Ok(Resolution::Selected(role.clone()));
        }

        warn!(
            "default jump role {} is no longer granted; you may need to update your config",
            default_jump_role
        );
    }

    if roles.len() == 1 {
        let role = roles.remove(0);
        info!("only one role is granted, selecting {}", role.role_arn);
        return Ok(Resolution::Selected(role));
    }

    roles.sort_by(|a, b| a.role_arn.cmp(&b.role_arn));

    Ok(Resolution::NeedsPrompt(roles))
}

fn choose(mut roles: Vec<SamlRole>) -> Result<SamlRole, Error> {
    let items: Vec<String> = roles
        .iter()
        .enumerate()
        .map(|(i, role)| format!("#{} {}", i + 1, role.role_arn))
        .collect();

    let index = prompt::select(
        "Select your role - Hint: fuzzy search supported. To choose one role directly just enter #{Int}",
        &items,
    )?;

    Ok(roles.remove(index))
}
