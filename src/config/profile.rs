use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

/// Duration kept out of [1, 12] by the bulk editor to mean "unchanged".
pub const DURATION_UNCHANGED: i64 = -1;

/// A named profile as stored in `config.yml`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub azure_tenant_id: String,
    #[serde(default)]
    pub azure_app_id_uri: String,
    #[serde(default)]
    pub azure_username: String,
    #[serde(default)]
    pub okta_username: String,
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub default_jump_role: String,
    #[serde(default)]
    pub destination_account_id: String,
    #[serde(default)]
    pub destination_role_name: String,
    #[serde(default = "default_duration_hours")]
    pub default_duration_hours: i64,
    #[serde(default)]
    pub region: String,
}

const fn default_duration_hours() -> i64 {
    1
}

/// Clamp a session duration into the [1, 12] hour range AWS accepts here.
#[must_use]
pub const fn clamp_duration_hours(hours: i64) -> i64 {
    if hours < 1 {
        1
    } else if hours > 12 {
        12
    } else {
        hours
    }
}

impl ProfileConfig {
    /// SHA-512 over the four IdP-identifying fields, hex encoded. Profiles
    /// with equal fingerprints receive identical SAML assertions, so one
    /// browser login can serve all of them.
    #[must_use]
    pub fn identity_fingerprint(&self) -> String {
        let identity = format!(
            "{}|{}|{}|{}",
            self.azure_tenant_id, self.azure_app_id_uri, self.azure_username, self.okta_username
        );

        hex::encode(Sha512::digest(identity.as_bytes()))
    }

    /// Field-wise merge used by `configure --all-profiles`. Empty template
    /// strings leave the target untouched, `remember_me` only flips on, and
    /// the duration is applied only when the template value is in [1, 12].
    pub fn merge_from(&mut self, template: &Self) {
        let fields = [
            (&mut self.azure_tenant_id, &template.azure_tenant_id),
            (&mut self.azure_app_id_uri, &template.azure_app_id_uri),
            (&mut self.azure_username, &template.azure_username),
            (&mut self.okta_username, &template.okta_username),
            (&mut self.default_jump_role, &template.default_jump_role),
            (
                &mut self.destination_account_id,
                &template.destination_account_id,
            ),
            (
                &mut self.destination_role_name,
                &template.destination_role_name,
            ),
            (&mut self.region, &template.region),
        ];

        for (target, source) in fields {
            if !source.is_empty() {
                target.clone_from(source);
            }
        }

        if template.remember_me {
            self.remember_me = true;
        }

        if (1..=12).contains(&template.default_duration_hours) {
            self.default_duration_hours = template.default_duration_hours;
        }
    }
}
