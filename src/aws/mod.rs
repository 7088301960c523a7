pub mod credentials;
pub mod role;
pub mod sts;

use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::Client as StsClient;

use crate::config::credentials::JumpRoleCredentials;

/// STS client backed by the default AWS config chain, falling back on the
/// profile's region when the chain resolves none.
pub async fn sts_client(fallback_region: &str) -> StsClient {
    let region = RegionProviderChain::default_provider()
        .or_else(Region::new(fallback_region.to_owned()));

    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .load()
        .await;

    StsClient::new(&config)
}

/// STS client authenticated with jump-role credentials, for the second hop
/// into the destination role.
#[must_use]
pub fn sts_client_with_credentials(region: &str, jump: &JumpRoleCredentials) -> StsClient {
    let credentials = Credentials::new(
        jump.aws_access_key_id.clone(),
        jump.aws_secret_access_key.clone(),
        Some(jump.aws_session_token.clone()),
        None,
        "jump-role",
    );

    let config = aws_sdk_sts::Config::builder()
        .behavior_version(aws_sdk_sts::config::BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .credentials_provider(credentials)
        .build();

    StsClient::from_conf(config)
}
