use std::collections::BTreeMap;

use awsure::aws::credentials::CredentialsFile;
use awsure::aws::sts::DestinationCredentials;
use awsure::config::credentials::{Cache, JumpRoleCredentials};
use awsure::config::profile::ProfileConfig;
use awsure::config::store::Store;
use awsure::config::Paths;
use awsure::login::group_by_fingerprint;
use awsure::Error;

use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;

fn identity(azure_username: &str) -> ProfileConfig {
    ProfileConfig {
        azure_tenant_id: String::from("00000000-0000-0000-0000-000000000000"),
        azure_app_id_uri: String::from("https://example/"),
        azure_username: azure_username.to_owned(),
        okta_username: String::new(),
        destination_account_id: String::from("111122223333"),
        destination_role_name: String::from("Admin"),
        default_duration_hours: 4,
        ..ProfileConfig::default()
    }
}

#[test]
fn config_round_trips_through_yaml_on_disk() {
    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());

    let mut store = Store::empty(&paths);
    store.configs.insert(String::from("dev"), identity("user@example.com"));
    store.save().unwrap();

    let raw = std::fs::read_to_string(&paths.config).unwrap();
    assert!(raw.contains("azure_tenant_id: 00000000-0000-0000-0000-000000000000"));
    assert!(raw.contains("default_duration_hours: 4"));

    let loaded = Store::load(&paths).unwrap();
    assert_eq!(loaded.configs["dev"], identity("user@example.com"));
}

#[test]
fn missing_config_file_is_distinguishable() {
    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());

    assert!(matches!(Store::load(&paths), Err(Error::ConfigMissing)));
}

#[test]
fn bulk_merge_leaves_out_of_range_duration_untouched() {
    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());

    let mut store = Store::empty(&paths);
    store.configs.insert(String::from("dev"), identity("user@example.com"));
    store.save().unwrap();

    let template = ProfileConfig {
        default_duration_hours: 20,
        ..ProfileConfig::default()
    };

    let mut store = Store::load(&paths).unwrap();
    for config in store.configs.values_mut() {
        config.merge_from(&template);
    }
    store.save().unwrap();

    let reloaded = Store::load(&paths).unwrap();
    assert_eq!(reloaded.configs["dev"].default_duration_hours, 4);
}

#[test]
fn three_profiles_sharing_an_identity_need_one_login() {
    let mut configs = BTreeMap::new();
    configs.insert(String::from("dev"), identity("user@x"));
    configs.insert(String::from("stage"), identity("user@x"));
    configs.insert(String::from("prod"), identity("user@x"));

    let groups = group_by_fingerprint(&configs);

    assert_eq!(groups.len(), 1);

    configs.insert(String::from("ops"), identity("other@x"));
    let groups = group_by_fingerprint(&configs);

    assert_eq!(groups.len(), 2);
}

#[test]
fn fresh_cache_entry_is_returned_for_the_default_jump_role() {
    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let mut cache = Cache::load(&paths).unwrap();
    cache.insert(
        String::from("arn:aws:iam::444:role/Jump1"),
        JumpRoleCredentials {
            aws_access_key_id: String::from("ASIACACHED"),
            aws_secret_access_key: String::from("CACHEDSECRET"),
            aws_session_token: String::from("CACHEDTOKEN"),
            aws_expiration: now + Duration::minutes(30),
        },
    );
    cache.save().unwrap();

    let raw = std::fs::read_to_string(&paths.jump_role_cache).unwrap();
    assert!(raw.contains("arn:aws:iam::444:role/Jump1"));
    assert!(raw.contains("aws_access_key_id: ASIACACHED"));

    let cache = Cache::load(&paths).unwrap();
    let hit = cache.fresh("arn:aws:iam::444:role/Jump1", now).unwrap();
    assert_eq!(hit.aws_access_key_id, "ASIACACHED");

    // Thirty-one minutes later the entry has expired.
    assert!(cache
        .fresh("arn:aws:iam::444:role/Jump1", now + Duration::minutes(31))
        .is_none());
}

#[test]
fn destination_credentials_land_in_the_shared_file() {
    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());

    let credentials = DestinationCredentials {
        access_key_id: String::from("ASIADEST"),
        secret_access_key: String::from("DESTSECRET"),
        session_token: String::from("DESTTOKEN"),
        expiration: Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap(),
    };

    let mut file = CredentialsFile::load(&paths).unwrap();
    file.set_profile("dev", &credentials, "us-east-1");
    file.save().unwrap();

    let raw = std::fs::read_to_string(&paths.aws_credentials).unwrap();
    assert!(raw.contains("[dev]"));
    assert!(raw.contains("aws_access_key_id=ASIADEST"));
    assert!(raw.contains("aws_session_token=DESTTOKEN"));
    assert!(raw.contains("region=us-east-1"));
    assert!(raw.contains("output=json"));
    assert!(raw.contains("aws_expiration=2024-05-01T16:00:00Z"));
}

#[cfg(unix)]
#[test]
fn credential_files_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());

    let mut store = Store::empty(&paths);
    store.configs.insert(String::from("dev"), identity("user@example.com"));
    store.save().unwrap();

    let mode = std::fs::metadata(&paths.config).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let dir_mode = std::fs::metadata(paths.config.parent().unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(dir_mode & 0o777, 0o700);
}

#[test]
fn import_export_round_trip() {
    let home = tempdir().unwrap();
    let paths = Paths::under(home.path());

    let mut store = Store::empty(&paths);
    store.configs.insert(String::from("dev"), identity("user@example.com"));
    store.save().unwrap();

    let exported = home.path().join("exported.yml");
    Store::export(&paths, &exported).unwrap();
    assert!(exported.exists());

    Store::remove(&paths, "dev").unwrap();
    assert!(Store::load(&paths).unwrap().configs.is_empty());

    Store::import(&paths, &exported).unwrap();
    assert_eq!(
        Store::load(&paths).unwrap().configs["dev"],
        identity("user@example.com")
    );
}
