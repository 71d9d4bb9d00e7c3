use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::tempdir;

use resource_bundler_core::environment::{
    check_environment, has_credentials, load_env_file, require_environment, resolve_credentials,
};
use resource_bundler_core::error::BuildError;

fn clear(prefix: &str) {
    for suffix in ["USERNAME", "PASSWORD", "LOGIN_URL"] {
        env::remove_var(format!("{prefix}_{suffix}"));
    }
}

#[test]
#[serial]
fn valid_only_when_username_and_password_are_set() {
    let prefix = "RB_TEST_BOTH";
    clear(prefix);
    let tmp = tempdir().unwrap();

    assert!(!check_environment(tmp.path(), prefix));

    env::set_var(format!("{prefix}_USERNAME"), "dev@example.com");
    assert!(!check_environment(tmp.path(), prefix));

    env::set_var(format!("{prefix}_PASSWORD"), "secret");
    assert!(check_environment(tmp.path(), prefix));
    clear(prefix);
}

#[test]
#[serial]
fn empty_values_do_not_count() {
    let prefix = "RB_TEST_EMPTY";
    clear(prefix);
    env::set_var(format!("{prefix}_USERNAME"), "dev@example.com");
    env::set_var(format!("{prefix}_PASSWORD"), "");
    assert!(!has_credentials(prefix));
    clear(prefix);
}

#[test]
#[serial]
fn env_file_supplies_missing_values() {
    let prefix = "RB_TEST_DOTENV";
    clear(prefix);
    let tmp = tempdir().unwrap();
    write(
        tmp.path().join(".env"),
        format!("{prefix}_USERNAME=file-user\n{prefix}_PASSWORD=file-pass\n{prefix}_LOGIN_URL=https://test.salesforce.com\n"),
    )
    .unwrap();

    assert!(load_env_file(tmp.path()));
    assert!(check_environment(tmp.path(), prefix));

    let creds = resolve_credentials(prefix).expect("credentials from .env");
    assert_eq!(creds.username, "file-user");
    assert_eq!(creds.login_url(), "https://test.salesforce.com");
    clear(prefix);
}

#[test]
#[serial]
fn missing_env_file_is_not_an_error() {
    let tmp = tempdir().unwrap();
    assert!(!load_env_file(tmp.path()));
}

#[test]
#[serial]
fn require_environment_names_the_prefix() {
    let prefix = "RB_TEST_MISSING";
    clear(prefix);
    let tmp = tempdir().unwrap();
    match require_environment(tmp.path(), prefix) {
        Err(e @ BuildError::UnresolvedEnvironment(_)) => {
            assert_eq!(e.to_string(), "RB_TEST_MISSING environment variables not found");
        }
        other => panic!("expected unresolved environment, got {other:?}"),
    }
    assert!(matches!(
        resolve_credentials(prefix),
        Err(BuildError::UnresolvedEnvironment(_))
    ));
}
