use hrdata::error::HrError;
use hrdata::secrets::{CredentialSource, StaticCredentials, parse_secret};
use secrecy::ExposeSecret;

use crate::support::credentials;

#[test]
fn parses_username_and_password() {
    let creds = parse_secret(r#"{"username":"hr_app","password":"s3cr3t","engine":"redshift"}"#)
        .unwrap();
    assert_eq!(creds.username, "hr_app");
    assert_eq!(creds.password.expose_secret(), "s3cr3t");
}

#[test]
fn missing_password_is_empty() {
    let creds = parse_secret(r#"{"username":"iam_user"}"#).unwrap();
    assert_eq!(creds.password.expose_secret(), "");
}

#[test]
fn empty_username_is_config_error() {
    let err = parse_secret(r#"{"username":"","password":"x"}"#).unwrap_err();
    assert!(matches!(err, HrError::Config { .. }));
}

#[test]
fn non_json_secret_is_config_error() {
    let err = parse_secret("hr_app:s3cr3t").unwrap_err();
    assert!(err.to_string().starts_with("config: invalid database secret"));
}

#[tokio::test]
async fn static_source_hands_out_copies() {
    let source = StaticCredentials(credentials());
    let first = source.credentials().await.unwrap();
    let second = source.credentials().await.unwrap();
    assert_eq!(first.username, second.username);
    assert_eq!(first.password.expose_secret(), "hunter2");
}
