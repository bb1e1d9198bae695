use hrdata::masking::{describe_credentials, describe_token, format_secret};
use hrdata::secrets::Credentials;
use secrecy::SecretString;

#[test]
fn test_secret_masked_by_default() {
    let secret = SecretString::from("my-super-secret-password".to_string());
    let output = format_secret(&secret, false);
    assert_eq!(output, "[REDACTED]");
    assert!(!output.contains("my-super-secret-password"));
}

#[test]
fn test_secret_exposed_with_show_secrets() {
    let secret = SecretString::from("my-super-secret-password".to_string());
    let output = format_secret(&secret, true);
    assert_eq!(output, "my-super-secret-password");
}

#[test]
fn test_empty_secret_is_marked() {
    let secret = SecretString::from(String::new());
    assert_eq!(format_secret(&secret, false), "(empty)");
}

#[test]
fn test_credentials_debug_is_redacted() {
    let credentials = Credentials {
        username: "hr_app".to_string(),
        password: SecretString::from("password123".to_string()),
    };
    let debug_output = format!("{:?}", credentials);
    assert!(!debug_output.contains("password123"), "Debug should not expose secret: {}", debug_output);
    assert_eq!(
        describe_credentials(&credentials, false),
        "user=hr_app password=[REDACTED]"
    );
}

#[test]
fn test_token_none() {
    assert_eq!(describe_token(None, false), "(not set)");
}

#[test]
fn test_token_some_exposed() {
    let secret = SecretString::from("token123".to_string());
    assert_eq!(describe_token(Some(&secret), true), "token123");
}
