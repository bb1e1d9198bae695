use secrecy::{ExposeSecret, SecretString};

use crate::secrets::Credentials;

/// Render a secret for diagnostics; hidden unless `show_secrets` is set.
pub fn format_secret(secret: &SecretString, show_secrets: bool) -> String {
    if show_secrets {
        secret.expose_secret().to_string()
    } else if secret.expose_secret().is_empty() {
        "(empty)".to_string()
    } else {
        "[REDACTED]".to_string()
    }
}

/// One-line description of a database login for verbose output.
pub fn describe_credentials(credentials: &Credentials, show_secrets: bool) -> String {
    format!(
        "user={} password={}",
        credentials.username,
        format_secret(&credentials.password, show_secrets)
    )
}

/// Describe an optional bearer token without leaking it.
pub fn describe_token(token: Option<&SecretString>, show_secrets: bool) -> String {
    match token {
        Some(t) => format_secret(t, show_secrets),
        None => "(not set)".to_string(),
    }
}
