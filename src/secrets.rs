use crate::error::HrError;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Database login used for every statement of one invocation.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_string()),
        }
    }
}

/// Where an invocation obtains its database credentials.
pub trait CredentialSource {
    fn credentials(&self)
    -> impl std::future::Future<Output = Result<Credentials, HrError>> + Send;
}

/// Credentials resolved from config or environment up front.
pub struct StaticCredentials(pub Credentials);

impl CredentialSource for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials, HrError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct SecretPayload {
    username: String,
    #[serde(default)]
    password: String,
}

/// AWS Secrets Manager secret holding `{"username": ..., "password": ...}`.
pub struct SecretsManagerSource {
    client: aws_sdk_secretsmanager::Client,
    secret_id: String,
}

impl SecretsManagerSource {
    pub async fn connect(region: Option<String>, secret_id: String) -> Self {
        let sdk_config = load_aws_config(region).await;
        Self {
            client: aws_sdk_secretsmanager::Client::new(&sdk_config),
            secret_id,
        }
    }
}

impl CredentialSource for SecretsManagerSource {
    async fn credentials(&self) -> Result<Credentials, HrError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_id)
            .send()
            .await
            .map_err(|e| HrError::Connection {
                message: format!(
                    "failed to read secret {}: {}",
                    self.secret_id,
                    DisplayErrorContext(&e)
                ),
            })?;

        let raw = output.secret_string().ok_or_else(|| HrError::Config {
            message: format!("secret {} has no string value", self.secret_id),
        })?;

        parse_secret(raw)
    }
}

/// Parse the JSON body of a database secret.
pub fn parse_secret(raw: &str) -> Result<Credentials, HrError> {
    let payload: SecretPayload = serde_json::from_str(raw).map_err(|e| HrError::Config {
        message: format!("invalid database secret: {e}"),
    })?;
    if payload.username.is_empty() {
        return Err(HrError::Config {
            message: "database secret has an empty username".to_string(),
        });
    }
    Ok(Credentials {
        username: payload.username,
        password: SecretString::from(payload.password),
    })
}

pub(crate) async fn load_aws_config(region: Option<String>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    loader.load().await
}
