use crate::builder::DEFAULT_CHUNK_SIZE;
use crate::cli::ConnectionArgs;
use crate::error::HrError;
use crate::executor::{DEFAULT_MAX_POLLS, PollPolicy};
use crate::schema::DEFAULT_DB_SCHEMA;
use crate::secrets::Credentials;
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration for one invocation.
#[derive(Debug)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    pub credentials: CredentialConfig,
    pub storage: StorageConfig,
    pub answer: Option<AnswerConfig>,
    pub poll: PollPolicy,
    pub restore_chunk_size: usize,
    pub verbose: bool,
    pub show_secrets: bool,
}

/// Redshift target addressed through the Data API.
#[derive(Debug)]
pub struct WarehouseConfig {
    pub cluster_identifier: String,
    pub database: String,
    pub db_schema: String,
    pub region: Option<String>,
}

/// How the database login is obtained.
#[derive(Debug)]
pub enum CredentialConfig {
    SecretsManager { secret_id: String },
    Static(Credentials),
}

/// Where snapshots are stored.
#[derive(Debug, PartialEq)]
pub enum StorageConfig {
    S3 { bucket: String },
    Local { root: PathBuf },
}

#[derive(Debug)]
pub struct AnswerConfig {
    pub region: String,
    pub model_id: String,
    pub token: SecretString,
}

// --- TOML config file structs ---

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    defaults: TomlDefaults,
    #[serde(default)]
    profiles: HashMap<String, TomlProfile>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDefaults {
    poll_interval_ms: Option<u64>,
    max_poll_attempts: Option<u32>,
    restore_chunk_size: Option<usize>,
    verbose: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct TomlProfile {
    cluster_identifier: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    region: Option<String>,
    secret_name: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_password_env: Option<String>,
    bucket: Option<String>,
    backup_dir: Option<PathBuf>,
    answer_model: Option<String>,
    answer_token: Option<String>,
    answer_token_env: Option<String>,
}

/// Config path resolution result: distinguishes explicit vs auto-resolved paths.
struct ResolvedConfigPath {
    path: PathBuf,
    /// true if given via --config or HRDATA_CONFIG
    explicit: bool,
}

/// Resolve the config file path: --config flag > env var > platform default.
fn resolve_config_path(cli_config: Option<&PathBuf>) -> Option<ResolvedConfigPath> {
    if let Some(path) = cli_config {
        return Some(ResolvedConfigPath {
            path: path.clone(),
            explicit: true,
        });
    }
    if let Ok(path) = std::env::var("HRDATA_CONFIG") {
        return Some(ResolvedConfigPath {
            path: PathBuf::from(path),
            explicit: true,
        });
    }
    ProjectDirs::from("", "", "hrdata").map(|dirs| ResolvedConfigPath {
        path: dirs.config_dir().join("config.toml"),
        explicit: false,
    })
}

/// Load and parse the TOML config file (if it exists).
fn load_toml_config(resolved: Option<&ResolvedConfigPath>) -> Result<TomlConfig, HrError> {
    let resolved = match resolved {
        Some(r) => r,
        None => return Ok(TomlConfig::default()),
    };

    if !resolved.path.exists() {
        if resolved.explicit {
            return Err(HrError::Config {
                message: format!("config file not found: {}", resolved.path.display()),
            });
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&resolved.path).map_err(|e| HrError::Config {
        message: format!("cannot read config file {}: {}", resolved.path.display(), e),
    })?;

    toml::from_str(&content).map_err(|e| HrError::Config {
        message: format!("invalid config file {}: {}", resolved.path.display(), e),
    })
}

/// Resolve a secret from direct value, env indirection, or env var.
fn resolve_secret(
    direct: Option<&str>,
    env_key: Option<&str>,
    fallback_env: &str,
) -> Option<SecretString> {
    if let Some(val) = non_empty(direct) {
        return Some(SecretString::from(val.to_string()));
    }
    if let Some(val) = env_key.and_then(env_non_empty) {
        return Some(SecretString::from(val));
    }
    env_non_empty(fallback_env).map(SecretString::from)
}

/// `Some` only for a non-empty string.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Read an env var, treating empty as unset.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Accept either a bare cluster identifier or an endpoint host name.
pub fn cluster_identifier(raw: &str) -> &str {
    raw.split('.').next().unwrap_or(raw)
}

/// Build AppConfig from global CLI args, the config file and the environment.
pub fn load(
    args: &ConnectionArgs,
    profile_name: Option<&str>,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<AppConfig, HrError> {
    let resolved_path = resolve_config_path(config_path);
    let toml_config = load_toml_config(resolved_path.as_ref())?;

    let profile = profile_name
        .map(|name| {
            toml_config
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| HrError::Config {
                    message: format!("profile '{}' not found in config file", name),
                })
        })
        .transpose()?
        .unwrap_or_default();

    let cluster = non_empty(args.cluster.as_deref())
        .or(profile.cluster_identifier.as_deref())
        .ok_or_else(|| HrError::Config {
            message: "no cluster specified, use --cluster or configure a profile".to_string(),
        })?;

    let database = non_empty(args.database.as_deref())
        .or(profile.database.as_deref())
        .ok_or_else(|| HrError::Config {
            message: "no database specified, use --database or configure a profile".to_string(),
        })?
        .to_string();

    let region = non_empty(args.region.as_deref())
        .or(profile.region.as_deref())
        .map(|s| s.to_string());

    let db_schema = non_empty(args.db_schema.as_deref())
        .or(profile.schema.as_deref())
        .unwrap_or(DEFAULT_DB_SCHEMA)
        .to_string();
    if !is_identifier(&db_schema) {
        return Err(HrError::Config {
            message: format!("invalid schema name: '{db_schema}'"),
        });
    }

    let warehouse = WarehouseConfig {
        cluster_identifier: cluster_identifier(cluster).to_string(),
        database,
        db_schema,
        region: region.clone(),
    };

    // Credentials: explicit user > secret name
    let credentials = if let Some(user) =
        non_empty(args.db_user.as_deref()).or(profile.db_user.as_deref())
    {
        let password = resolve_secret(
            args.db_password.as_deref(),
            profile.db_password_env.as_deref(),
            "HRDATA_DB_PASSWORD",
        )
        .or_else(|| profile.db_password.clone().map(SecretString::from))
        .unwrap_or_else(|| SecretString::from(String::new()));
        CredentialConfig::Static(Credentials {
            username: user.to_string(),
            password,
        })
    } else if let Some(secret_id) =
        non_empty(args.secret_name.as_deref()).or(profile.secret_name.as_deref())
    {
        CredentialConfig::SecretsManager {
            secret_id: secret_id.to_string(),
        }
    } else {
        return Err(HrError::Config {
            message: "no database credentials, use --db-user or --secret-name".to_string(),
        });
    };

    // Storage: bucket > directory > platform data dir
    let storage = if let Some(bucket) = non_empty(args.bucket.as_deref()).or(profile.bucket.as_deref())
    {
        StorageConfig::S3 {
            bucket: bucket.to_string(),
        }
    } else {
        let root = args
            .backup_dir
            .clone()
            .or(profile.backup_dir.clone())
            .or_else(|| ProjectDirs::from("", "", "hrdata").map(|d| d.data_dir().join("backups")))
            .unwrap_or_else(|| PathBuf::from("backups"));
        StorageConfig::Local { root }
    };

    let answer = resolve_secret(
        args.answer_token.as_deref(),
        profile.answer_token_env.as_deref(),
        "AWS_BEARER_TOKEN_BEDROCK",
    )
    .or_else(|| profile.answer_token.clone().map(SecretString::from))
    .map(|token| AnswerConfig {
        region: region.clone().unwrap_or_else(|| "us-east-1".to_string()),
        model_id: non_empty(args.answer_model.as_deref())
            .or(profile.answer_model.as_deref())
            .unwrap_or(crate::ask::DEFAULT_MODEL)
            .to_string(),
        token,
    });

    // poll: CLI/ENV > TOML > 1000ms x 30
    let poll = PollPolicy {
        interval: Duration::from_millis(
            args.poll_interval_ms
                .or(toml_config.defaults.poll_interval_ms)
                .unwrap_or(1000),
        ),
        max_attempts: args
            .max_polls
            .or(toml_config.defaults.max_poll_attempts)
            .unwrap_or(DEFAULT_MAX_POLLS),
    };
    if poll.max_attempts == 0 {
        return Err(HrError::Config {
            message: "max polls must be at least 1".to_string(),
        });
    }

    let restore_chunk_size = args
        .chunk_size
        .or(toml_config.defaults.restore_chunk_size)
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    if restore_chunk_size == 0 {
        return Err(HrError::Config {
            message: "chunk size must be at least 1".to_string(),
        });
    }

    let verbose = verbose || toml_config.defaults.verbose.unwrap_or(false);

    Ok(AppConfig {
        warehouse,
        credentials,
        storage,
        answer,
        poll,
        restore_chunk_size,
        verbose,
        show_secrets,
    })
}

// Schema names are interpolated into statements, so only plain identifiers pass.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
