use hrdata::cli::ConnectionArgs;
use hrdata::config::{CredentialConfig, StorageConfig, cluster_identifier, load, non_empty};
use hrdata::error::HrError;
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Mutex;

// --- Env var test infrastructure ---

/// Static mutex to serialize tests that touch process env vars.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// RAII guard that sets env vars on creation and removes them on Drop.
/// Holds the ENV_MUTEX lock for its lifetime.
struct EnvGuard {
    keys: Vec<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn new(vars: &[(&str, &str)]) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for (key, val) in vars {
            // SAFETY: env var access is serialized by ENV_MUTEX
            unsafe { std::env::set_var(key, val); }
        }
        EnvGuard {
            keys: vars.iter().map(|(k, _)| k.to_string()).collect(),
            _lock: lock,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            // SAFETY: env var access is serialized by ENV_MUTEX
            unsafe { std::env::remove_var(key); }
        }
    }
}

fn write_config(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hrdata_{}_{}.toml", name, std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

fn args(overrides: impl FnOnce(&mut ConnectionArgs)) -> ConnectionArgs {
    let mut args = ConnectionArgs {
        cluster: Some("hr-cluster".to_string()),
        database: Some("dev".to_string()),
        db_user: Some("hr_app".to_string()),
        db_password: Some("pw".to_string()),
        backup_dir: Some(std::env::temp_dir().join("hrdata_backups")),
        ..ConnectionArgs::default()
    };
    overrides(&mut args);
    args
}

#[test]
fn test_defaults_apply() {
    let config = write_config("defaults", "");
    let app = load(&args(|_| {}), None, false, false, Some(&config)).unwrap();

    assert_eq!(app.warehouse.cluster_identifier, "hr-cluster");
    assert_eq!(app.warehouse.database, "dev");
    assert_eq!(app.warehouse.db_schema, "hr_data");
    assert_eq!(app.poll.interval.as_millis(), 1000);
    assert_eq!(app.poll.max_attempts, 30);
    assert_eq!(app.restore_chunk_size, 100);
    assert!(!app.verbose);
    match app.credentials {
        CredentialConfig::Static(c) => {
            assert_eq!(c.username, "hr_app");
            assert_eq!(c.password.expose_secret(), "pw");
        }
        other => panic!("expected static credentials, got {other:?}"),
    }
}

#[test]
fn test_profile_fills_gaps_and_cli_wins() {
    let config = write_config(
        "profile",
        r#"
[defaults]
poll_interval_ms = 250
max_poll_attempts = 10
restore_chunk_size = 50
verbose = true

[profiles.prod]
cluster_identifier = "prod-cluster.abc123.us-east-1.redshift.amazonaws.com"
database = "hr"
schema = "hr_prod"
region = "us-east-1"
secret_name = "hr/redshift"
bucket = "hr-backups"
"#,
    );
    let cli = ConnectionArgs {
        max_polls: Some(5),
        ..ConnectionArgs::default()
    };
    let app = load(&cli, Some("prod"), false, false, Some(&config)).unwrap();

    assert_eq!(app.warehouse.cluster_identifier, "prod-cluster");
    assert_eq!(app.warehouse.database, "hr");
    assert_eq!(app.warehouse.db_schema, "hr_prod");
    assert_eq!(app.warehouse.region.as_deref(), Some("us-east-1"));
    assert_eq!(app.poll.interval.as_millis(), 250);
    assert_eq!(app.poll.max_attempts, 5);
    assert_eq!(app.restore_chunk_size, 50);
    assert!(app.verbose);
    assert!(matches!(
        app.credentials,
        CredentialConfig::SecretsManager { ref secret_id } if secret_id == "hr/redshift"
    ));
    assert_eq!(
        app.storage,
        StorageConfig::S3 {
            bucket: "hr-backups".to_string()
        }
    );
}

#[test]
fn test_missing_profile_is_config_error() {
    let config = write_config("noprofile", "");
    let err = load(&args(|_| {}), Some("staging"), false, false, Some(&config)).unwrap_err();
    assert!(matches!(err, HrError::Config { .. }));
    assert!(err.to_string().contains("staging"));
}

#[test]
fn test_missing_explicit_config_file_is_error() {
    let path = PathBuf::from("/nonexistent/hrdata/config.toml");
    let err = load(&args(|_| {}), None, false, false, Some(&path)).unwrap_err();
    assert!(err.to_string().contains("config file not found"));
}

#[test]
fn test_missing_cluster_is_error() {
    let config = write_config("nocluster", "");
    let err = load(&args(|a| a.cluster = None), None, false, false, Some(&config)).unwrap_err();
    assert!(err.to_string().contains("no cluster specified"));
}

#[test]
fn test_no_credentials_is_error() {
    let config = write_config("nocreds", "");
    let err = load(
        &args(|a| {
            a.db_user = None;
            a.secret_name = None;
        }),
        None,
        false,
        false,
        Some(&config),
    )
    .unwrap_err();
    assert!(err.to_string().contains("no database credentials"));
}

#[test]
fn test_schema_must_be_identifier() {
    let config = write_config("badschema", "");
    let err = load(
        &args(|a| a.db_schema = Some("hr; DROP TABLE x".to_string())),
        None,
        false,
        false,
        Some(&config),
    )
    .unwrap_err();
    assert!(matches!(err, HrError::Config { .. }));
}

#[test]
fn test_zero_chunk_size_is_rejected() {
    let config = write_config("zerochunk", "");
    let err = load(&args(|a| a.chunk_size = Some(0)), None, false, false, Some(&config)).unwrap_err();
    assert!(err.to_string().contains("chunk size"));
}

#[test]
fn test_password_env_indirection() {
    let _guard = EnvGuard::new(&[("HRDATA_TEST_PW", "from-env")]);
    let config = write_config(
        "pwenv",
        r#"
[profiles.dev]
db_user = "loader"
db_password_env = "HRDATA_TEST_PW"
"#,
    );
    let app = load(
        &args(|a| {
            a.db_user = None;
            a.db_password = None;
        }),
        Some("dev"),
        false,
        false,
        Some(&config),
    )
    .unwrap();
    match app.credentials {
        CredentialConfig::Static(c) => {
            assert_eq!(c.username, "loader");
            assert_eq!(c.password.expose_secret(), "from-env");
        }
        other => panic!("expected static credentials, got {other:?}"),
    }
}

#[test]
fn test_answer_token_enables_answerer() {
    let _guard = EnvGuard::new(&[("HRDATA_TEST_TOKEN", "bedrock-key")]);
    let config = write_config(
        "answer",
        r#"
[profiles.dev]
answer_token_env = "HRDATA_TEST_TOKEN"
"#,
    );
    let app = load(&args(|_| {}), Some("dev"), false, false, Some(&config)).unwrap();
    let answer = app.answer.expect("answer model should be configured");
    assert_eq!(answer.region, "us-east-1");
    assert_eq!(answer.model_id, hrdata::ask::DEFAULT_MODEL);
    assert_eq!(answer.token.expose_secret(), "bedrock-key");
}

#[test]
fn test_invalid_toml_is_error() {
    let config = write_config("invalid", "[defaults\npoll_interval_ms = ");
    let err = load(&args(|_| {}), None, false, false, Some(&config)).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn test_helpers() {
    assert_eq!(non_empty(Some("")), None);
    assert_eq!(non_empty(Some("x")), Some("x"));
    assert_eq!(cluster_identifier("hr-cluster"), "hr-cluster");
    assert_eq!(
        cluster_identifier("hr-cluster.abc.us-east-1.redshift.amazonaws.com"),
        "hr-cluster"
    );
}
