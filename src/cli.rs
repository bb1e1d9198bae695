use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hrdata",
    about = "Manage the HR dataset in Redshift: inserts, reports, backup and restore"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short = 'c', long, global = true, env = "HRDATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Config file profile name
    #[arg(short = 'P', long, global = true, env = "HRDATA_PROFILE")]
    pub profile: Option<String>,

    /// Emit diagnostics to stderr
    #[arg(short = 'v', long, global = true, env = "HRDATA_VERBOSE")]
    pub verbose: bool,

    /// Disable credential masking in diagnostics
    #[arg(long, global = true, env = "HRDATA_SHOW_SECRETS")]
    pub show_secrets: bool,

    /// Print response bodies as JSON instead of TOON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate and insert a batch of rows (1-1000)
    Insert(InsertArgs),

    /// Snapshot a table to blob storage
    Backup {
        /// departments, jobs or hired_employees
        table: String,
    },

    /// Replace a table's contents with a stored snapshot
    Restore {
        table: String,
        /// Key returned by a previous backup
        backup_key: String,
    },

    /// List stored snapshots of a table, oldest first
    Backups { table: String },

    /// Execute an ad-hoc SQL statement
    Sql(SqlArgs),

    /// Run a canned report
    Report {
        /// quarterly_hiring_report or departments_above_avg_hiring
        name: String,
        /// Year between 2020 and 2030 (default: 2021)
        #[arg(short = 'y', long)]
        year: Option<String>,
    },

    /// Ask a question about the HR data
    Ask { question: String },
}

#[derive(Args, Debug)]
pub struct InsertArgs {
    pub table: String,

    /// JSON array of rows, `{"data": [...]}`, or @path to a file holding either
    #[arg(short = 'd', long)]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct SqlArgs {
    /// SQL statement text
    pub sql: Option<String>,

    /// Read SQL from file
    #[arg(short = 'f', long = "file", conflicts_with = "sql")]
    pub sql_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Redshift cluster identifier or endpoint host
    #[arg(long, global = true, env = "HRDATA_CLUSTER")]
    pub cluster: Option<String>,

    /// Database name
    #[arg(long, global = true, env = "HRDATA_DATABASE")]
    pub database: Option<String>,

    /// Schema holding the HR tables (default: hr_data)
    #[arg(long, global = true, env = "HRDATA_DB_SCHEMA")]
    pub db_schema: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "HRDATA_REGION")]
    pub region: Option<String>,

    /// Secrets Manager id holding the database login
    #[arg(long, global = true, env = "HRDATA_SECRET_NAME")]
    pub secret_name: Option<String>,

    /// Database user (instead of a secret)
    #[arg(short = 'u', long, global = true, env = "HRDATA_DB_USER")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, global = true, env = "HRDATA_DB_PASSWORD")]
    pub db_password: Option<String>,

    /// S3 bucket for backups
    #[arg(long, global = true, env = "HRDATA_BUCKET")]
    pub bucket: Option<String>,

    /// Local directory for backups (when no bucket is set)
    #[arg(long, global = true, env = "HRDATA_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Milliseconds between status polls (default: 1000)
    #[arg(long, global = true, env = "HRDATA_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Status polls before giving up (default: 30)
    #[arg(long, global = true, env = "HRDATA_MAX_POLLS")]
    pub max_polls: Option<u32>,

    /// Rows per INSERT during restore (default: 100)
    #[arg(long, global = true, env = "HRDATA_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Model id for questions
    #[arg(long, global = true, env = "HRDATA_ANSWER_MODEL")]
    pub answer_model: Option<String>,

    /// Bedrock API key for questions
    #[arg(long, global = true, env = "AWS_BEARER_TOKEN_BEDROCK")]
    pub answer_token: Option<String>,
}
