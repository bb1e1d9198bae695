use clap::Parser;
use hrdata::api::{self, Context, Request, Response};
use hrdata::ask::BedrockAnswerer;
use hrdata::backend::redshift_data::RedshiftDataService;
use hrdata::cli::{Cli, Command, SqlArgs};
use hrdata::config::{self, AppConfig, CredentialConfig, StorageConfig};
use hrdata::error::HrError;
use hrdata::executor::StatementExecutor;
use hrdata::secrets::{CredentialSource, SecretsManagerSource, StaticCredentials};
use hrdata::storage::BlobStore;
use hrdata::verbose::{self, Timer};
use hrdata::{masking, output};
use serde_json::{Value as Json, json};
use std::process;
use tracing::debug;

#[tokio::main]
async fn main() {
    // Load .env file (optional, ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(response) => {
            let rendered = output::render(&response, cli.json);
            match rendered {
                Ok(text) if response.is_success() => output::print_result(&text),
                Ok(text) => {
                    output::print_failure(response.status, &text);
                    process::exit(1);
                }
                Err(err) => {
                    output::print_error(&err);
                    process::exit(1);
                }
            }
        }
        Err(err) => {
            output::print_error(&err);
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<Response, HrError> {
    let app_config = config::load(
        &cli.connection,
        cli.profile.as_deref(),
        cli.verbose,
        cli.show_secrets,
        cli.config.as_ref(),
    )?;
    verbose::init(app_config.verbose);

    // Parse request input before touching any remote service.
    let request = build_request(&cli.command)?;
    let ctx = connect(app_config).await?;

    let timer = Timer::start();
    let response = api::dispatch(&ctx, &request).await;
    debug!(
        path = %request.path,
        status = response.status,
        elapsed_ms = timer.elapsed_ms() as u64,
        "request complete"
    );
    Ok(response)
}

fn build_request(command: &Command) -> Result<Request, HrError> {
    let request = match command {
        Command::Insert(args) => {
            let body = parse_insert_data(&args.data)?;
            Request::post(format!("/data/{}", args.table), body)
        }
        Command::Backup { table } => Request::post(format!("/backup/{table}"), Json::Null),
        Command::Restore { table, backup_key } => Request::post(
            format!("/restore/{table}"),
            json!({ "backup_key": backup_key }),
        ),
        Command::Backups { table } => Request::get(format!("/backups/{table}")),
        Command::Sql(args) => Request::post("/sql", json!({ "sql": resolve_sql(args)? })),
        Command::Report { name, year } => match year {
            Some(year) => Request::get(format!("/reports/{name}/{year}")),
            None => Request::get(format!("/reports/{name}")),
        },
        Command::Ask { question } => Request::post("/ask", json!({ "question": question })),
    };
    Ok(request)
}

/// Accept a bare array, `{"data": [...]}`, or either one in a file named by `@path`.
fn parse_insert_data(raw: &str) -> Result<Json, HrError> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| HrError::Config {
            message: format!("cannot read data file {}: {}", path, e),
        })?,
        None => raw.to_string(),
    };
    let parsed: Json = serde_json::from_str(&text)
        .map_err(|e| HrError::invalid(format!("data is not valid JSON: {e}")))?;
    match parsed {
        Json::Array(_) => Ok(json!({ "data": parsed })),
        Json::Object(ref obj) if obj.contains_key("data") => Ok(parsed),
        _ => Err(HrError::invalid(
            "data must be a JSON array of rows or an object with a \"data\" array",
        )),
    }
}

fn resolve_sql(args: &SqlArgs) -> Result<String, HrError> {
    if let Some(ref sql) = args.sql {
        return Ok(sql.clone());
    }
    if let Some(ref path) = args.sql_file {
        let content = std::fs::read_to_string(path).map_err(|e| HrError::Config {
            message: format!("cannot read SQL file {}: {}", path.display(), e),
        })?;
        return Ok(content);
    }
    Err(HrError::Config {
        message: "no SQL provided, use positional argument or --file".to_string(),
    })
}

async fn connect(
    app_config: AppConfig,
) -> Result<Context<RedshiftDataService, BedrockAnswerer>, HrError> {
    let warehouse = &app_config.warehouse;
    debug!(
        cluster = %warehouse.cluster_identifier,
        database = %warehouse.database,
        schema = %warehouse.db_schema,
        "connecting to redshift data api"
    );

    let timer = Timer::start();
    let credentials = match app_config.credentials {
        CredentialConfig::Static(credentials) => StaticCredentials(credentials).credentials().await?,
        CredentialConfig::SecretsManager { secret_id } => {
            SecretsManagerSource::connect(warehouse.region.clone(), secret_id)
                .await
                .credentials()
                .await?
        }
    };
    debug!(
        credentials = %masking::describe_credentials(&credentials, app_config.show_secrets),
        elapsed_ms = timer.elapsed_ms() as u64,
        "credentials resolved"
    );

    let service = RedshiftDataService::connect(
        warehouse.region.clone(),
        warehouse.cluster_identifier.clone(),
        warehouse.database.clone(),
    )
    .await;
    let executor = StatementExecutor::new(service, credentials, app_config.poll);

    let blobs = match &app_config.storage {
        StorageConfig::S3 { bucket } => BlobStore::s3(bucket, warehouse.region.as_deref())?,
        StorageConfig::Local { root } => {
            debug!(root = %root.display(), "using local backup directory");
            BlobStore::local(root)?
        }
    };

    let answerer = app_config.answer.map(|answer| {
        debug!(
            model = %answer.model_id,
            token = %masking::describe_token(Some(&answer.token), app_config.show_secrets),
            "answer model configured"
        );
        BedrockAnswerer::new(answer.region, answer.model_id, answer.token)
    });

    Ok(Context {
        executor,
        blobs,
        answerer,
        db_schema: app_config.warehouse.db_schema,
        chunk_size: app_config.restore_chunk_size,
    })
}
