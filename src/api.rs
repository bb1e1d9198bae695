use serde::Serialize;
use serde_json::{Value as Json, json};
use tracing::debug;

use crate::ask::{self, Answerer};
use crate::backend::QueryService;
use crate::backup::BackupOrchestrator;
use crate::error::HrError;
use crate::executor::StatementExecutor;
use crate::ingest;
use crate::reports::{self, DEFAULT_YEAR};
use crate::schema::Table;
use crate::storage::BlobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Json,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: Json::Null,
        }
    }

    pub fn post(path: impl Into<String>, body: Json) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Json,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Everything a request may touch during one invocation.
pub struct Context<S, A> {
    pub executor: StatementExecutor<S>,
    pub blobs: BlobStore,
    pub answerer: Option<A>,
    pub db_schema: String,
    pub chunk_size: usize,
}

impl<S: QueryService + Sync, A: Answerer + Sync> Context<S, A> {
    fn orchestrator(&self) -> BackupOrchestrator<'_, S> {
        BackupOrchestrator::new(&self.executor, &self.blobs, &self.db_schema)
            .with_chunk_size(self.chunk_size)
    }
}

/// Status code for an error.
pub fn status_for(err: &HrError) -> u16 {
    match err {
        HrError::Validation { .. } => 400,
        HrError::NotFound { .. } => 404,
        HrError::RemoteFailure { .. } => 502,
        HrError::Timeout { .. } => 504,
        _ => 500,
    }
}

/// JSON body for an error.
pub fn error_body(err: &HrError) -> Json {
    match err {
        HrError::Validation { reasons } => json!({ "errors": reasons }),
        HrError::PartialRestore {
            chunks_applied,
            chunks_total,
            rows_applied,
            ..
        } => json!({
            "error": err.to_string(),
            "chunks_applied": chunks_applied,
            "chunks_total": chunks_total,
            "rows_applied": rows_applied,
        }),
        HrError::NotFound { message } => json!({ "error": message }),
        other => json!({ "error": other.to_string() }),
    }
}

/// Route `req` and turn the outcome into a response.
pub async fn dispatch<S, A>(ctx: &Context<S, A>, req: &Request) -> Response
where
    S: QueryService + Sync,
    A: Answerer + Sync,
{
    debug!(method = ?req.method, path = %req.path, "dispatching request");
    match route(ctx, req).await {
        Ok(body) => Response { status: 200, body },
        Err(e) => Response {
            status: status_for(&e),
            body: error_body(&e),
        },
    }
}

async fn route<S, A>(ctx: &Context<S, A>, req: &Request) -> Result<Json, HrError>
where
    S: QueryService + Sync,
    A: Answerer + Sync,
{
    let (path, query) = match req.path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (req.path.as_str(), None),
    };
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    match (req.method, segments.as_slice()) {
        (Method::Post, ["data", table]) => {
            let table = table.parse::<Table>()?;
            let rows = req
                .body
                .get("data")
                .and_then(Json::as_array)
                .ok_or_else(|| HrError::invalid("Data must contain 1-1000 rows"))?;
            to_json(ingest::insert_rows(&ctx.executor, &ctx.db_schema, table, rows).await?)
        }
        (Method::Post, ["backup", table]) => {
            let table = table.parse::<Table>()?;
            to_json(ctx.orchestrator().backup(table).await?)
        }
        (Method::Post, ["restore", table]) => {
            let table = table.parse::<Table>()?;
            let key = body_str(&req.body, "backup_key")
                .ok_or_else(|| HrError::invalid("backup_key is required"))?;
            to_json(ctx.orchestrator().restore(table, key).await?)
        }
        (Method::Get, ["backups", table]) => {
            let table = table.parse::<Table>()?;
            let keys = ctx.orchestrator().list(table).await?;
            Ok(json!({ "table": table.name(), "backups": keys, "count": keys.len() }))
        }
        (Method::Post, ["sql"]) => {
            let sql = body_str(&req.body, "sql")
                .ok_or_else(|| HrError::invalid("SQL query is required"))?;
            to_json(ctx.executor.execute(sql).await?)
        }
        (Method::Get, ["reports", name]) => {
            let year = match query_param(query, "year") {
                Some(raw) => reports::parse_year(raw)?,
                None => DEFAULT_YEAR,
            };
            report(ctx, name, year).await
        }
        (Method::Get, ["reports", name, year]) => {
            let year = reports::parse_year(year)?;
            report(ctx, name, year).await
        }
        (Method::Post, ["ask"]) => {
            let question = body_str(&req.body, "question")
                .ok_or_else(|| HrError::invalid("Question is required"))?;
            let answerer = ctx.answerer.as_ref().ok_or_else(|| HrError::Config {
                message: "no answer model configured, set an API key".to_string(),
            })?;
            to_json(ask::ask(&ctx.executor, answerer, &ctx.db_schema, question).await?)
        }
        _ => Err(HrError::not_found("Not found")),
    }
}

// Year is already checked; the name is checked before anything is submitted.
async fn report<S, A>(ctx: &Context<S, A>, name: &str, year: i32) -> Result<Json, HrError>
where
    S: QueryService + Sync,
    A: Answerer + Sync,
{
    let result = reports::run_report(&ctx.executor, &ctx.db_schema, name, year).await?;
    Ok(json!({ "report": name, "year": year, "data": to_json(result)? }))
}

fn body_str<'a>(body: &'a Json, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Json::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn query_param<'a>(query: Option<&'a str>, key: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn to_json<T: Serialize>(value: T) -> Result<Json, HrError> {
    serde_json::to_value(value).map_err(|e| HrError::Format {
        message: format!("cannot serialize response: {e}"),
    })
}
