use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::QueryService;
use crate::error::HrError;
use crate::executor::{ResultSet, StatementExecutor};
use crate::guard::{self, GuardResult};
use crate::schema::{self, Table};
use crate::value::Value;

pub const DEFAULT_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const MAX_TOKENS: u32 = 1000;

/// Answers a question given a description of the database.
pub trait Answerer {
    fn answer(
        &self,
        question: &str,
        schema_summary: &str,
    ) -> impl std::future::Future<Output = Result<String, HrError>> + Send;
}

/// Bedrock runtime `InvokeModel` over HTTPS, authenticated with an API key.
pub struct BedrockAnswerer {
    region: String,
    model_id: String,
    token: SecretString,
    client: Client,
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct InvokeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl BedrockAnswerer {
    pub fn new(region: String, model_id: String, token: SecretString) -> Self {
        Self {
            region,
            model_id,
            token,
            client: Client::new(),
        }
    }

    fn invoke_url(&self) -> String {
        format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/invoke",
            self.region, self.model_id
        )
    }

    fn map_http_error(status: u16) -> HrError {
        match status {
            401 | 403 => HrError::Answer {
                message: "model access denied, check the API key".to_string(),
            },
            404 => HrError::Answer {
                message: "model not found in this region".to_string(),
            },
            429 => HrError::Answer {
                message: "model request throttled".to_string(),
            },
            _ => HrError::Answer {
                message: format!("HTTP error: {status}"),
            },
        }
    }
}

impl Answerer for BedrockAnswerer {
    async fn answer(&self, question: &str, schema_summary: &str) -> Result<String, HrError> {
        let request = InvokeRequest {
            anthropic_version: "bedrock-2023-05-31",
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: build_prompt(question, schema_summary),
            }],
        };

        let resp = self
            .client
            .post(self.invoke_url())
            .bearer_auth(self.token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| HrError::Connection {
                message: format!("failed to reach model: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::map_http_error(status.as_u16()));
        }

        let body: InvokeResponse = resp.json().await.map_err(|e| HrError::Answer {
            message: format!("failed to parse model response: {e}"),
        })?;

        body.content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| HrError::Answer {
                message: "model returned no text".to_string(),
            })
    }
}

pub fn build_prompt(question: &str, schema_summary: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions about HR data in a Redshift database.\n\n\
         {schema_summary}\n\
         Rules:\n\
         1. Only answer questions related to the HR data (departments, jobs, employees)\n\
         2. If a query is needed, give it as Redshift SQL in a ```sql fenced block\n\
         3. For non-HR questions, politely decline and redirect to HR topics\n\
         4. Be concise and accurate\n\n\
         Question: {question}\n\nAnswer:"
    )
}

/// Schema text plus current row counts. Counting problems are noted, not raised.
pub async fn schema_summary<S: QueryService + Sync>(
    executor: &StatementExecutor<S>,
    db_schema: &str,
) -> String {
    let mut text = schema::summary(db_schema);
    text.push_str("\nCurrent data counts:\n");
    for table in Table::ALL {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified(db_schema));
        match executor.execute(&sql).await {
            Ok(result) => {
                let count = result
                    .rows
                    .first()
                    .and_then(|row| row.first())
                    .map(Value::to_string)
                    .unwrap_or_else(|| "0".to_string());
                text.push_str(&format!("- {table}: {count}\n"));
            }
            Err(e) => {
                warn!(table = %table, error = %e, "row count unavailable");
                text.push_str(&format!("- {table}: unavailable ({e})\n"));
            }
        }
    }
    text
}

/// First fenced ```sql block in `answer`, trimmed.
pub fn extract_sql(answer: &str) -> Option<String> {
    let start = answer.find("```sql")? + "```sql".len();
    let rest = &answer[start..];
    let end = rest.find("```")?;
    let sql = rest[..end].trim();
    (!sql.is_empty()).then(|| sql.to_string())
}

#[derive(Debug, Serialize)]
pub struct AskOutcome {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_error: Option<String>,
}

/// Answer `question`, running any read-only SQL the answer proposes.
pub async fn ask<S, A>(
    executor: &StatementExecutor<S>,
    answerer: &A,
    db_schema: &str,
    question: &str,
) -> Result<AskOutcome, HrError>
where
    S: QueryService + Sync,
    A: Answerer + Sync,
{
    if question.trim().is_empty() {
        return Err(HrError::invalid("Question is required"));
    }

    let summary = schema_summary(executor, db_schema).await;
    let answer = answerer.answer(question, &summary).await?;

    let mut outcome = AskOutcome {
        question: question.to_string(),
        answer,
        sql: None,
        result: None,
        sql_error: None,
    };

    let Some(sql) = extract_sql(&outcome.answer) else {
        return Ok(outcome);
    };
    debug!(sql = %sql, "answer proposes SQL");

    match guard::check_read_only(&sql) {
        GuardResult::ReadOnly => match executor.execute(&sql).await {
            Ok(result) => outcome.result = Some(result),
            Err(e) => outcome.sql_error = Some(e.to_string()),
        },
        denied => {
            let detail = denied.detail().unwrap_or_default();
            warn!(detail = %detail, "proposed SQL not run");
            outcome.sql_error = Some(format!("not executed: {detail}"));
        }
    }
    outcome.sql = Some(sql);
    Ok(outcome)
}
