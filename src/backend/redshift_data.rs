use crate::backend::{
    ColumnMeta, QueryService, StatementDescription, StatementHandle, StatementResult,
    StatementState,
};
use crate::error::HrError;
use crate::secrets::Credentials;
use crate::value::WireField;
use aws_sdk_redshiftdata::error::DisplayErrorContext;
use aws_sdk_redshiftdata::types::Field;
use aws_sdk_redshiftdata::Client;

/// Redshift Data API client bound to one cluster and database.
pub struct RedshiftDataService {
    client: Client,
    cluster_identifier: String,
    database: String,
}

impl RedshiftDataService {
    pub fn new(client: Client, cluster_identifier: String, database: String) -> Self {
        Self {
            client,
            cluster_identifier,
            database,
        }
    }

    /// Build a client from the ambient AWS configuration chain.
    pub async fn connect(
        region: Option<String>,
        cluster_identifier: String,
        database: String,
    ) -> Self {
        let sdk_config = crate::secrets::load_aws_config(region).await;
        Self::new(Client::new(&sdk_config), cluster_identifier, database)
    }
}

impl QueryService for RedshiftDataService {
    async fn submit(
        &self,
        sql: &str,
        credentials: &Credentials,
    ) -> Result<StatementHandle, HrError> {
        let output = self
            .client
            .execute_statement()
            .cluster_identifier(&self.cluster_identifier)
            .database(&self.database)
            .db_user(&credentials.username)
            .sql(sql)
            .send()
            .await
            .map_err(|e| HrError::Connection {
                message: format!("failed to submit statement: {}", DisplayErrorContext(&e)),
            })?;

        let id: Option<&str> = output.id().into();
        id.map(|id| StatementHandle(id.to_string()))
            .ok_or_else(|| HrError::RemoteFailure {
                message: "no statement id in submit response".to_string(),
            })
    }

    async fn describe(&self, handle: &StatementHandle) -> Result<StatementDescription, HrError> {
        let output = self
            .client
            .describe_statement()
            .id(&handle.0)
            .send()
            .await
            .map_err(|e| HrError::Connection {
                message: format!("failed to poll statement: {}", DisplayErrorContext(&e)),
            })?;

        let state = output
            .status()
            .map(|s| StatementState::parse(s.as_str()))
            .unwrap_or_else(|| StatementState::Other("UNKNOWN".to_string()));

        Ok(StatementDescription {
            state,
            has_result_set: output.has_result_set().unwrap_or(false),
            error: output.error().map(|e| e.to_string()),
        })
    }

    async fn fetch(&self, handle: &StatementHandle) -> Result<StatementResult, HrError> {
        let mut result = StatementResult::default();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .get_statement_result()
                .id(&handle.0)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| HrError::Connection {
                    message: format!("failed to fetch result: {}", DisplayErrorContext(&e)),
                })?;

            if result.columns.is_empty() {
                result.columns = output
                    .column_metadata()
                    .iter()
                    .map(|c| ColumnMeta {
                        name: c.name().unwrap_or_default().to_string(),
                        type_name: c.type_name().unwrap_or("varchar").to_string(),
                    })
                    .collect();
            }

            result.records.extend(
                output
                    .records()
                    .iter()
                    .map(|record| record.iter().map(wire_field).collect::<Vec<_>>()),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(result)
    }
}

fn wire_field(field: &Field) -> WireField {
    match field {
        Field::StringValue(s) => WireField::String(s.clone()),
        Field::LongValue(i) => WireField::Long(*i),
        Field::DoubleValue(x) => WireField::Double(*x),
        Field::BooleanValue(b) => WireField::Boolean(*b),
        Field::IsNull(true) => WireField::IsNull,
        // `isNull: false` carries no value of its own.
        other => WireField::Unsupported {
            tag: tag_name(other).to_string(),
            text: format!("{other:?}"),
        },
    }
}

fn tag_name(field: &Field) -> &'static str {
    match field {
        Field::BlobValue(_) => "blobValue",
        Field::IsNull(_) => "isNull",
        _ => "unknown",
    }
}
