use serde::Serialize;
use serde_json::Value as Json;
use tracing::info;

use crate::backend::QueryService;
use crate::builder;
use crate::error::HrError;
use crate::executor::StatementExecutor;
use crate::schema::Table;
use crate::validation;

pub const MAX_BATCH_ROWS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertReceipt {
    pub table: String,
    pub rows: usize,
    pub message: String,
}

/// Validate a batch and write it as one multi-row INSERT.
///
/// Nothing is submitted unless every row passes validation.
pub async fn insert_rows<S: QueryService + Sync>(
    executor: &StatementExecutor<S>,
    db_schema: &str,
    table: Table,
    rows: &[Json],
) -> Result<InsertReceipt, HrError> {
    if rows.is_empty() || rows.len() > MAX_BATCH_ROWS {
        return Err(HrError::invalid(format!(
            "Data must contain 1-{MAX_BATCH_ROWS} rows"
        )));
    }

    let violations = validation::validate_rows(table, rows);
    if !violations.is_empty() {
        return Err(HrError::Validation {
            reasons: validation::messages(&violations),
        });
    }

    let literal_rows = rows
        .iter()
        .filter_map(Json::as_object)
        .map(|row| builder::row_literals(table, row))
        .collect::<Vec<_>>();
    let columns = table.schema().column_names();
    let sql = builder::build_insert(&table.qualified(db_schema), &columns, &literal_rows)
        .ok_or_else(|| HrError::invalid("no rows to insert"))?;

    executor.execute(&sql).await?;

    let message = format!("Inserted {} rows into {}", literal_rows.len(), table);
    info!(table = %table, rows = literal_rows.len(), "batch inserted");
    Ok(InsertReceipt {
        table: table.to_string(),
        rows: literal_rows.len(),
        message,
    })
}
