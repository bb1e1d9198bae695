use std::fmt;

use serde_json::Value as Json;

use crate::builder::NULL_SENTINEL;
use crate::schema::{ColumnSpec, ColumnType, Table};

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    NotAnObject,
    MissingKey,
    MissingText { max_len: usize },
    NotInteger,
    NotTimestamp,
}

/// A single violation, tied to its row index and field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub row: usize,
    pub field: &'static str,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::NotAnObject => write!(f, "Row {}: row must be a JSON object", self.row),
            ViolationKind::MissingKey => write!(
                f,
                "Row {}: {} is required and must be integer",
                self.row, self.field
            ),
            ViolationKind::MissingText { max_len } => write!(
                f,
                "Row {}: {} is required and max {} chars",
                self.row, self.field, max_len
            ),
            ViolationKind::NotInteger => {
                write!(f, "Row {}: {} must be integer", self.row, self.field)
            }
            ViolationKind::NotTimestamp => write!(
                f,
                "Row {}: {} must be a timestamp string",
                self.row, self.field
            ),
        }
    }
}

/// Check every row against `table`'s schema.
pub fn validate_rows(table: Table, rows: &[Json]) -> Vec<Violation> {
    let schema = table.schema();
    let mut violations = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let Some(fields) = row.as_object() else {
            violations.push(Violation {
                row: i,
                field: "",
                kind: ViolationKind::NotAnObject,
            });
            continue;
        };

        // Primary key first, then the remaining columns in declared order.
        let key = schema.primary_key();
        if !is_integer(fields.get(key.name)) {
            violations.push(Violation {
                row: i,
                field: key.name,
                kind: ViolationKind::MissingKey,
            });
        }

        for col in schema.columns.iter().filter(|c| !c.primary_key) {
            if let Some(kind) = check_column(col, fields.get(col.name)) {
                violations.push(Violation {
                    row: i,
                    field: col.name,
                    kind,
                });
            }
        }
    }

    violations
}

/// Human-readable messages, in row then field order.
pub fn messages(violations: &[Violation]) -> Vec<String> {
    violations.iter().map(|v| v.to_string()).collect()
}

fn check_column(col: &ColumnSpec, value: Option<&Json>) -> Option<ViolationKind> {
    if col.required {
        return match col.column_type {
            ColumnType::Text => {
                let max_len = col.max_len.unwrap_or(usize::MAX);
                match value.and_then(Json::as_str) {
                    Some(s) if !s.is_empty() && s.chars().count() <= max_len => None,
                    _ => Some(ViolationKind::MissingText { max_len }),
                }
            }
            ColumnType::Integer => (!is_integer(value)).then_some(ViolationKind::MissingKey),
            ColumnType::Timestamp => match value {
                Some(Json::String(s)) if !s.is_empty() => None,
                _ => Some(ViolationKind::NotTimestamp),
            },
        };
    }

    // Optional columns: absent, null and the NULL sentinel are all fine.
    let value = match value {
        None | Some(Json::Null) => return None,
        Some(Json::String(s)) if s == NULL_SENTINEL => return None,
        Some(v) => v,
    };

    match col.column_type {
        ColumnType::Integer => (!is_integer(Some(value))).then_some(ViolationKind::NotInteger),
        ColumnType::Timestamp => match value {
            Json::String(s) if !s.is_empty() => None,
            _ => Some(ViolationKind::NotTimestamp),
        },
        ColumnType::Text => {
            let max_len = col.max_len.unwrap_or(usize::MAX);
            match value.as_str() {
                Some(s) if s.chars().count() <= max_len => None,
                _ => Some(ViolationKind::MissingText { max_len }),
            }
        }
    }
}

fn is_integer(value: Option<&Json>) -> bool {
    value.and_then(Json::as_i64).is_some()
}
