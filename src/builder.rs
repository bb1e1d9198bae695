use serde_json::Value as Json;

use crate::schema::{ColumnSpec, ColumnType, Table};

/// String value that callers may send instead of JSON `null`.
pub const NULL_SENTINEL: &str = "NULL";
/// String value asking for the server's current timestamp on a timestamp column.
pub const SERVER_CLOCK_SENTINEL: &str = "CURRENT_TIMESTAMP";
/// Rows per statement when re-inserting a snapshot.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// One value ready to be inlined into a statement.
/// Text is single-quoted with embedded quotes doubled; no other escaping is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    ServerClock,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    pub fn render(&self) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::ServerClock => SERVER_CLOCK_SENTINEL.to_string(),
            Literal::Text(s) => quote(s),
            Literal::Int(i) => i.to_string(),
            Literal::Float(x) if x.is_finite() => x.to_string(),
            Literal::Float(_) => "NULL".to_string(),
            Literal::Bool(b) => b.to_string(),
        }
    }

    /// Convert an untrusted JSON value for `col`. `None` means the key was absent.
    pub fn from_json(col: &ColumnSpec, value: Option<&Json>) -> Self {
        match value {
            None if col.server_default => Literal::ServerClock,
            None | Some(Json::Null) => Literal::Null,
            Some(Json::String(s)) if s == NULL_SENTINEL => Literal::Null,
            Some(Json::String(s))
                if s == SERVER_CLOCK_SENTINEL && col.column_type == ColumnType::Timestamp =>
            {
                Literal::ServerClock
            }
            Some(Json::String(s)) => Literal::Text(s.clone()),
            Some(Json::Number(n)) => match n.as_i64() {
                Some(i) => Literal::Int(i),
                None => Literal::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Some(Json::Bool(b)) => Literal::Bool(*b),
            Some(other) => Literal::Text(other.to_string()),
        }
    }
}

impl From<Option<String>> for Literal {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => Literal::Text(s),
            None => Literal::Null,
        }
    }
}

/// Single-quote a string, doubling any embedded quote.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Literals for one validated input row, in the table's declared column order.
pub fn row_literals(table: Table, row: &serde_json::Map<String, Json>) -> Vec<Literal> {
    table
        .schema()
        .columns
        .iter()
        .map(|col| Literal::from_json(col, row.get(col.name)))
        .collect()
}

/// Render one multi-row INSERT. Returns `None` when there are no rows.
pub fn build_insert<C: AsRef<str>>(
    target: &str,
    columns: &[C],
    rows: &[Vec<Literal>],
) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let column_list = columns
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    let values = rows
        .iter()
        .map(|row| {
            let rendered = row.iter().map(Literal::render).collect::<Vec<_>>();
            format!("({})", rendered.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        "INSERT INTO {target} ({column_list}) VALUES {values}"
    ))
}

/// Render `rows` as consecutive INSERTs of at most `chunk_size` rows each,
/// preserving row order.
pub fn build_chunked_inserts<C: AsRef<str>>(
    target: &str,
    columns: &[C],
    rows: &[Vec<Literal>],
    chunk_size: usize,
) -> Vec<String> {
    rows.chunks(chunk_size.max(1))
        .filter_map(|chunk| build_insert(target, columns, chunk))
        .collect()
}
