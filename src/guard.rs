use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::RedshiftSqlDialect;
use sqlparser::parser::Parser;

/// Why a statement was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialKind {
    WriteStatement,
    SelectInto,
    CteWrappedWrite,
    ParseFailure,
    Empty,
    Unrecognized,
}

/// A single denial reason.
#[derive(Debug, Clone)]
pub struct DenialReason {
    pub statement_index: usize,
    pub kind: DenialKind,
    pub detail: String,
}

#[derive(Debug)]
pub enum GuardResult {
    ReadOnly,
    Denied { reasons: Vec<DenialReason> },
}

impl GuardResult {
    pub fn is_read_only(&self) -> bool {
        matches!(self, GuardResult::ReadOnly)
    }

    /// All denial details joined for display.
    pub fn detail(&self) -> Option<String> {
        match self {
            GuardResult::ReadOnly => None,
            GuardResult::Denied { reasons } => Some(
                reasons
                    .iter()
                    .map(|r| r.detail.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

/// Accept `sql` only if every statement in it is a plain read.
pub fn check_read_only(sql: &str) -> GuardResult {
    let statements = match Parser::parse_sql(&RedshiftSqlDialect {}, sql) {
        Ok(stmts) => stmts,
        Err(e) => {
            return denied(DenialKind::ParseFailure, format!("cannot verify query safety: {e}"));
        }
    };

    if statements.is_empty() {
        return denied(DenialKind::Empty, "no statement to run".to_string());
    }

    let reasons = statements
        .iter()
        .enumerate()
        .filter(|(_, stmt)| !is_read_only(stmt))
        .map(|(i, stmt)| {
            let (kind, detail) = classify_denial(stmt);
            DenialReason {
                statement_index: i,
                kind,
                detail,
            }
        })
        .collect::<Vec<_>>();

    if reasons.is_empty() {
        GuardResult::ReadOnly
    } else {
        GuardResult::Denied { reasons }
    }
}

fn denied(kind: DenialKind, detail: String) -> GuardResult {
    GuardResult::Denied {
        reasons: vec![DenialReason {
            statement_index: 0,
            kind,
            detail,
        }],
    }
}

fn is_read_only(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(query) => is_read_only_body(&query.body),
        Statement::Explain { .. } | Statement::ExplainTable { .. } => true,
        Statement::ShowTables { .. } | Statement::ShowColumns { .. } => true,
        _ => false,
    }
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_none(),
        SetExpr::Query(query) => is_read_only_body(&query.body),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        _ => false,
    }
}

fn classify_denial(stmt: &Statement) -> (DenialKind, String) {
    let write = |what: &str| {
        (
            DenialKind::WriteStatement,
            format!("statement would modify data: {what}"),
        )
    };
    match stmt {
        Statement::Insert { .. } => write("INSERT"),
        Statement::Update { .. } => write("UPDATE"),
        Statement::Delete { .. } => write("DELETE"),
        Statement::Merge { .. } => write("MERGE"),
        Statement::Truncate { .. } => write("TRUNCATE"),
        Statement::Drop { .. } => write("DROP"),
        Statement::AlterTable { .. } => write("ALTER"),
        Statement::CreateTable { .. } | Statement::CreateView { .. } => write("DDL"),
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Select(select) if select.into.is_some() => (
                DenialKind::SelectInto,
                "SELECT INTO would create a table".to_string(),
            ),
            _ => (
                DenialKind::CteWrappedWrite,
                "query wraps a data-modifying statement".to_string(),
            ),
        },
        _ => (
            DenialKind::Unrecognized,
            "unrecognized statement type, denied by default".to_string(),
        ),
    }
}
