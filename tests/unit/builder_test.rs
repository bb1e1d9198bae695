use hrdata::builder::{Literal, build_chunked_inserts, build_insert};
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::RedshiftSqlDialect;
use sqlparser::parser::Parser;

fn job_rows(n: usize) -> Vec<Vec<Literal>> {
    (0..n)
        .map(|i| vec![Literal::Int(i as i64), Literal::Text(format!("Job {i}"))])
        .collect()
}

fn values_count(sql: &str) -> usize {
    let statements = Parser::parse_sql(&RedshiftSqlDialect {}, sql).expect("must parse");
    assert_eq!(statements.len(), 1, "one statement per chunk");
    match &statements[0] {
        Statement::Insert(insert) => match insert.source.as_ref().map(|q| q.body.as_ref()) {
            Some(SetExpr::Values(values)) => values.rows.len(),
            other => panic!("expected VALUES, got {other:?}"),
        },
        other => panic!("expected INSERT, got {other:?}"),
    }
}

#[test]
fn two_hundred_fifty_rows_make_three_chunks() {
    let rows = job_rows(250);
    let statements = build_chunked_inserts("hr_data.jobs", &["id", "job"], &rows, 100);
    assert_eq!(statements.len(), 3);
    let sizes = statements.iter().map(|s| values_count(s)).collect::<Vec<_>>();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert!(statements[2].contains("(249, 'Job 249')"));
}

#[test]
fn exact_multiple_has_no_empty_trailing_chunk() {
    let statements = build_chunked_inserts("hr_data.jobs", &["id", "job"], &job_rows(200), 100);
    assert_eq!(statements.len(), 2);
}

#[test]
fn zero_chunk_size_is_treated_as_one() {
    let statements = build_chunked_inserts("hr_data.jobs", &["id", "job"], &job_rows(3), 0);
    assert_eq!(statements.len(), 3);
}

#[test]
fn no_rows_no_statement() {
    assert!(build_insert("hr_data.jobs", &["id", "job"], &[]).is_none());
    assert!(build_chunked_inserts("hr_data.jobs", &["id", "job"], &[], 100).is_empty());
}

#[test]
fn hostile_text_stays_one_literal() {
    let rows = vec![vec![
        Literal::Int(1),
        Literal::Text("'; DELETE FROM hr_data.jobs; --".to_string()),
    ]];
    let sql = build_insert("hr_data.jobs", &["id", "job"], &rows).unwrap();
    assert_eq!(values_count(&sql), 1);
}

#[test]
fn special_literals_render_as_keywords() {
    let rows = vec![vec![
        Literal::Null,
        Literal::ServerClock,
        Literal::Float(f64::NAN),
        Literal::Bool(false),
    ]];
    let sql = build_insert("t", &["a", "b", "c", "d"], &rows).unwrap();
    assert_eq!(
        sql,
        "INSERT INTO t (a, b, c, d) VALUES (NULL, CURRENT_TIMESTAMP, NULL, false)"
    );
}
