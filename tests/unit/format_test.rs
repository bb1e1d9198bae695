use hrdata::executor::ResultSet;
use hrdata::format::to_toon;
use hrdata::value::Value;
use serde_json::json;

/// Helper: encode to TOON and decode back to serde_json::Value (no type coercion)
fn round_trip(body: &serde_json::Value) -> serde_json::Value {
    let toon = to_toon(body).unwrap();
    toon_format::decode_no_coerce(&toon).unwrap()
}

fn result_body(result: &ResultSet) -> serde_json::Value {
    serde_json::to_value(result).unwrap()
}

#[test]
fn test_result_set_renders_as_row_objects() {
    let result = ResultSet::new(
        vec!["id".to_string(), "department".to_string()],
        vec![
            vec![Value::Int(1), Value::Text("Sales".to_string())],
            vec![Value::Int(2), Value::Null],
        ],
    )
    .unwrap();

    let decoded = round_trip(&result_body(&result));
    let rows = decoded.as_array().expect("output should be an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["department"], "Sales");
    assert!(rows[1]["department"].is_null(), "NULL cell should decode as null");
}

#[test]
fn test_zero_row_result_keeps_header() {
    let result = ResultSet::new(vec!["q1".to_string(), "q2".to_string()], Vec::new()).unwrap();
    let toon = to_toon(&result_body(&result)).unwrap();
    assert_eq!(toon, "[0]{q1,q2}:\n");
}

#[test]
fn test_statement_without_result_shows_message() {
    let body = result_body(&ResultSet::completed("Query executed successfully"));
    let toon = to_toon(&body).unwrap();
    assert!(toon.contains("Query executed successfully"), "{toon}");
}

#[test]
fn test_nested_result_is_tabulated() {
    let result = ResultSet::new(
        vec!["department".to_string()],
        vec![vec![Value::Text("Ops".to_string())]],
    )
    .unwrap();
    let body = json!({ "report": "quarterly_hiring_report", "year": 2021, "data": result_body(&result) });

    let decoded = round_trip(&body);
    let obj = decoded.as_object().expect("output should be a root object");
    assert_eq!(obj["report"], "quarterly_hiring_report");
    assert_eq!(obj["data"][0]["department"], "Ops");
}

#[test]
fn test_error_body_round_trips() {
    let body = json!({ "errors": ["Row 0: id is required and must be integer"] });
    let decoded = round_trip(&body);
    assert_eq!(decoded["errors"][0], "Row 0: id is required and must be integer");
}
