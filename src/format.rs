use serde_json::{Map, Value as Json};

use crate::error::HrError;

/// Convert a response body to a TOON-formatted string.
///
/// Serialized result sets (`columns` + `rows`) anywhere in the body are shown
/// as tables of row objects.
pub fn to_toon(body: &Json) -> Result<String, HrError> {
    // toon_format can't infer columns from an empty array, so the header is
    // produced by hand.
    if let Some((columns, rows)) = as_result_set(body)
        && rows.is_empty()
        && !columns.is_empty()
    {
        let col_names = columns
            .iter()
            .filter_map(Json::as_str)
            .collect::<Vec<_>>()
            .join(",");
        return Ok(format!("[0]{{{}}}:\n", col_names));
    }

    toon_format::encode_default(&tabulate(body)).map_err(|e| HrError::Format {
        message: e.to_string(),
    })
}

fn as_result_set(body: &Json) -> Option<(&Vec<Json>, &Vec<Json>)> {
    let obj = body.as_object()?;
    let columns = obj.get("columns")?.as_array()?;
    let rows = obj.get("rows")?.as_array()?;
    Some((columns, rows))
}

fn tabulate(body: &Json) -> Json {
    if let Some((columns, rows)) = as_result_set(body) {
        // Statements without a result set only carry their message.
        if columns.is_empty()
            && let Some(message) = body.get("message")
        {
            return message.clone();
        }
        let names = columns.iter().filter_map(Json::as_str).collect::<Vec<_>>();
        return Json::Array(
            rows.iter()
                .filter_map(Json::as_array)
                .map(|row| {
                    let map = names
                        .iter()
                        .zip(row.iter().chain(std::iter::repeat(&Json::Null)))
                        .map(|(name, v)| (name.to_string(), v.clone()))
                        .collect::<Map<_, _>>();
                    Json::Object(map)
                })
                .collect(),
        );
    }
    match body {
        Json::Object(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), tabulate(v)))
                .collect(),
        ),
        Json::Array(items) => Json::Array(items.iter().map(tabulate).collect()),
        other => other.clone(),
    }
}
