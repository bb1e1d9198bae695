use crate::api::Response;
use crate::error::HrError;
use crate::format;

/// Render a response body as TOON, or as pretty JSON when `json` is set.
pub fn render(response: &Response, json: bool) -> Result<String, HrError> {
    if json {
        let mut text = serde_json::to_string_pretty(&response.body).map_err(|e| HrError::Format {
            message: e.to_string(),
        })?;
        text.push('\n');
        return Ok(text);
    }
    let mut text = format::to_toon(&response.body)?;
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Print a successful body to stdout.
pub fn print_result(text: &str) {
    print!("{}", text);
}

/// Print a failed response to stderr: `error: <status>` followed by the body.
pub fn print_failure(status: u16, text: &str) {
    eprintln!("error: status {}", status);
    eprint!("{}", text);
}

/// Print error to stderr in the contract format: error: <category>: <message>
pub fn print_error(err: &HrError) {
    eprintln!("error: {}", err);
}
