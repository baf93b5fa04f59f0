use crate::dispatcher::HandlerResponse;
use may_minihttp::Response;
use serde_json::Value;
use tracing::warn;

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// `Content-Type` header lines as `'static` strings for `may_minihttp`.
fn content_type_header(content_type: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    if ct.starts_with("text/html") {
        "Content-Type: text/html; charset=utf-8"
    } else if ct.starts_with("text/yaml") || ct.starts_with("application/yaml") {
        "Content-Type: text/yaml; charset=utf-8"
    } else if ct.starts_with("text/plain") {
        "Content-Type: text/plain; charset=utf-8"
    } else if ct.starts_with("text/css") {
        "Content-Type: text/css"
    } else if ct.starts_with("application/javascript") {
        "Content-Type: application/javascript"
    } else if ct.starts_with("image/svg") {
        "Content-Type: image/svg+xml"
    } else if ct.starts_with("image/png") {
        "Content-Type: image/png"
    } else if ct.starts_with("image/x-icon") {
        "Content-Type: image/x-icon"
    } else if ct.starts_with("application/json") {
        "Content-Type: application/json"
    } else {
        "Content-Type: application/octet-stream"
    }
}

/// Write a handler response. String bodies with a non-JSON content type are
/// written verbatim; everything else is serialized as JSON.
pub fn write_handler_response(res: &mut Response, resp: HandlerResponse) {
    res.status_code(resp.status as usize, status_reason(resp.status));
    let content_type = resp
        .get_header("content-type")
        .unwrap_or("application/json")
        .to_string();
    let is_json = content_type.starts_with("application/json");

    match resp.body {
        Value::String(s) if !is_json => {
            res.header(content_type_header(&content_type));
            res.body_vec(s.into_bytes());
        }
        other => match serde_json::to_vec(&other) {
            Ok(bytes) => {
                res.header("Content-Type: application/json");
                res.body_vec(bytes);
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize response body");
                write_json_error(res, 500, serde_json::json!({ "error": "serialization failed" }));
            }
        },
    }
}

pub fn write_bytes(res: &mut Response, status: u16, content_type: &str, bytes: Vec<u8>) {
    res.status_code(status as usize, status_reason(status));
    res.header(content_type_header(content_type));
    res.body_vec(bytes);
}

pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(503), "Service Unavailable");
    }

    #[test]
    fn test_content_type_header() {
        assert_eq!(
            content_type_header("text/html; charset=utf-8"),
            "Content-Type: text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_header("application/yaml"),
            "Content-Type: text/yaml; charset=utf-8"
        );
        assert_eq!(
            content_type_header("something/else"),
            "Content-Type: application/octet-stream"
        );
    }
}
