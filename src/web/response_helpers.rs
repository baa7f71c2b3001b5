// HTTP response helper functions to reduce duplication across route handlers

use hyper::{Body, Response, StatusCode};
use serde::Serialize;

/// Standard CORS headers
const CORS_ORIGIN: &str = "*";
const CORS_METHODS: &str = "GET, POST, OPTIONS";
const CORS_HEADERS: &str = "content-type";

fn with_cors(status: StatusCode) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header("access-control-allow-origin", CORS_ORIGIN)
        .header("access-control-allow-methods", CORS_METHODS)
        .header("access-control-allow-headers", CORS_HEADERS)
}

/// Build a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let json = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());
    json_raw(status, json)
}

/// Build a JSON error response
pub fn json_error(status: StatusCode, message: &str) -> Response<Body> {
    json_raw(status, serde_json::json!({ "error": message }).to_string())
}

/// Build a raw JSON string response
pub fn json_raw(status: StatusCode, json: String) -> Response<Body> {
    with_cors(status)
        .header("content-type", "application/json")
        .body(Body::from(json))
        .unwrap()
}

/// HTML page response
pub fn html_response(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    with_cors(status)
        .header("content-type", "text/html; charset=utf-8")
        .body(body.into())
        .unwrap()
}

/// File download. `attachment` forces a save dialog instead of inline display.
pub fn file_response(
    content: Vec<u8>,
    content_type: &str,
    file_name: &str,
    attachment: bool,
) -> Response<Body> {
    let disposition = format!(
        "{}; filename=\"{}\"",
        if attachment { "attachment" } else { "inline" },
        file_name.replace('"', "")
    );
    with_cors(StatusCode::OK)
        .header("content-type", content_type)
        .header("content-disposition", disposition)
        .header("cache-control", "no-store")
        .body(Body::from(content))
        .unwrap_or_else(|_| json_error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid file name"))
}

/// Build an empty response with CORS headers
pub fn empty_response(status: StatusCode) -> Response<Body> {
    with_cors(status).body(Body::empty()).unwrap()
}

/// CORS preflight response
pub fn cors_preflight() -> Response<Body> {
    empty_response(StatusCode::OK)
}

/// Content type by file extension
pub fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".py") {
        "text/x-python; charset=utf-8"
    } else if lower.ends_with(".glb") {
        "model/gltf-binary"
    } else if lower.ends_with(".json") {
        "application/json"
    } else if lower.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}
