// Request parsing utilities for HTTP handlers

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hyper::{Body, Response, StatusCode};
use label_forge_types::{UploadPayload, UploadedAsset};
use serde::de::DeserializeOwned;

use super::error::PipelineError;
use super::response_helpers::json_error;
use crate::sys_error;

/// Parse JSON request body into a typed structure.
///
/// Returns the deserialized value on success, or a ready-to-send error
/// Response on failure.
pub async fn parse_json_body<T: DeserializeOwned>(body: Body) -> Result<T, Response<Body>> {
    let body_bytes = match hyper::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            sys_error!("[REQUEST] Failed to read request body: {}", e);
            return Err(json_error(StatusCode::BAD_REQUEST, "Failed to read request body"));
        }
    };

    serde_json::from_slice::<T>(&body_bytes).map_err(|e| {
        sys_error!("[REQUEST] JSON parsing error: {}", e);
        json_error(StatusCode::BAD_REQUEST, &format!("Invalid JSON format: {e}"))
    })
}

// Base64 text of an upload with any `data:...;base64,` prefix removed
fn base64_part(data: &str) -> &str {
    match data.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest.trim(),
        _ => data.trim(),
    }
}

/// Whether the client sent an upload with any content at all. Checked before decoding.
pub fn is_present(payload: &Option<UploadPayload>) -> bool {
    payload
        .as_ref()
        .is_some_and(|p| !base64_part(&p.data).is_empty())
}

/// Decode an upload payload. Accepts bare base64 or a `data:` URL.
pub fn decode_upload(payload: UploadPayload) -> Result<UploadedAsset, PipelineError> {
    match STANDARD.decode(base64_part(&payload.data)) {
        Ok(bytes) => Ok(UploadedAsset::new(payload.name, bytes)),
        Err(source) => Err(PipelineError::BadUpload {
            name: payload.name,
            source,
        }),
    }
}

/// Treat an upload with no bytes the same as no upload at all.
pub fn decode_optional(payload: Option<UploadPayload>) -> Result<Option<UploadedAsset>, PipelineError> {
    match payload {
        Some(p) => decode_upload(p).map(|asset| (!asset.bytes.is_empty()).then_some(asset)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn payload(name: &str, data: &str) -> UploadPayload {
        UploadPayload {
            name: name.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_decode_bare_base64() {
        let asset = decode_upload(payload("box.obj", "diAwIDAK")).unwrap();
        assert_eq!(asset.name, "box.obj");
        assert_eq!(asset.bytes, b"v 0 0\n");
    }

    #[test]
    fn test_decode_data_url() {
        let asset = decode_upload(payload("front.png", "data:image/png;base64,iVBORw==")).unwrap();
        assert_eq!(asset.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_upload(payload("front.png", "!!not base64!!")).unwrap_err();
        assert!(matches!(err, PipelineError::BadUpload { .. }));
        assert!(err.to_string().contains("front.png"));
    }

    #[test]
    fn test_empty_upload_counts_as_missing() {
        assert!(decode_optional(Some(payload("empty.obj", ""))).unwrap().is_none());
        assert!(decode_optional(None).unwrap().is_none());
    }

    #[test]
    fn test_is_present_ignores_empty_data() {
        assert!(is_present(&Some(payload("box.obj", "diAwIDAK"))));
        assert!(is_present(&Some(payload("box.obj", "!!not base64!!"))));
        assert!(!is_present(&Some(payload("box.obj", ""))));
        assert!(!is_present(&Some(payload("front.png", "data:image/png;base64,"))));
        assert!(!is_present(&None));
    }

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[tokio::test]
    async fn test_parse_json_body() {
        let parsed: Probe = parse_json_body(Body::from(r#"{"value": 7}"#)).await.unwrap();
        assert_eq!(parsed.value, 7);

        let err = parse_json_body::<Probe>(Body::from("{")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
