// Generated file downloads
//
// GET /api/files/{scripts|output}/{name}

use hyper::{Body, Response, StatusCode};
use std::convert::Infallible;
use tokio::fs;

use crate::sys_debug;
use crate::web::{
    response_helpers::{content_type_for, file_response, json_error},
    state::SharedState,
};

/// A bare file name: no separators, no parent references, not hidden.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

pub async fn handle_download(path: &str, state: SharedState) -> Result<Response<Body>, Infallible> {
    let rest = path.trim_start_matches("/api/files/");
    let (area, raw_name) = match rest.split_once('/') {
        Some(parts) => parts,
        None => return Ok(json_error(StatusCode::NOT_FOUND, "File not found")),
    };

    let name = match urlencoding::decode(raw_name) {
        Ok(name) => name.into_owned(),
        Err(_) => return Ok(json_error(StatusCode::BAD_REQUEST, "Invalid file name")),
    };
    if !is_safe_file_name(&name) {
        return Ok(json_error(StatusCode::BAD_REQUEST, "Invalid file name"));
    }

    let dir = match state.pipeline.dirs().download_area(area) {
        Some(dir) => dir.to_path_buf(),
        None => return Ok(json_error(StatusCode::NOT_FOUND, "File not found")),
    };

    match fs::read(dir.join(&name)).await {
        Ok(content) => {
            sys_debug!("[FILES] Serving {}/{} ({} bytes)", area, name, content.len());
            let inline = content_type_for(&name).starts_with("image/");
            Ok(file_response(content, content_type_for(&name), &name, !inline))
        }
        Err(_) => Ok(json_error(StatusCode::NOT_FOUND, "File not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::completion::{CompletionClient, CompletionError};
    use crate::web::materialize::AcceptAll;
    use crate::web::pipeline::Pipeline;
    use crate::web::staging::WorkDirs;
    use crate::web::state::AppState;
    use label_forge_config::AppConfig;
    use label_forge_types::GeneratedScript;
    use std::sync::Arc;

    struct Unused;

    impl CompletionClient for Unused {
        fn complete(&self, _prompt: &str) -> Result<GeneratedScript, CompletionError> {
            Err(CompletionError::NoChoices)
        }
    }

    #[test]
    fn test_is_safe_file_name() {
        assert!(is_safe_file_name("20261017093015_1a2b3c4d_apply_label.py"));
        assert!(!is_safe_file_name("../secrets.json"));
        assert!(!is_safe_file_name("a/b.py"));
        assert!(!is_safe_file_name(r"a\b.py"));
        assert!(!is_safe_file_name(".hidden"));
        assert!(!is_safe_file_name(""));
    }

    #[tokio::test]
    async fn test_download_script_and_reject_other_areas() {
        let root = std::env::temp_dir().join(format!("label_forge_files_{}", std::process::id()));
        let dirs = WorkDirs::under(&root);
        dirs.ensure().unwrap();
        std::fs::write(dirs.scripts.join("job_apply_label.py"), "import bpy\n").unwrap();
        std::fs::write(dirs.models.join("job_box.obj"), "v 0 0 0\n").unwrap();

        let state: SharedState = Arc::new(AppState {
            config: AppConfig::default(),
            pipeline: Pipeline::new(dirs, Arc::new(Unused), Arc::new(AcceptAll), None),
        });

        let response = handle_download("/api/files/scripts/job_apply_label.py", state.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .starts_with("attachment"));
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"import bpy\n");

        let response = handle_download("/api/files/models/job_box.obj", state.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle_download("/api/files/scripts/..%2F..%2Fsecrets.json", state.clone())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = handle_download("/api/files/output/missing.png", state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(&root).ok();
    }
}
