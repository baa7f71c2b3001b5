//! Script generation endpoints.
//!
//! POST /api/label    { model, label, width_mm, height_mm, model_height_mm, run }
//! POST /api/rescale  { model, width_mm, depth_mm, height_mm, run }
//!
//! Uploads are `{ name, data }` with base64 `data`. The job itself blocks
//! (completion call, optional tool run) so it runs on the blocking pool.
use std::convert::Infallible;

use hyper::{Body, Request, Response, StatusCode};
use label_forge_types::{LabelRequest, RescaleRequest, UploadPayload};
use serde::Deserialize;
use tokio::task::{spawn_blocking, JoinError};

use crate::web::{
    error::{PipelineError, PipelineResult},
    pipeline::{JobOutcome, MISSING_LABEL_UPLOADS, MISSING_MODEL_UPLOAD},
    request_parsing::{decode_optional, is_present, parse_json_body},
    response_helpers::{json_error, json_response},
    state::SharedState,
};
use crate::{sys_error, sys_warn};

#[derive(Deserialize)]
pub struct LabelForm {
    model: Option<UploadPayload>,
    label: Option<UploadPayload>,
    width_mm: f64,
    height_mm: f64,
    model_height_mm: f64,
    #[serde(default)]
    run: bool,
}

#[derive(Deserialize)]
pub struct RescaleForm {
    model: Option<UploadPayload>,
    width_mm: f64,
    depth_mm: f64,
    height_mm: f64,
    #[serde(default)]
    run: bool,
}

// Upload presence is checked before any decoding or dimension validation
fn missing(message: &'static str) -> Response<Body> {
    let e = PipelineError::MissingUpload(message);
    sys_warn!("[GENERATE] Rejected request: {}", e);
    json_error(e.status(), &e.user_message())
}

fn respond(joined: Result<PipelineResult<JobOutcome>, JoinError>) -> Response<Body> {
    match joined {
        Ok(Ok(outcome)) => json_response(StatusCode::OK, &outcome),
        Ok(Err(e)) => {
            let status = e.status();
            if status == StatusCode::BAD_REQUEST {
                sys_warn!("[GENERATE] Rejected request: {}", e);
            } else {
                sys_error!("[GENERATE] Job failed: {}", e);
            }
            json_error(status, &e.user_message())
        }
        Err(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Error: task failed: {e}"),
        ),
    }
}

pub async fn handle_label(req: Request<Body>, state: SharedState) -> Result<Response<Body>, Infallible> {
    let form: LabelForm = match parse_json_body(req.into_body()).await {
        Ok(form) => form,
        Err(error_response) => return Ok(error_response),
    };

    if !is_present(&form.model) || !is_present(&form.label) {
        return Ok(missing(MISSING_LABEL_UPLOADS));
    }

    let pipeline = state.pipeline.clone();
    let joined = spawn_blocking(move || -> PipelineResult<JobOutcome> {
        let model = decode_optional(form.model)?;
        let label = decode_optional(form.label)?;
        let request = LabelRequest::new(form.width_mm, form.height_mm, form.model_height_mm)?;
        pipeline.apply_label(model, label, request, form.run)
    })
    .await;

    Ok(respond(joined))
}

pub async fn handle_rescale(req: Request<Body>, state: SharedState) -> Result<Response<Body>, Infallible> {
    let form: RescaleForm = match parse_json_body(req.into_body()).await {
        Ok(form) => form,
        Err(error_response) => return Ok(error_response),
    };

    if !is_present(&form.model) {
        return Ok(missing(MISSING_MODEL_UPLOAD));
    }

    let pipeline = state.pipeline.clone();
    let joined = spawn_blocking(move || -> PipelineResult<JobOutcome> {
        let model = decode_optional(form.model)?;
        let request = RescaleRequest::new(form.width_mm, form.depth_mm, form.height_mm)?;
        pipeline.rescale(model, request, form.run)
    })
    .await;

    Ok(respond(joined))
}
