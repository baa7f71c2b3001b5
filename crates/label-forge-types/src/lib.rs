//! Shared types for the label forge pipeline and its web layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An uploaded file as received from the client, before it touches disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedAsset {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedAsset {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Upload as it travels over the wire: file name plus base64 payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadPayload {
    pub name: String,
    pub data: String,
}

#[derive(Debug, Error, PartialEq)]
#[error("{field} must be a positive number of millimeters (got {value})")]
pub struct DimensionError {
    pub field: &'static str,
    pub value: f64,
}

fn positive(field: &'static str, value: f64) -> Result<f64, DimensionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DimensionError { field, value })
    }
}

/// Physical sizes for the apply-label flow, all in millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LabelRequest {
    width_mm: f64,
    height_mm: f64,
    model_height_mm: f64,
}

impl LabelRequest {
    pub fn new(width_mm: f64, height_mm: f64, model_height_mm: f64) -> Result<Self, DimensionError> {
        Ok(Self {
            width_mm: positive("width_mm", width_mm)?,
            height_mm: positive("height_mm", height_mm)?,
            model_height_mm: positive("model_height_mm", model_height_mm)?,
        })
    }

    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    pub fn model_height_mm(&self) -> f64 {
        self.model_height_mm
    }
}

/// Target bounding box for the rescale flow, in millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RescaleRequest {
    width_mm: f64,
    depth_mm: f64,
    height_mm: f64,
}

impl RescaleRequest {
    pub fn new(width_mm: f64, depth_mm: f64, height_mm: f64) -> Result<Self, DimensionError> {
        Ok(Self {
            width_mm: positive("width_mm", width_mm)?,
            depth_mm: positive("depth_mm", depth_mm)?,
            height_mm: positive("height_mm", height_mm)?,
        })
    }

    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    pub fn depth_mm(&self) -> f64 {
        self.depth_mm
    }

    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }
}

/// Which script the pipeline asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    ApplyLabel,
    Rescale,
}

impl ScriptKind {
    /// File name suffix of the materialized script.
    pub fn script_file_name(self) -> &'static str {
        match self {
            ScriptKind::ApplyLabel => "apply_label.py",
            ScriptKind::Rescale => "scale_model.py",
        }
    }

    /// Artifacts the external tool is asked to produce.
    pub fn expected_artifacts(self) -> &'static [ArtifactKind] {
        match self {
            ScriptKind::ApplyLabel => &[ArtifactKind::Render, ArtifactKind::LabeledModel],
            ScriptKind::Rescale => &[ArtifactKind::ScaledModel],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Render,
    LabeledModel,
    ScaledModel,
}

impl ArtifactKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Render => "render.png",
            ArtifactKind::LabeledModel => "labeled_model.glb",
            ArtifactKind::ScaledModel => "scaled_model.blend",
        }
    }
}

/// An output file the external tool was asked to write.
#[derive(Clone, Debug, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub present: bool,
}

/// Text returned by the completion endpoint. Never parsed locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedScript(pub String);

impl GeneratedScript {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of one external tool invocation.
#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_request_accepts_positive_values() {
        let req = LabelRequest::new(41.0, 82.0, 120.0).unwrap();
        assert_eq!(req.width_mm(), 41.0);
        assert_eq!(req.height_mm(), 82.0);
        assert_eq!(req.model_height_mm(), 120.0);
    }

    #[test]
    fn test_label_request_rejects_zero_and_negative() {
        let err = LabelRequest::new(0.0, 82.0, 120.0).unwrap_err();
        assert_eq!(err.field, "width_mm");
        let err = LabelRequest::new(41.0, 82.0, -1.0).unwrap_err();
        assert_eq!(err.field, "model_height_mm");
    }

    #[test]
    fn test_rescale_request_rejects_nan() {
        let err = RescaleRequest::new(10.0, f64::NAN, 10.0).unwrap_err();
        assert_eq!(err.field, "depth_mm");
    }

    #[test]
    fn test_expected_artifacts_per_kind() {
        assert_eq!(
            ScriptKind::ApplyLabel.expected_artifacts(),
            &[ArtifactKind::Render, ArtifactKind::LabeledModel]
        );
        assert_eq!(ScriptKind::Rescale.expected_artifacts(), &[ArtifactKind::ScaledModel]);
    }

    #[test]
    fn test_script_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ScriptKind::ApplyLabel).unwrap();
        assert_eq!(json, r#""apply_label""#);
    }
}
