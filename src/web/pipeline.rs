// One generation job: stage uploads, compose the prompt, ask the completion
// service, materialize the script, optionally run the external tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use label_forge_command::ToolRunner;
use label_forge_types::{
    Artifact, ArtifactKind, LabelRequest, RescaleRequest, RunResult, ScriptKind, UploadedAsset,
};
use serde::Serialize;

use super::completion::CompletionClient;
use super::error::{PipelineError, PipelineResult};
use super::materialize::{materialize, ScriptValidator};
use super::prompt::{compose_label_prompt, compose_rescale_prompt};
use super::staging::{new_job_token, stage_asset, WorkDirs};
use crate::{sys_info, sys_warn};

pub const MISSING_LABEL_UPLOADS: &str = "Please upload both a 3D model and a label image.";
pub const MISSING_MODEL_UPLOAD: &str = "Please upload a 3D model.";
pub const NO_TOOL_NOTICE: &str =
    "No 3D tool is configured on this server. Please run the script locally.";

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub result: RunResult,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub kind: ScriptKind,
    /// File name under `scripts/`.
    pub script_file: String,
    pub script: String,
    pub run: Option<RunReport>,
    pub notice: Option<String>,
}

#[derive(Clone)]
pub struct Pipeline {
    dirs: WorkDirs,
    client: Arc<dyn CompletionClient>,
    validator: Arc<dyn ScriptValidator>,
    runner: Option<ToolRunner>,
}

impl Pipeline {
    pub fn new(
        dirs: WorkDirs,
        client: Arc<dyn CompletionClient>,
        validator: Arc<dyn ScriptValidator>,
        runner: Option<ToolRunner>,
    ) -> Self {
        Self {
            dirs,
            client,
            validator,
            runner,
        }
    }

    pub fn dirs(&self) -> &WorkDirs {
        &self.dirs
    }

    fn artifact_path(&self, token: &str, file_name: &str) -> PathBuf {
        self.dirs.output.join(format!("{token}_{file_name}"))
    }

    pub fn apply_label(
        &self,
        model: Option<UploadedAsset>,
        label: Option<UploadedAsset>,
        request: LabelRequest,
        run: bool,
    ) -> PipelineResult<JobOutcome> {
        let (model, label) = match (model, label) {
            (Some(m), Some(l)) => (m, l),
            _ => return Err(PipelineError::MissingUpload(MISSING_LABEL_UPLOADS)),
        };

        self.dirs.ensure()?;
        let token = new_job_token();
        let model_path = stage_asset(&self.dirs.models, &token, &model)?;
        let label_path = stage_asset(&self.dirs.labels, &token, &label)?;

        let prompt = compose_label_prompt(
            &model_path,
            &label_path,
            &request,
            &self.artifact_path(&token, ArtifactKind::Render.file_name()),
            &self.artifact_path(&token, ArtifactKind::LabeledModel.file_name()),
        )?;

        self.finish(ScriptKind::ApplyLabel, token, &prompt, run)
    }

    pub fn rescale(
        &self,
        model: Option<UploadedAsset>,
        request: RescaleRequest,
        run: bool,
    ) -> PipelineResult<JobOutcome> {
        let model = model.ok_or(PipelineError::MissingUpload(MISSING_MODEL_UPLOAD))?;

        self.dirs.ensure()?;
        let token = new_job_token();
        let model_path = stage_asset(&self.dirs.models, &token, &model)?;

        let prompt = compose_rescale_prompt(
            &model_path,
            &request,
            &self.artifact_path(&token, ArtifactKind::ScaledModel.file_name()),
        )?;

        self.finish(ScriptKind::Rescale, token, &prompt, run)
    }

    fn finish(
        &self,
        kind: ScriptKind,
        token: String,
        prompt: &str,
        run: bool,
    ) -> PipelineResult<JobOutcome> {
        sys_info!("[{}] Requesting {:?} script", token, kind);
        let script = self.client.complete(prompt)?;
        self.validator.validate(&script)?;

        let script_file = format!("{token}_{}", kind.script_file_name());
        let script_path = self.dirs.scripts.join(&script_file);
        materialize(&script, &script_path)?;
        sys_info!("[{}] Script written to {}", token, script_path.display());

        let (run_report, notice) = if !run {
            (None, None)
        } else if let Some(runner) = &self.runner {
            (Some(self.run_tool(runner, kind, &token, &script_path)?), None)
        } else {
            (None, Some(NO_TOOL_NOTICE.to_string()))
        };

        Ok(JobOutcome {
            job_id: token,
            kind,
            script_file,
            script: script.0,
            run: run_report,
            notice,
        })
    }

    fn run_tool(
        &self,
        runner: &ToolRunner,
        kind: ScriptKind,
        token: &str,
        script_path: &Path,
    ) -> PipelineResult<RunReport> {
        let result = runner.run(script_path)?;

        let artifacts: Vec<Artifact> = kind
            .expected_artifacts()
            .iter()
            .map(|&artifact| {
                let file_name = format!("{token}_{}", artifact.file_name());
                let present = self.dirs.output.join(&file_name).is_file();
                Artifact {
                    kind: artifact,
                    file_name,
                    present,
                }
            })
            .collect();

        for missing in artifacts.iter().filter(|a| !a.present) {
            sys_warn!("[{}] Expected artifact {} was not produced", token, missing.file_name);
        }

        Ok(RunReport { result, artifacts })
    }
}
